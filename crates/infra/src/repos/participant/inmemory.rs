use super::IParticipantRepo;
use crate::repos::{schedule_record::IScheduleRecordRepo, shared::inmemory_repo::*};
use game_notifier_domain::{Participant, ID};
use std::sync::{Arc, Mutex};

pub struct InMemoryParticipantRepo {
    participants: Mutex<Vec<Participant>>,
    schedule_records: Arc<dyn IScheduleRecordRepo>,
}

impl InMemoryParticipantRepo {
    /// `schedule_records` is where the cascading delete of the database
    /// schema is emulated
    pub fn new(schedule_records: Arc<dyn IScheduleRecordRepo>) -> Self {
        Self {
            participants: Mutex::new(Vec::new()),
            schedule_records,
        }
    }

    pub(crate) fn delete_by_game(&self, game_id: &ID) -> Vec<Participant> {
        find_and_delete_by(&self.participants, |p| p.game_id == *game_id)
    }
}

#[async_trait::async_trait]
impl IParticipantRepo for InMemoryParticipantRepo {
    async fn insert(&self, participant: &Participant) -> anyhow::Result<()> {
        insert(participant, &self.participants);
        Ok(())
    }

    async fn find(&self, participant_id: &ID) -> anyhow::Result<Option<Participant>> {
        Ok(find(participant_id, &self.participants))
    }

    async fn find_by_game(&self, game_id: &ID) -> anyhow::Result<Vec<Participant>> {
        Ok(find_by(&self.participants, |p| p.game_id == *game_id))
    }

    async fn delete(&self, participant_id: &ID) -> anyhow::Result<Option<Participant>> {
        let deleted = delete(participant_id, &self.participants);
        if deleted.is_some() {
            self.schedule_records
                .delete_by_participant(participant_id)
                .await?;
        }
        Ok(deleted)
    }
}
