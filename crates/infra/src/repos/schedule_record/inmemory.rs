use super::IScheduleRecordRepo;
use crate::repos::shared::inmemory_repo::*;
use game_notifier_domain::{NotificationKind, ScheduleRecord, ID};
use std::sync::Mutex;

pub struct InMemoryScheduleRecordRepo {
    records: Mutex<Vec<ScheduleRecord>>,
}

impl InMemoryScheduleRecordRepo {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryScheduleRecordRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IScheduleRecordRepo for InMemoryScheduleRecordRepo {
    async fn insert(&self, record: &ScheduleRecord) -> anyhow::Result<bool> {
        // Check and insert under the same lock, like the unique index would
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| !r.sent && r.is_duplicate_of(record))
        {
            return Ok(false);
        }
        records.push(record.clone());
        Ok(true)
    }

    async fn find(&self, record_id: &ID) -> anyhow::Result<Option<ScheduleRecord>> {
        Ok(find(record_id, &self.records))
    }

    async fn find_by_game(&self, game_id: &ID) -> anyhow::Result<Vec<ScheduleRecord>> {
        Ok(find_by(&self.records, |r| r.game_id == *game_id))
    }

    async fn select_due_unsent(&self, now: i64) -> anyhow::Result<Vec<ScheduleRecord>> {
        let mut due = find_by(&self.records, |r| r.is_due(now));
        due.sort_by_key(|r| r.due_at);
        Ok(due)
    }

    async fn try_claim(&self, record_id: &ID) -> anyhow::Result<bool> {
        let claimed = update_many(
            &self.records,
            |r| r.id == *record_id && !r.sent,
            |r| r.sent = true,
        );
        Ok(claimed == 1)
    }

    async fn reschedule_game(&self, game_id: &ID, deadline_ts: i64) -> anyhow::Result<u64> {
        Ok(update_many(
            &self.records,
            |r| r.game_id == *game_id && !r.sent,
            |r| {
                r.entity_deadline_at = deadline_ts;
                if r.kind == NotificationKind::Reminder {
                    r.due_at = deadline_ts - r.lead_millis;
                }
            },
        ))
    }

    async fn delete_unsent_reminders_except(
        &self,
        game_id: &ID,
        keep_lead_millis: &[i64],
    ) -> anyhow::Result<u64> {
        let deleted = find_and_delete_by(&self.records, |r| {
            r.game_id == *game_id
                && !r.sent
                && r.kind == NotificationKind::Reminder
                && !keep_lead_millis.contains(&r.lead_millis)
        });
        Ok(deleted.len() as u64)
    }

    async fn delete_by_game(&self, game_id: &ID) -> anyhow::Result<u64> {
        let deleted = find_and_delete_by(&self.records, |r| r.game_id == *game_id);
        Ok(deleted.len() as u64)
    }

    async fn delete_by_participant(&self, participant_id: &ID) -> anyhow::Result<u64> {
        let deleted =
            find_and_delete_by(&self.records, |r| r.participant_id == Some(*participant_id));
        Ok(deleted.len() as u64)
    }
}
