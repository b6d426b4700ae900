use super::IGameRepo;
use crate::repos::{
    participant::{IParticipantRepo, InMemoryParticipantRepo},
    schedule_record::IScheduleRecordRepo,
    shared::inmemory_repo::*,
};
use game_notifier_domain::{Game, GameWithParticipants, ID};
use std::sync::{Arc, Mutex};

pub struct InMemoryGameRepo {
    games: Mutex<Vec<Game>>,
    participants: Arc<InMemoryParticipantRepo>,
    schedule_records: Arc<dyn IScheduleRecordRepo>,
}

impl InMemoryGameRepo {
    pub fn new(
        participants: Arc<InMemoryParticipantRepo>,
        schedule_records: Arc<dyn IScheduleRecordRepo>,
    ) -> Self {
        Self {
            games: Mutex::new(Vec::new()),
            participants,
            schedule_records,
        }
    }
}

#[async_trait::async_trait]
impl IGameRepo for InMemoryGameRepo {
    async fn insert(&self, game: &Game) -> anyhow::Result<()> {
        insert(game, &self.games);
        Ok(())
    }

    async fn save(&self, game: &Game) -> anyhow::Result<()> {
        if !save(game, &self.games) {
            anyhow::bail!("Game: {} not found", game.id);
        }
        Ok(())
    }

    async fn find(&self, game_id: &ID) -> anyhow::Result<Option<Game>> {
        Ok(find(game_id, &self.games))
    }

    async fn find_with_participants(
        &self,
        game_id: &ID,
    ) -> anyhow::Result<Option<GameWithParticipants>> {
        let game = match find(game_id, &self.games) {
            Some(game) => game,
            None => return Ok(None),
        };
        let participants = self.participants.find_by_game(game_id).await?;
        Ok(Some(GameWithParticipants { game, participants }))
    }

    async fn delete(&self, game_id: &ID) -> anyhow::Result<Option<Game>> {
        let deleted = delete(game_id, &self.games);
        if deleted.is_some() {
            self.participants.delete_by_game(game_id);
            self.schedule_records.delete_by_game(game_id).await?;
        }
        Ok(deleted)
    }
}
