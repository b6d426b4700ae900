mod inmemory;
mod postgres;

use game_notifier_domain::{Game, GameWithParticipants, ID};
pub use inmemory::InMemoryGameRepo;
pub use postgres::PostgresGameRepo;

#[async_trait::async_trait]
pub trait IGameRepo: Send + Sync {
    async fn insert(&self, game: &Game) -> anyhow::Result<()>;
    async fn save(&self, game: &Game) -> anyhow::Result<()>;
    async fn find(&self, game_id: &ID) -> anyhow::Result<Option<Game>>;
    /// The `Game` with its full current roster, placeholders included
    async fn find_with_participants(
        &self,
        game_id: &ID,
    ) -> anyhow::Result<Option<GameWithParticipants>>;
    /// Removing a `Game` also removes its `Participant`s and every pending
    /// `ScheduleRecord` of it
    async fn delete(&self, game_id: &ID) -> anyhow::Result<Option<Game>>;
}

#[cfg(test)]
mod tests {
    use crate::NotifyContext;
    use game_notifier_domain::{
        Game, GameReminder, Participant, ParticipantCategory, ScheduleRecord,
    };

    #[tokio::test]
    async fn delete_cascades_to_roster_and_schedule_records() {
        let ctx = NotifyContext::create_inmemory();
        let game = Game::new("Raid night", 1000 * 60 * 60);
        ctx.repos.games.insert(&game).await.unwrap();
        let participant =
            Participant::user(game.id, "user-1", ParticipantCategory::SelfAdded, 0, 0);
        ctx.repos.participants.insert(&participant).await.unwrap();
        ctx.repos
            .schedule_records
            .insert(&ScheduleRecord::reminder(&game, &GameReminder { minutes_before: 10 }))
            .await
            .unwrap();
        ctx.repos
            .schedule_records
            .insert(&ScheduleRecord::join_notification(&game, &participant, 1000))
            .await
            .unwrap();

        let found = ctx
            .repos
            .games
            .find_with_participants(&game.id)
            .await
            .unwrap()
            .expect("Game to exist");
        assert_eq!(found.participants, vec![participant.clone()]);

        assert!(ctx.repos.games.delete(&game.id).await.unwrap().is_some());
        assert!(ctx.repos.games.find(&game.id).await.unwrap().is_none());
        assert!(ctx.repos.participants.find(&participant.id).await.unwrap().is_none());
        assert!(ctx
            .repos
            .schedule_records
            .find_by_game(&game.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn deleting_participant_removes_its_join_notification() {
        let ctx = NotifyContext::create_inmemory();
        let game = Game::new("Raid night", 1000 * 60 * 60);
        ctx.repos.games.insert(&game).await.unwrap();
        let participant =
            Participant::user(game.id, "user-1", ParticipantCategory::SelfAdded, 0, 0);
        ctx.repos.participants.insert(&participant).await.unwrap();
        let record = ScheduleRecord::join_notification(&game, &participant, 1000);
        ctx.repos.schedule_records.insert(&record).await.unwrap();

        ctx.repos.participants.delete(&participant.id).await.unwrap();
        assert!(ctx
            .repos
            .schedule_records
            .find(&record.id)
            .await
            .unwrap()
            .is_none());
    }
}
