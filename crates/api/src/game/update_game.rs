use super::{
    create_game::{validate_capacity, validate_reminders},
    sync_game_reminders::SyncGameRemindersUseCase,
};
use crate::{
    notification::notify_promotions::NotifyPromotionsUseCase,
    shared::usecase::{execute, UseCase},
};
use game_notifier_domain::{Game, GameReminder, ID};
use game_notifier_infra::NotifyContext;

/// Fields left as `None` are not changed
#[derive(Debug, Default)]
pub struct UpdateGameUseCase {
    pub game_id: ID,
    pub title: Option<String>,
    pub start_ts: Option<i64>,
    pub max_participants: Option<Option<i64>>,
    pub instructions: Option<Option<String>>,
    pub reminders: Option<Vec<GameReminder>>,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    InvalidCapacity(i64),
    InvalidReminder(i64),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for UpdateGameUseCase {
    type Response = Game;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateGame";

    async fn execute(&mut self, ctx: &NotifyContext) -> Result<Self::Response, Self::Error> {
        // Roster snapshot and promotion detection must not interleave with other roster changes
        let _guard = ctx.game_locks.lock(&self.game_id).await;

        let current = ctx
            .repos
            .games
            .find_with_participants(&self.game_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or(UseCaseError::NotFound(self.game_id))?;

        let mut game = current.game.clone();
        if let Some(title) = self.title.take() {
            game.title = title;
        }
        if let Some(start_ts) = self.start_ts {
            game.start_ts = start_ts;
        }
        if let Some(max_participants) = self.max_participants {
            validate_capacity(max_participants).map_err(UseCaseError::InvalidCapacity)?;
            game.max_participants = max_participants;
        }
        if let Some(instructions) = self.instructions.take() {
            game.instructions = instructions;
        }
        if let Some(reminders) = self.reminders.take() {
            validate_reminders(&reminders).map_err(UseCaseError::InvalidReminder)?;
            game.reminders = reminders;
        }

        ctx.repos
            .games
            .save(&game)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        if game.start_ts != current.game.start_ts || game.reminders != current.game.reminders {
            let sync_reminders = SyncGameRemindersUseCase { game: game.clone() };
            // Sideeffect, ignore result
            let _ = execute(sync_reminders, ctx).await;
        }

        if game.max_participants != current.game.max_participants {
            let notify_promotions = NotifyPromotionsUseCase {
                game: game.clone(),
                capacity_before: current.game.max_participants,
                roster_after: current.participants.clone(),
                roster_before: current.participants,
            };
            let _ = execute(notify_promotions, ctx).await;
        }

        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_notifier_domain::{NotificationKind, Participant, ParticipantCategory};
    use game_notifier_infra::InMemoryMessagingClient;
    use std::sync::Arc;

    const MINUTE: i64 = 1000 * 60;

    #[tokio::test]
    async fn moving_start_time_moves_reminders() {
        let ctx = NotifyContext::create_inmemory();
        let now = ctx.sys.get_timestamp_millis();
        let mut game = Game::new("Raid night", now + 60 * MINUTE);
        game.reminders = vec![GameReminder { minutes_before: 10 }];
        ctx.repos.games.insert(&game).await.unwrap();
        SyncGameRemindersUseCase { game: game.clone() }
            .execute(&ctx)
            .await
            .unwrap();

        let mut usecase = UpdateGameUseCase {
            game_id: game.id,
            start_ts: Some(now + 120 * MINUTE),
            ..Default::default()
        };
        let updated = usecase.execute(&ctx).await.unwrap();
        assert_eq!(updated.start_ts, now + 120 * MINUTE);

        let records = ctx
            .repos
            .schedule_records
            .find_by_game(&game.id)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, NotificationKind::Reminder);
        assert_eq!(records[0].due_at, now + 110 * MINUTE);
        assert_eq!(records[0].entity_deadline_at, now + 120 * MINUTE);
    }

    #[tokio::test]
    async fn raising_capacity_notifies_promoted() {
        let mut ctx = NotifyContext::create_inmemory();
        let messaging = Arc::new(InMemoryMessagingClient::new());
        ctx.messaging = messaging.clone();
        let mut game = Game::new("Raid night", ctx.sys.get_timestamp_millis() + 60 * MINUTE);
        game.max_participants = Some(1);
        ctx.repos.games.insert(&game).await.unwrap();
        for (rank, user) in ["alice", "bob"].iter().enumerate() {
            let participant =
                Participant::user(game.id, *user, ParticipantCategory::SelfAdded, rank as i64, 0);
            ctx.repos.participants.insert(&participant).await.unwrap();
        }

        let mut usecase = UpdateGameUseCase {
            game_id: game.id,
            max_participants: Some(Some(2)),
            ..Default::default()
        };
        usecase.execute(&ctx).await.unwrap();

        assert!(messaging.sent_to("alice").is_empty());
        assert_eq!(messaging.sent_to("bob").len(), 1);
    }

    #[tokio::test]
    async fn rejects_negative_capacity() {
        let ctx = NotifyContext::create_inmemory();
        let game = Game::new("Raid night", ctx.sys.get_timestamp_millis() + 60 * MINUTE);
        ctx.repos.games.insert(&game).await.unwrap();

        let mut usecase = UpdateGameUseCase {
            game_id: game.id,
            max_participants: Some(Some(-3)),
            ..Default::default()
        };
        assert!(matches!(
            usecase.execute(&ctx).await,
            Err(UseCaseError::InvalidCapacity(-3))
        ));
    }

    #[tokio::test]
    async fn rejects_reminder_at_game_start() {
        let ctx = NotifyContext::create_inmemory();
        let mut game = Game::new("Raid night", ctx.sys.get_timestamp_millis() + 60 * MINUTE);
        game.reminders = vec![GameReminder { minutes_before: 10 }];
        ctx.repos.games.insert(&game).await.unwrap();

        let mut usecase = UpdateGameUseCase {
            game_id: game.id,
            reminders: Some(vec![GameReminder { minutes_before: 0 }]),
            ..Default::default()
        };
        assert!(matches!(
            usecase.execute(&ctx).await,
            Err(UseCaseError::InvalidReminder(0))
        ));
        let stored = ctx.repos.games.find(&game.id).await.unwrap().unwrap();
        assert_eq!(stored.reminders, game.reminders);
    }
}
