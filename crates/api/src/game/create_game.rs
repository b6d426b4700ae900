use super::sync_game_reminders::SyncGameRemindersUseCase;
use crate::shared::usecase::{execute, UseCase};
use game_notifier_domain::{Game, GameReminder};
use game_notifier_infra::NotifyContext;

#[derive(Debug)]
pub struct CreateGameUseCase {
    pub title: String,
    pub start_ts: i64,
    pub max_participants: Option<i64>,
    pub instructions: Option<String>,
    pub reminders: Vec<GameReminder>,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidCapacity(i64),
    InvalidReminder(i64),
    StorageError,
}

pub(crate) fn validate_capacity(max_participants: Option<i64>) -> Result<(), i64> {
    match max_participants {
        Some(capacity) if capacity < 0 => Err(capacity),
        _ => Ok(()),
    }
}

/// A reminder must fire before the game starts, so its lead time has to be positive.
pub(crate) fn validate_reminders(reminders: &[GameReminder]) -> Result<(), i64> {
    match reminders.iter().find(|r| r.minutes_before <= 0) {
        Some(r) => Err(r.minutes_before),
        None => Ok(()),
    }
}

#[async_trait::async_trait]
impl UseCase for CreateGameUseCase {
    type Response = Game;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateGame";

    async fn execute(&mut self, ctx: &NotifyContext) -> Result<Self::Response, Self::Error> {
        validate_capacity(self.max_participants).map_err(UseCaseError::InvalidCapacity)?;
        validate_reminders(&self.reminders).map_err(UseCaseError::InvalidReminder)?;

        let mut game = Game::new(self.title.clone(), self.start_ts);
        game.max_participants = self.max_participants;
        game.instructions = self.instructions.clone();
        game.reminders = self.reminders.clone();

        ctx.repos
            .games
            .insert(&game)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let sync_reminders = SyncGameRemindersUseCase { game: game.clone() };
        // Sideeffect, ignore result
        let _ = execute(sync_reminders, ctx).await;

        Ok(game)
    }
}
