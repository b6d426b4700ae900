use crate::shared::usecase::UseCase;
use game_notifier_domain::{Game, ID};
use game_notifier_infra::NotifyContext;

/// Deleting the `Game` removes its roster and every pending notification
/// with it, which is all cancelling takes
#[derive(Debug)]
pub struct CancelGameUseCase {
    pub game_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for CancelGameUseCase {
    type Response = Game;

    type Error = UseCaseError;

    const NAME: &'static str = "CancelGame";

    async fn execute(&mut self, ctx: &NotifyContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .games
            .delete(&self.game_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or(UseCaseError::NotFound(self.game_id))
    }
}
