mod inmemory;
mod postgres;

use game_notifier_domain::{Participant, ID};
pub use inmemory::InMemoryParticipantRepo;
pub(crate) use postgres::find_participants_by_game;
pub use postgres::PostgresParticipantRepo;

#[async_trait::async_trait]
pub trait IParticipantRepo: Send + Sync {
    async fn insert(&self, participant: &Participant) -> anyhow::Result<()>;
    async fn find(&self, participant_id: &ID) -> anyhow::Result<Option<Participant>>;
    async fn find_by_game(&self, game_id: &ID) -> anyhow::Result<Vec<Participant>>;
    /// Removing a `Participant` also removes its pending `ScheduleRecord`s
    async fn delete(&self, participant_id: &ID) -> anyhow::Result<Option<Participant>>;
}
