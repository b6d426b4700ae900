mod inmemory;
mod postgres;

use game_notifier_domain::{ScheduleRecord, ID};
pub use inmemory::InMemoryScheduleRecordRepo;
pub use postgres::PostgresScheduleRecordRepo;

/// Durable store of pending notifications
#[async_trait::async_trait]
pub trait IScheduleRecordRepo: Send + Sync {
    /// Returns false when an unsent duplicate already exists, in which case
    /// nothing is stored
    async fn insert(&self, record: &ScheduleRecord) -> anyhow::Result<bool>;
    async fn find(&self, record_id: &ID) -> anyhow::Result<Option<ScheduleRecord>>;
    async fn find_by_game(&self, game_id: &ID) -> anyhow::Result<Vec<ScheduleRecord>>;
    /// All records that are not yet sent and have a due time at or before `now`
    async fn select_due_unsent(&self, now: i64) -> anyhow::Result<Vec<ScheduleRecord>>;
    /// Atomically marks the record as sent. Only one caller will ever get
    /// `true` for a given record, the others lost the race.
    async fn try_claim(&self, record_id: &ID) -> anyhow::Result<bool>;
    /// Moves the unsent records of a `Game` to a new deadline. `Reminder`s
    /// keep their lead time and get a new due time.
    async fn reschedule_game(&self, game_id: &ID, deadline_ts: i64) -> anyhow::Result<u64>;
    /// Removes unsent `Reminder`s of a `Game` whose lead time is not in
    /// `keep_lead_millis`
    async fn delete_unsent_reminders_except(
        &self,
        game_id: &ID,
        keep_lead_millis: &[i64],
    ) -> anyhow::Result<u64>;
    async fn delete_by_game(&self, game_id: &ID) -> anyhow::Result<u64>;
    async fn delete_by_participant(&self, participant_id: &ID) -> anyhow::Result<u64>;
}
