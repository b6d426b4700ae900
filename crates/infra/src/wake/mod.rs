mod inmemory;
mod postgres;

pub use inmemory::InMemoryWakeChannel;
pub use postgres::PostgresWakeChannel;
use std::time::Duration;

/// Postgres channel the `schedule_records` trigger notifies on
pub const SCHEDULE_RECORDS_CHANNEL: &str = "schedule_records_changed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Somebody changed a `ScheduleRecord`
    Signalled,
    /// Nothing happened within the maximum wait
    TimedOut,
}

/// Low latency signal telling the scheduler to look for due
/// `ScheduleRecord`s right away instead of at its next timeout.
///
/// Signals are an optimization only. A lost signal delays a notification
/// by at most the maximum wait of the scheduler.
#[async_trait::async_trait]
pub trait IWakeChannel: Send + Sync {
    async fn signal(&self) -> anyhow::Result<()>;
    /// Resolves on the first signal or after `max_wait`, whichever comes first
    async fn wait(&self, max_wait: Duration) -> WakeReason;
}
