use super::{IWakeChannel, WakeReason, SCHEDULE_RECORDS_CHANNEL};
use sqlx::{postgres::PgListener, PgPool};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Wake channel on top of Postgres LISTEN / NOTIFY.
///
/// A trigger on `schedule_records` notifies on every insert and every
/// change of a due time, so writers do not have to signal explicitly.
/// The listener connection is only opened while waiting and never holds
/// a transaction.
pub struct PostgresWakeChannel {
    pool: PgPool,
    listener: Mutex<Option<PgListener>>,
}

impl PostgresWakeChannel {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            listener: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<PgListener, sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(SCHEDULE_RECORDS_CHANNEL).await?;
        Ok(listener)
    }
}

#[async_trait::async_trait]
impl IWakeChannel for PostgresWakeChannel {
    async fn signal(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT pg_notify($1, '')")
            .bind(SCHEDULE_RECORDS_CHANNEL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn wait(&self, max_wait: Duration) -> WakeReason {
        let mut guard = self.listener.lock().await;
        if guard.is_none() {
            match self.connect().await {
                Ok(listener) => *guard = Some(listener),
                Err(e) => {
                    warn!(
                        "Unable to listen for schedule record changes, falling back to polling. Err: {:?}",
                        e
                    );
                    tokio::time::sleep(max_wait).await;
                    return WakeReason::TimedOut;
                }
            }
        }

        let listener = match guard.as_mut() {
            Some(listener) => listener,
            None => return WakeReason::TimedOut,
        };

        match tokio::time::timeout(max_wait, listener.recv()).await {
            Ok(Ok(notification)) => {
                debug!("Schedule records changed for game: {}", notification.payload());
                WakeReason::Signalled
            }
            Ok(Err(e)) => {
                warn!("Lost schedule record listener, reconnecting on next wait. Err: {:?}", e);
                *guard = None;
                WakeReason::TimedOut
            }
            Err(_) => WakeReason::TimedOut,
        }
    }
}
