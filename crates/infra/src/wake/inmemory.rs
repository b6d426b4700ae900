use super::{IWakeChannel, WakeReason};
use std::time::Duration;
use tokio::sync::Notify;

pub struct InMemoryWakeChannel {
    notify: Notify,
}

impl InMemoryWakeChannel {
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
        }
    }
}

impl Default for InMemoryWakeChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IWakeChannel for InMemoryWakeChannel {
    async fn signal(&self) -> anyhow::Result<()> {
        // Stores a permit if nobody is waiting right now
        self.notify.notify_one();
        Ok(())
    }

    async fn wait(&self, max_wait: Duration) -> WakeReason {
        match tokio::time::timeout(max_wait, self.notify.notified()).await {
            Ok(_) => WakeReason::Signalled,
            Err(_) => WakeReason::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn times_out_without_signal() {
        let channel = InMemoryWakeChannel::new();
        let reason = channel.wait(Duration::from_millis(10)).await;
        assert_eq!(reason, WakeReason::TimedOut);
    }

    #[tokio::test]
    async fn signal_before_wait_is_not_lost() {
        let channel = InMemoryWakeChannel::new();
        channel.signal().await.unwrap();
        let reason = channel.wait(Duration::from_secs(5)).await;
        assert_eq!(reason, WakeReason::Signalled);
    }

    #[tokio::test]
    async fn signal_wakes_waiter() {
        let channel = Arc::new(InMemoryWakeChannel::new());
        let waiter = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.wait(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        channel.signal().await.unwrap();
        assert_eq!(waiter.await.unwrap(), WakeReason::Signalled);
    }
}
