use super::{Delivery, EventBusError, IEventBus};
use crate::ISys;
use sqlx::{FromRow, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

/// How often an idle consumer looks for messages published by other
/// processes or released by an expired lease.
const POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Broker on top of the `event_bus_messages` table.
///
/// A consumed message is leased, not removed. It is deleted on ack, released
/// on nack and becomes deliverable again once the lease runs out, so a
/// process crashing between consume and ack does not lose it.
pub struct PostgresEventBus {
    pool: PgPool,
    sys: Arc<dyn ISys>,
    lease_millis: i64,
    published: Notify,
}

#[derive(Debug, FromRow)]
struct DeliveryRaw {
    message_id: i64,
    topic: String,
    payload: Vec<u8>,
    attempt: i32,
}

impl From<DeliveryRaw> for Delivery {
    fn from(raw: DeliveryRaw) -> Self {
        Self {
            delivery_tag: raw.message_id as u64,
            topic: raw.topic,
            payload: raw.payload,
            attempt: raw.attempt.max(1) as u32,
        }
    }
}

fn storage_error(e: sqlx::Error) -> EventBusError {
    error!("Event bus storage error: {:?}", e);
    EventBusError::Storage(e.to_string())
}

impl PostgresEventBus {
    pub fn new(pool: PgPool, sys: Arc<dyn ISys>, lease_millis: i64) -> Self {
        Self {
            pool,
            sys,
            lease_millis,
            published: Notify::new(),
        }
    }

    async fn drop_expired(&self, topic: &str, now: i64) -> Result<(), EventBusError> {
        let dropped = sqlx::query(
            r#"
            DELETE FROM event_bus_messages AS m
            WHERE m.topic = $1 AND m.expires_at IS NOT NULL AND m.expires_at <= $2
            "#,
        )
        .bind(topic)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?
        .rows_affected();

        if dropped > 0 {
            warn!(
                "Dropped {} expired message(s) on topic: {} before they were consumed",
                dropped, topic
            );
        }
        Ok(())
    }

    /// Leases the oldest available message on `topic`. Concurrent consumers
    /// skip rows another transaction is about to lease.
    async fn try_lease(&self, topic: &str) -> Result<Option<Delivery>, EventBusError> {
        let now = self.sys.get_timestamp_millis();
        self.drop_expired(topic, now).await?;

        let raw: Option<DeliveryRaw> = sqlx::query_as(
            r#"
            UPDATE event_bus_messages AS m
            SET locked_until = $3,
                attempt = CASE WHEN m.locked_until IS NULL THEN m.attempt ELSE m.attempt + 1 END
            WHERE m.message_id = (
                SELECT c.message_id FROM event_bus_messages AS c
                WHERE c.topic = $1
                    AND (c.locked_until IS NULL OR c.locked_until <= $2)
                    AND (c.expires_at IS NULL OR c.expires_at > $2)
                ORDER BY c.message_id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING m.message_id, m.topic, m.payload, m.attempt
            "#,
        )
        .bind(topic)
        .bind(now)
        .bind(now + self.lease_millis)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(raw.map(Delivery::from))
    }
}

#[async_trait::async_trait]
impl IEventBus for PostgresEventBus {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        ttl_millis: Option<i64>,
    ) -> Result<(), EventBusError> {
        let expires_at = ttl_millis.map(|ttl| self.sys.get_timestamp_millis() + ttl);
        sqlx::query(
            r#"
            INSERT INTO event_bus_messages(topic, payload, expires_at)
            VALUES($1, $2, $3)
            "#,
        )
        .bind(topic)
        .bind(payload)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| EventBusError::Publish(topic.to_string(), e.to_string()))?;

        self.published.notify_waiters();
        Ok(())
    }

    async fn consume(&self, topic: &str) -> Result<Delivery, EventBusError> {
        loop {
            // Registered before looking so a publish in between is not missed
            let published = self.published.notified();
            if let Some(delivery) = self.try_lease(topic).await? {
                debug!(
                    "Leased message: {} on topic: {}, attempt: {}",
                    delivery.delivery_tag, topic, delivery.attempt
                );
                return Ok(delivery);
            }
            let _ = tokio::time::timeout(POLL_INTERVAL, published).await;
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), EventBusError> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM event_bus_messages AS m
            WHERE m.message_id = $1
            "#,
        )
        .bind(delivery.delivery_tag as i64)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?
        .rows_affected();

        if deleted == 0 {
            return Err(EventBusError::UnknownDelivery(delivery.delivery_tag));
        }
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery) -> Result<(), EventBusError> {
        let released = sqlx::query(
            r#"
            UPDATE event_bus_messages AS m
            SET locked_until = NULL, attempt = m.attempt + 1
            WHERE m.message_id = $1 AND m.locked_until IS NOT NULL
            "#,
        )
        .bind(delivery.delivery_tag as i64)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?
        .rows_affected();

        if released == 0 {
            return Err(EventBusError::UnknownDelivery(delivery.delivery_tag));
        }
        self.published.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pool;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct ManualSys(AtomicI64);
    impl ISys for ManualSys {
        fn get_timestamp_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Every test gets its own topic so tests sharing the database do not
    /// consume each other's messages
    async fn setup() -> Option<(Arc<ManualSys>, PostgresEventBus, String)> {
        let pool = test_pool().await?;
        let sys = Arc::new(ManualSys(AtomicI64::new(1_000_000)));
        let bus = PostgresEventBus::new(pool, sys.clone(), 10_000);
        Some((sys, bus, format!("test.{}", game_notifier_domain::ID::new())))
    }

    #[tokio::test]
    async fn delivers_in_order_and_deletes_on_ack() {
        let Some((_, bus, topic)) = setup().await else {
            return;
        };
        bus.publish(&topic, b"1".to_vec(), None).await.unwrap();
        bus.publish(&topic, b"2".to_vec(), None).await.unwrap();

        let first = bus.consume(&topic).await.unwrap();
        let second = bus.consume(&topic).await.unwrap();
        assert_eq!(first.payload, b"1");
        assert_eq!(second.payload, b"2");
        assert_eq!(first.attempt, 1);

        bus.ack(&first).await.unwrap();
        bus.ack(&second).await.unwrap();
        assert!(matches!(
            bus.ack(&first).await,
            Err(EventBusError::UnknownDelivery(_))
        ));
    }

    #[tokio::test]
    async fn nacked_messages_are_redelivered_first() {
        let Some((_, bus, topic)) = setup().await else {
            return;
        };
        bus.publish(&topic, b"1".to_vec(), None).await.unwrap();
        bus.publish(&topic, b"2".to_vec(), None).await.unwrap();

        let delivery = bus.consume(&topic).await.unwrap();
        bus.nack(&delivery).await.unwrap();

        let redelivery = bus.consume(&topic).await.unwrap();
        assert_eq!(redelivery.payload, b"1");
        assert_eq!(redelivery.attempt, 2);
        bus.ack(&redelivery).await.unwrap();
    }

    #[tokio::test]
    async fn expired_lease_makes_message_deliverable_again() {
        let Some((sys, bus, topic)) = setup().await else {
            return;
        };
        bus.publish(&topic, b"1".to_vec(), None).await.unwrap();

        // Consumer crashes without ack or nack
        let lost = bus.consume(&topic).await.unwrap();
        assert!(bus.try_lease(&topic).await.unwrap().is_none());

        sys.0.fetch_add(10_000, Ordering::SeqCst);
        let redelivery = bus.consume(&topic).await.unwrap();
        assert_eq!(redelivery.delivery_tag, lost.delivery_tag);
        assert_eq!(redelivery.attempt, 2);
        bus.ack(&redelivery).await.unwrap();
    }

    #[tokio::test]
    async fn messages_survive_a_new_bus_instance() {
        let Some((sys, bus, topic)) = setup().await else {
            return;
        };
        bus.publish(&topic, b"durable".to_vec(), Some(60_000))
            .await
            .unwrap();
        drop(bus);

        let pool = test_pool().await.unwrap();
        let restarted = PostgresEventBus::new(pool, sys, 10_000);
        let delivery = restarted.consume(&topic).await.unwrap();
        assert_eq!(delivery.payload, b"durable");
        restarted.ack(&delivery).await.unwrap();
    }

    #[tokio::test]
    async fn expired_messages_are_dropped() {
        let Some((sys, bus, topic)) = setup().await else {
            return;
        };
        bus.publish(&topic, b"stale".to_vec(), Some(1000)).await.unwrap();
        bus.publish(&topic, b"fresh".to_vec(), Some(5000)).await.unwrap();
        sys.0.fetch_add(1000, Ordering::SeqCst);

        let delivery = bus.consume(&topic).await.unwrap();
        assert_eq!(delivery.payload, b"fresh");
        bus.ack(&delivery).await.unwrap();
        assert!(bus.try_lease(&topic).await.unwrap().is_none());
    }
}
