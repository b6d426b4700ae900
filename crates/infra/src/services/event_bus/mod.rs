mod inmemory;
mod postgres;

pub use inmemory::InMemoryEventBus;
pub use postgres::PostgresEventBus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Unable to publish to topic: {0}. Error message: `{1}`")]
    Publish(String, String),
    #[error("Event bus storage failed: `{0}`")]
    Storage(String),
    #[error("Unknown delivery: {0}")]
    UnknownDelivery(u64),
    #[error("The event bus is closed")]
    Closed,
}

/// A message handed to a consumer. It stays in flight until it is acked or
/// nacked.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub delivery_tag: u64,
    pub topic: String,
    pub payload: Vec<u8>,
    /// Starts at 1 and increases every time the message is redelivered
    pub attempt: u32,
}

/// Topic routed broker with at-least-once delivery and per message
/// expiration.
///
/// It only fans out events that are already due, deciding *when* to fire is
/// the job of the scheduler.
#[async_trait::async_trait]
pub trait IEventBus: Send + Sync {
    /// Messages not consumed within `ttl_millis` are dropped. `None` means
    /// the message never expires.
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        ttl_millis: Option<i64>,
    ) -> Result<(), EventBusError>;
    /// Waits for the next message on `topic`
    async fn consume(&self, topic: &str) -> Result<Delivery, EventBusError>;
    async fn ack(&self, delivery: &Delivery) -> Result<(), EventBusError>;
    /// Puts the message back on its topic for redelivery
    async fn nack(&self, delivery: &Delivery) -> Result<(), EventBusError>;
}
