use super::{Delivery, EventBusError, IEventBus};
use crate::ISys;
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};
use tokio::sync::Notify;
use tracing::warn;

#[derive(Debug, Clone)]
struct QueuedMessage {
    payload: Vec<u8>,
    expires_at: Option<i64>,
    attempt: u32,
}

/// In process broker. Messages are kept per topic in publish order and a
/// nacked message goes back to the front of its topic.
pub struct InMemoryEventBus {
    sys: Arc<dyn ISys>,
    topics: Mutex<HashMap<String, VecDeque<QueuedMessage>>>,
    in_flight: Mutex<HashMap<u64, QueuedMessage>>,
    next_delivery_tag: AtomicU64,
    published: Notify,
    closed: AtomicBool,
}

impl InMemoryEventBus {
    pub fn new(sys: Arc<dyn ISys>) -> Self {
        Self {
            sys,
            topics: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            next_delivery_tag: AtomicU64::new(1),
            published: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Wakes up all consumers, which will then return `EventBusError::Closed`
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.published.notify_waiters();
    }

    /// Number of messages waiting on `topic`, expired ones included
    pub fn queued(&self, topic: &str) -> usize {
        let topics = self.topics.lock().unwrap();
        topics.get(topic).map(|q| q.len()).unwrap_or(0)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }

    fn try_pop(&self, topic: &str) -> Option<Delivery> {
        let now = self.sys.get_timestamp_millis();
        let mut topics = self.topics.lock().unwrap();
        let queue = topics.get_mut(topic)?;

        while let Some(message) = queue.pop_front() {
            if matches!(message.expires_at, Some(expires_at) if expires_at <= now) {
                warn!(
                    "Dropping expired message on topic: {} after {} attempt(s)",
                    topic, message.attempt
                );
                continue;
            }

            let delivery_tag = self.next_delivery_tag.fetch_add(1, Ordering::SeqCst);
            let delivery = Delivery {
                delivery_tag,
                topic: topic.to_string(),
                payload: message.payload.clone(),
                attempt: message.attempt,
            };
            self.in_flight.lock().unwrap().insert(delivery_tag, message);
            return Some(delivery);
        }
        None
    }
}

#[async_trait::async_trait]
impl IEventBus for InMemoryEventBus {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        ttl_millis: Option<i64>,
    ) -> Result<(), EventBusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EventBusError::Closed);
        }
        let expires_at = ttl_millis.map(|ttl| self.sys.get_timestamp_millis() + ttl);
        {
            let mut topics = self.topics.lock().unwrap();
            topics
                .entry(topic.to_string())
                .or_default()
                .push_back(QueuedMessage {
                    payload,
                    expires_at,
                    attempt: 1,
                });
        }
        self.published.notify_waiters();
        Ok(())
    }

    async fn consume(&self, topic: &str) -> Result<Delivery, EventBusError> {
        loop {
            // Register interest before checking the queue so that a publish
            // in between is not missed
            let published = self.published.notified();
            if self.closed.load(Ordering::SeqCst) {
                return Err(EventBusError::Closed);
            }
            if let Some(delivery) = self.try_pop(topic) {
                return Ok(delivery);
            }
            published.await;
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), EventBusError> {
        match self.in_flight.lock().unwrap().remove(&delivery.delivery_tag) {
            Some(_) => Ok(()),
            None => Err(EventBusError::UnknownDelivery(delivery.delivery_tag)),
        }
    }

    async fn nack(&self, delivery: &Delivery) -> Result<(), EventBusError> {
        let mut message = self
            .in_flight
            .lock()
            .unwrap()
            .remove(&delivery.delivery_tag)
            .ok_or(EventBusError::UnknownDelivery(delivery.delivery_tag))?;
        message.attempt += 1;
        {
            let mut topics = self.topics.lock().unwrap();
            topics
                .entry(delivery.topic.clone())
                .or_default()
                .push_front(message);
        }
        self.published.notify_waiters();
        Ok(())
    }
}
