use game_notifier_domain::ID;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async lock per `Game`. Work that reads a roster and acts on it
/// (dispatching, participant changes, game updates) holds the lock of its
/// `Game`, while different `Game`s proceed concurrently.
///
/// The locks are not reentrant: a use case holding one must not execute
/// another use case that locks the same `Game`.
#[derive(Default)]
pub struct GameLocks {
    locks: Mutex<HashMap<ID, Arc<Mutex<()>>>>,
}

impl GameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, game_id: &ID) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Only the map refers to these, nobody holds or waits for them
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(*game_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}
