use crate::{
    notification::notify_promotions::NotifyPromotionsUseCase,
    shared::usecase::{execute, UseCase},
};
use game_notifier_domain::{Participant, ID};
use game_notifier_infra::NotifyContext;

/// Removes a `Participant` from its `Game`. Its pending notifications go
/// with it, and participants moving up from the waitlist into the freed
/// slot are told so.
#[derive(Debug)]
pub struct RemoveParticipantUseCase {
    pub participant_id: ID,
}

#[derive(Debug)]
pub struct RemovedParticipant {
    pub participant: Participant,
    pub promoted: Vec<ID>,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for RemoveParticipantUseCase {
    type Response = RemovedParticipant;

    type Error = UseCaseError;

    const NAME: &'static str = "RemoveParticipant";

    async fn execute(&mut self, ctx: &NotifyContext) -> Result<Self::Response, Self::Error> {
        let participant = ctx
            .repos
            .participants
            .find(&self.participant_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or(UseCaseError::NotFound(self.participant_id))?;

        // A concurrent roster change between the two snapshots would make
        // both removals report the same promotion
        let _guard = ctx.game_locks.lock(&participant.game_id).await;

        let before = ctx
            .repos
            .games
            .find_with_participants(&participant.game_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let participant = ctx
            .repos
            .participants
            .delete(&self.participant_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or(UseCaseError::NotFound(self.participant_id))?;

        let before = match before {
            Some(before) => before,
            None => {
                return Ok(RemovedParticipant {
                    participant,
                    promoted: Vec::new(),
                })
            }
        };
        let after = match ctx
            .repos
            .games
            .find_with_participants(&participant.game_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
        {
            Some(after) => after,
            None => {
                return Ok(RemovedParticipant {
                    participant,
                    promoted: Vec::new(),
                })
            }
        };

        let notify_promotions = NotifyPromotionsUseCase {
            game: after.game,
            roster_before: before.participants,
            capacity_before: before.game.max_participants,
            roster_after: after.participants,
        };
        let promoted = match execute(notify_promotions, ctx).await {
            Ok(report) => report.promoted,
            Err(_) => Vec::new(),
        };

        Ok(RemovedParticipant {
            participant,
            promoted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_notifier_domain::{Game, ParticipantCategory, ScheduleRecord};
    use game_notifier_infra::InMemoryMessagingClient;
    use std::sync::Arc;

    #[tokio::test]
    async fn removal_cancels_pending_notifications_and_promotes() {
        let mut ctx = NotifyContext::create_inmemory();
        let messaging = Arc::new(InMemoryMessagingClient::new());
        ctx.messaging = messaging.clone();

        let mut game = Game::new("Raid night", ctx.sys.get_timestamp_millis() + 1000 * 60 * 60);
        game.max_participants = Some(1);
        ctx.repos.games.insert(&game).await.unwrap();
        let alice = Participant::user(game.id, "alice", ParticipantCategory::SelfAdded, 0, 1);
        let bob = Participant::user(game.id, "bob", ParticipantCategory::SelfAdded, 1, 2);
        for p in [&alice, &bob] {
            ctx.repos.participants.insert(p).await.unwrap();
            ctx.repos
                .schedule_records
                .insert(&ScheduleRecord::join_notification(&game, p, 1000 * 60))
                .await
                .unwrap();
        }

        let removed = RemoveParticipantUseCase {
            participant_id: alice.id,
        }
        .execute(&ctx)
        .await
        .unwrap();

        assert_eq!(removed.participant, alice);
        assert_eq!(removed.promoted, vec![bob.id]);
        assert_eq!(messaging.sent_to("bob").len(), 1);
        let remaining = ctx
            .repos
            .schedule_records
            .find_by_game(&game.id)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].participant_id, Some(bob.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_removals_promote_each_participant_once() {
        let mut ctx = NotifyContext::create_inmemory();
        let messaging = Arc::new(InMemoryMessagingClient::new());
        ctx.messaging = messaging.clone();

        let mut game = Game::new("Raid night", ctx.sys.get_timestamp_millis() + 1000 * 60 * 60);
        game.max_participants = Some(2);
        ctx.repos.games.insert(&game).await.unwrap();
        let roster: Vec<_> = ["alice", "bob", "carol", "dave"]
            .iter()
            .enumerate()
            .map(|(rank, user)| {
                Participant::user(game.id, *user, ParticipantCategory::SelfAdded, rank as i64, 0)
            })
            .collect();
        for p in &roster {
            ctx.repos.participants.insert(p).await.unwrap();
        }

        let removals: Vec<_> = roster[..2]
            .iter()
            .map(|p| {
                let ctx = ctx.clone();
                let participant_id = p.id;
                tokio::spawn(async move {
                    RemoveParticipantUseCase { participant_id }
                        .execute(&ctx)
                        .await
                        .unwrap()
                })
            })
            .collect();
        let mut promoted = Vec::new();
        for removal in removals {
            promoted.extend(removal.await.unwrap().promoted);
        }

        promoted.sort();
        let mut expected = vec![roster[2].id, roster[3].id];
        expected.sort();
        assert_eq!(promoted, expected);
        assert_eq!(messaging.sent_to("carol").len(), 1);
        assert_eq!(messaging.sent_to("dave").len(), 1);
    }

    #[tokio::test]
    async fn removal_waits_for_the_game_lock() {
        let ctx = NotifyContext::create_inmemory();
        let game = Game::new("Raid night", ctx.sys.get_timestamp_millis() + 1000 * 60 * 60);
        ctx.repos.games.insert(&game).await.unwrap();
        let alice = Participant::user(game.id, "alice", ParticipantCategory::SelfAdded, 0, 1);
        ctx.repos.participants.insert(&alice).await.unwrap();

        let guard = ctx.game_locks.lock(&game.id).await;
        let removal = {
            let ctx = ctx.clone();
            let participant_id = alice.id;
            tokio::spawn(async move {
                RemoveParticipantUseCase { participant_id }
                    .execute(&ctx)
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!removal.is_finished());
        assert!(ctx.repos.participants.find(&alice.id).await.unwrap().is_some());

        drop(guard);
        assert!(removal.await.unwrap().is_ok());
        assert!(ctx.repos.participants.find(&alice.id).await.unwrap().is_none());
    }
}
