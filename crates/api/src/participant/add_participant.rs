use crate::shared::usecase::UseCase;
use game_notifier_domain::{
    Participant, ParticipantCategory, ParticipantIdentity, ScheduleRecord, ID,
};
use game_notifier_infra::NotifyContext;
use tracing::warn;

/// Adds a `Participant` to the roster of a `Game` and schedules its delayed
/// join notification.
///
/// Whether the `Participant` ends up confirmed or waitlisted is decided
/// when the join notification fires, not here.
#[derive(Debug)]
pub struct AddParticipantUseCase {
    pub game_id: ID,
    pub identity: ParticipantIdentity,
    pub category: ParticipantCategory,
    pub rank: i64,
}

#[derive(Debug)]
pub struct AddedParticipant {
    pub participant: Participant,
    pub join_notification: Option<ScheduleRecord>,
}

#[derive(Debug)]
pub enum UseCaseError {
    GameNotFound(ID),
    GameAlreadyStarted(ID),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for AddParticipantUseCase {
    type Response = AddedParticipant;

    type Error = UseCaseError;

    const NAME: &'static str = "AddParticipant";

    async fn execute(&mut self, ctx: &NotifyContext) -> Result<Self::Response, Self::Error> {
        // Keeps a concurrent removal from counting the newcomer as promoted
        let _guard = ctx.game_locks.lock(&self.game_id).await;

        let game = ctx
            .repos
            .games
            .find(&self.game_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or(UseCaseError::GameNotFound(self.game_id))?;

        let now = ctx.sys.get_timestamp_millis();
        if game.has_started(now) {
            return Err(UseCaseError::GameAlreadyStarted(game.id));
        }

        let participant = match &self.identity {
            ParticipantIdentity::User { user_ref } => {
                Participant::user(game.id, user_ref.as_str(), self.category, self.rank, now)
            }
            ParticipantIdentity::Placeholder { display_label } => Participant::placeholder(
                game.id,
                display_label.as_str(),
                self.category,
                self.rank,
                now,
            ),
        };
        ctx.repos
            .participants
            .insert(&participant)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        // Placeholders can not be messaged
        if participant.is_placeholder() {
            return Ok(AddedParticipant {
                participant,
                join_notification: None,
            });
        }

        let record = ScheduleRecord::join_notification(
            &game,
            &participant,
            ctx.config.join_notification_delay_millis,
        );
        if record.due_at >= game.deadline_ts() {
            return Ok(AddedParticipant {
                participant,
                join_notification: None,
            });
        }

        let inserted = ctx
            .repos
            .schedule_records
            .insert(&record)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if inserted {
            if let Err(e) = ctx.wake.signal().await {
                warn!("Unable to wake the scheduler. Err: {:?}", e);
            }
        }

        Ok(AddedParticipant {
            participant,
            join_notification: if inserted { Some(record) } else { None },
        })
    }
}
