use super::{deliver_all, messages, DeliveryReport, OutgoingMessage};
use crate::shared::usecase::UseCase;
use game_notifier_api_structs::notification_event::NotificationEvent;
use game_notifier_domain::{
    partition_roster, GameWithParticipants, NotificationKind, RosterPartition, ID,
};
use game_notifier_infra::NotifyContext;
use tracing::info;

/// Resolves the recipients of a fired notification from the current state
/// of the `Game` and sends them their direct messages.
///
/// The `Game` and its roster are re-read here because both may have changed
/// since the notification was scheduled.
#[derive(Debug)]
pub struct DispatchNotificationUseCase {
    pub event: NotificationEvent,
}

#[derive(Debug, PartialEq)]
pub enum DispatchOutcome {
    Delivered(DeliveryReport),
    Skipped(SkipReason),
}

/// Why a notification turned out to be moot when it fired
#[derive(Debug, PartialEq)]
pub enum SkipReason {
    GameNotFound,
    GameStarted,
    MissingParticipantRef,
    ParticipantNotFound(ID),
    ParticipantWaitlisted(ID),
    Placeholder(ID),
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

fn reminder_messages(
    game_with_participants: &GameWithParticipants,
    roster: &RosterPartition,
) -> Vec<OutgoingMessage> {
    let game = &game_with_participants.game;
    let confirmed = roster.notifiable_confirmed().map(|p| (p, messages::reminder(game)));
    let waitlisted = roster.notifiable_waitlisted().map(|p| {
        let position = roster.waitlist_position(&p.id).unwrap_or_default();
        (p, messages::waitlisted_reminder(game, position))
    });

    confirmed
        .chain(waitlisted)
        .filter_map(|(p, text)| {
            p.user_ref().map(|user_ref| OutgoingMessage {
                participant_id: p.id,
                user_ref: user_ref.to_string(),
                text,
            })
        })
        .collect()
}

fn join_notification_message(
    participant_id: Option<ID>,
    game_with_participants: &GameWithParticipants,
    roster: &RosterPartition,
) -> Result<OutgoingMessage, SkipReason> {
    let participant_id = participant_id.ok_or(SkipReason::MissingParticipantRef)?;
    let participant = game_with_participants
        .participants
        .iter()
        .find(|p| p.id == participant_id)
        .ok_or(SkipReason::ParticipantNotFound(participant_id))?;

    if !roster.is_confirmed(&participant.id) {
        return Err(SkipReason::ParticipantWaitlisted(participant.id));
    }
    let user_ref = participant
        .user_ref()
        .ok_or(SkipReason::Placeholder(participant.id))?;

    Ok(OutgoingMessage {
        participant_id: participant.id,
        user_ref: user_ref.to_string(),
        text: messages::join_confirmation(&game_with_participants.game),
    })
}

#[async_trait::async_trait]
impl UseCase for DispatchNotificationUseCase {
    type Response = DispatchOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "DispatchNotification";

    async fn execute(&mut self, ctx: &NotifyContext) -> Result<Self::Response, Self::Error> {
        let game_with_participants = match ctx
            .repos
            .games
            .find_with_participants(&self.event.game_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
        {
            Some(game) => game,
            None => {
                info!(
                    "Game: {} is gone, skipping {} notification",
                    self.event.game_id, self.event.kind
                );
                return Ok(DispatchOutcome::Skipped(SkipReason::GameNotFound));
            }
        };
        if game_with_participants
            .game
            .has_started(ctx.sys.get_timestamp_millis())
        {
            info!(
                "Game: {} has already started, skipping {} notification",
                self.event.game_id, self.event.kind
            );
            return Ok(DispatchOutcome::Skipped(SkipReason::GameStarted));
        }

        let roster = partition_roster(
            &game_with_participants.participants,
            game_with_participants.game.max_participants,
        );

        let messages = match self.event.kind {
            NotificationKind::Reminder => reminder_messages(&game_with_participants, &roster),
            NotificationKind::JoinNotification => match join_notification_message(
                self.event.participant_id,
                &game_with_participants,
                &roster,
            ) {
                Ok(message) => vec![message],
                Err(reason) => {
                    info!(
                        "No join notification sent for game: {}. Reason: {:?}",
                        self.event.game_id, reason
                    );
                    return Ok(DispatchOutcome::Skipped(reason));
                }
            },
        };

        let report = deliver_all(messages, ctx).await;
        Ok(DispatchOutcome::Delivered(report))
    }
}
