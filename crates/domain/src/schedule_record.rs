use crate::{
    shared::entity::{Entity, ID},
    Game, GameReminder, Participant,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Width of the due time buckets used for deduplicating `ScheduleRecord`s.
/// Two unsent records for the same target that fall in the same bucket are
/// considered duplicates.
pub const DUE_BUCKET_MILLIS: i64 = 60 * 1000;

/// Decides how the dispatcher resolves recipients for a fired `ScheduleRecord`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Goes to the whole current roster of the `Game`
    Reminder,
    /// Goes to one specific `Participant` if they are still confirmed
    JoinNotification,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::JoinNotification => "join_notification",
        }
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Unknown notification kind: {0}")]
pub struct InvalidNotificationKindError(String);

impl FromStr for NotificationKind {
    type Err = InvalidNotificationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reminder" => Ok(Self::Reminder),
            "join_notification" => Ok(Self::JoinNotification),
            _ => Err(InvalidNotificationKindError(s.to_string())),
        }
    }
}

/// A `ScheduleRecord` is a durable statement that a notification of `kind`
/// should fire for a `Game` (and optionally one `Participant`) at `due_at`.
///
/// Records are removed together with the `Game` or `Participant` owning them,
/// which is how a pending notification gets cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRecord {
    pub id: ID,
    pub game_id: ID,
    pub kind: NotificationKind,
    /// Timestamp in millis at which the notification should fire
    pub due_at: i64,
    /// Timestamp in millis after which the notification is moot.
    /// Used for computing the time to live of the published message.
    pub entity_deadline_at: i64,
    /// How long before `entity_deadline_at` a `Reminder` fires. Used for
    /// recalculating `due_at` when the `Game` is moved.
    pub lead_millis: i64,
    /// `None` means the record applies to the whole roster
    pub participant_id: Option<ID>,
    /// Set exactly once, when the record is claimed for dispatch
    pub sent: bool,
}

impl ScheduleRecord {
    pub fn reminder(game: &Game, reminder: &GameReminder) -> Self {
        let lead_millis = reminder.lead_millis();
        Self {
            id: Default::default(),
            game_id: game.id,
            kind: NotificationKind::Reminder,
            due_at: game.deadline_ts() - lead_millis,
            entity_deadline_at: game.deadline_ts(),
            lead_millis,
            participant_id: None,
            sent: false,
        }
    }

    pub fn join_notification(game: &Game, participant: &Participant, delay_millis: i64) -> Self {
        Self {
            id: Default::default(),
            game_id: game.id,
            kind: NotificationKind::JoinNotification,
            due_at: participant.joined_at + delay_millis,
            entity_deadline_at: game.deadline_ts(),
            lead_millis: 0,
            participant_id: Some(participant.id),
            sent: false,
        }
    }

    pub fn due_bucket(&self) -> i64 {
        due_bucket(self.due_at)
    }

    pub fn is_due(&self, now_ts: i64) -> bool {
        !self.sent && self.due_at <= now_ts
    }

    /// True if both records target the same notification and would fire in
    /// the same due bucket
    pub fn is_duplicate_of(&self, other: &ScheduleRecord) -> bool {
        self.game_id == other.game_id
            && self.kind == other.kind
            && self.participant_id == other.participant_id
            && self.due_bucket() == other.due_bucket()
    }

    pub fn message_ttl_millis(&self, now_ts: i64, min_ttl_millis: i64) -> i64 {
        message_ttl_millis(self.entity_deadline_at, now_ts, min_ttl_millis)
    }
}

impl Entity<ID> for ScheduleRecord {
    fn id(&self) -> ID {
        self.id
    }
}

pub fn due_bucket(due_at: i64) -> i64 {
    due_at.div_euclid(DUE_BUCKET_MILLIS)
}

/// Time to live for a message about something that becomes moot at
/// `deadline_ts`. Shrinks as the deadline approaches but never goes below
/// `min_ttl_millis`, so a message is never published already expired.
pub fn message_ttl_millis(deadline_ts: i64, now_ts: i64, min_ttl_millis: i64) -> i64 {
    let min_ttl_millis = min_ttl_millis.max(0);
    deadline_ts.saturating_sub(now_ts).max(min_ttl_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParticipantCategory;

    const MINUTE: i64 = 60 * 1000;

    #[test]
    fn ttl_shrinks_towards_deadline() {
        let deadline = 1000 * MINUTE;
        let mut prev = i64::MAX;
        for now in (0..=1200).step_by(7).map(|m| m * MINUTE) {
            let ttl = message_ttl_millis(deadline, now, MINUTE);
            assert!(ttl <= prev);
            assert!(ttl >= 0);
            prev = ttl;
        }
    }

    #[test]
    fn ttl_has_a_floor() {
        let deadline = 10 * MINUTE;
        assert_eq!(message_ttl_millis(deadline, 0, MINUTE), 10 * MINUTE);
        assert_eq!(message_ttl_millis(deadline, 9 * MINUTE + 30_000, MINUTE), MINUTE);
        assert_eq!(message_ttl_millis(deadline, 20 * MINUTE, MINUTE), MINUTE);
        // A negative floor is treated as no floor
        assert_eq!(message_ttl_millis(deadline, 20 * MINUTE, -5), 0);
    }

    #[test]
    fn reminder_fires_before_game_start() {
        let game = Game::new("Raid night", 100 * MINUTE);
        let record = ScheduleRecord::reminder(&game, &GameReminder { minutes_before: 15 });
        assert_eq!(record.due_at, 85 * MINUTE);
        assert_eq!(record.entity_deadline_at, 100 * MINUTE);
        assert_eq!(record.lead_millis, 15 * MINUTE);
        assert!(record.participant_id.is_none());
        assert!(!record.is_due(84 * MINUTE));
        assert!(record.is_due(85 * MINUTE));
    }

    #[test]
    fn join_notification_targets_participant() {
        let game = Game::new("Raid night", 100 * MINUTE);
        let participant = Participant::user(
            game.id,
            "user-1",
            ParticipantCategory::SelfAdded,
            0,
            10 * MINUTE,
        );
        let record = ScheduleRecord::join_notification(&game, &participant, MINUTE);
        assert_eq!(record.due_at, 11 * MINUTE);
        assert_eq!(record.participant_id, Some(participant.id));
        assert_eq!(record.kind, NotificationKind::JoinNotification);
    }

    #[test]
    fn duplicates_share_target_and_bucket() {
        let game = Game::new("Raid night", 100 * MINUTE);
        let a = ScheduleRecord::reminder(&game, &GameReminder { minutes_before: 15 });
        let mut b = a.clone();
        b.id = ID::new();
        b.due_at += 20_000;
        assert!(a.is_duplicate_of(&b));

        b.due_at = a.due_at + MINUTE;
        assert!(!a.is_duplicate_of(&b));
    }

    #[test]
    fn notification_kind_parses() {
        for kind in [NotificationKind::Reminder, NotificationKind::JoinNotification] {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
        assert!("promotion".parse::<NotificationKind>().is_err());
    }
}
