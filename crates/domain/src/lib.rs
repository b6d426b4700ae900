mod game;
mod participant;
mod roster;
mod schedule_record;
mod shared;

pub use game::{Game, GameReminder, GameWithParticipants};
pub use participant::{
    InvalidParticipantError, Participant, ParticipantCategory, ParticipantIdentity,
};
pub use roster::{detect_promotions, partition_roster, RosterPartition};
pub use schedule_record::{
    due_bucket, message_ttl_millis, InvalidNotificationKindError, NotificationKind,
    ScheduleRecord, DUE_BUCKET_MILLIS,
};
pub use shared::entity::{Entity, InvalidIDError, ID};
