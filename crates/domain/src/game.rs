use crate::{
    shared::entity::{Entity, ID},
    Participant,
};

/// A `Game` is a scheduled session which `Participant`s can join.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: ID,
    pub title: String,
    /// Timestamp in millis for when the `Game` starts.
    pub start_ts: i64,
    /// Maximum number of confirmed `Participant`s. `None` means that
    /// everybody who joins is confirmed.
    pub max_participants: Option<i64>,
    /// Game specific instructions included in the join confirmation
    pub instructions: Option<String>,
    /// Reminders the roster should receive before the `Game` starts
    pub reminders: Vec<GameReminder>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameReminder {
    pub minutes_before: i64,
}

impl GameReminder {
    pub fn lead_millis(&self) -> i64 {
        self.minutes_before * 60 * 1000
    }
}

impl Game {
    pub fn new(title: impl Into<String>, start_ts: i64) -> Self {
        Self {
            id: Default::default(),
            title: title.into(),
            start_ts,
            max_participants: None,
            instructions: None,
            reminders: Vec::new(),
        }
    }

    /// After this timestamp any notification about the `Game` is moot
    pub fn deadline_ts(&self) -> i64 {
        self.start_ts
    }

    pub fn has_started(&self, now_ts: i64) -> bool {
        now_ts >= self.deadline_ts()
    }
}

impl Entity<ID> for Game {
    fn id(&self) -> ID {
        self.id
    }
}

/// A `Game` together with its current roster
#[derive(Debug, Clone)]
pub struct GameWithParticipants {
    pub game: Game,
    pub participants: Vec<Participant>,
}
