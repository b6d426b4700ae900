use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Coarse priority bucket of a `Participant` on a roster.
///
/// Categories are ordered by their sort key. The keys are intentionally
/// sparse so that a new category can be inserted between two existing ones
/// without renumbering stored rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantCategory {
    /// Placed on the roster by the organizer of the `Game`
    Organizer,
    /// Joined the `Game` on their own
    SelfAdded,
}

impl ParticipantCategory {
    pub fn sort_key(&self) -> i16 {
        match self {
            Self::Organizer => 100,
            Self::SelfAdded => 200,
        }
    }

    pub fn from_sort_key(key: i16) -> Option<Self> {
        match key {
            100 => Some(Self::Organizer),
            200 => Some(Self::SelfAdded),
            _ => None,
        }
    }
}

impl PartialOrd for ParticipantCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParticipantCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Who is behind a roster slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantIdentity {
    /// A real user on the chat platform that can receive direct messages
    User { user_ref: String },
    /// A reserved slot without a user behind it. It occupies capacity but
    /// never receives messages.
    Placeholder { display_label: String },
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidParticipantError {
    #[error("Participant: {0} must have exactly one of user_ref and display_label")]
    AmbiguousIdentity(ID),
    #[error("Participant: {0} has unknown category: {1}")]
    UnknownCategory(ID, i16),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: ID,
    pub game_id: ID,
    pub identity: ParticipantIdentity,
    pub category: ParticipantCategory,
    /// Tie-break within the category. Not contiguous, gaps are expected.
    pub rank: i64,
    /// Timestamp in millis for when the `Participant` joined
    pub joined_at: i64,
}

impl Participant {
    pub fn user(
        game_id: ID,
        user_ref: impl Into<String>,
        category: ParticipantCategory,
        rank: i64,
        joined_at: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            game_id,
            identity: ParticipantIdentity::User {
                user_ref: user_ref.into(),
            },
            category,
            rank,
            joined_at,
        }
    }

    pub fn placeholder(
        game_id: ID,
        display_label: impl Into<String>,
        category: ParticipantCategory,
        rank: i64,
        joined_at: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            game_id,
            identity: ParticipantIdentity::Placeholder {
                display_label: display_label.into(),
            },
            category,
            rank,
            joined_at,
        }
    }

    /// Rebuilds a `Participant` from its stored columns, where the identity is
    /// split into two nullable fields
    pub fn from_parts(
        id: ID,
        game_id: ID,
        user_ref: Option<String>,
        display_label: Option<String>,
        category: i16,
        rank: i64,
        joined_at: i64,
    ) -> Result<Self, InvalidParticipantError> {
        let identity = match (user_ref, display_label) {
            (Some(user_ref), None) => ParticipantIdentity::User { user_ref },
            (None, Some(display_label)) => ParticipantIdentity::Placeholder { display_label },
            _ => return Err(InvalidParticipantError::AmbiguousIdentity(id)),
        };
        let category = ParticipantCategory::from_sort_key(category)
            .ok_or(InvalidParticipantError::UnknownCategory(id, category))?;

        Ok(Self {
            id,
            game_id,
            identity,
            category,
            rank,
            joined_at,
        })
    }

    pub fn user_ref(&self) -> Option<&str> {
        match &self.identity {
            ParticipantIdentity::User { user_ref } => Some(user_ref),
            ParticipantIdentity::Placeholder { .. } => None,
        }
    }

    pub fn display_label(&self) -> Option<&str> {
        match &self.identity {
            ParticipantIdentity::User { .. } => None,
            ParticipantIdentity::Placeholder { display_label } => Some(display_label),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.user_ref().is_none()
    }

    /// Roster order: category first, then rank, then join time
    pub fn sort_key(&self) -> (ParticipantCategory, i64, i64) {
        (self.category, self.rank, self.joined_at)
    }
}

impl Entity<ID> for Participant {
    fn id(&self) -> ID {
        self.id
    }
}
