use crate::{shared::entity::ID, Participant};
use itertools::Itertools;
use std::collections::HashSet;

/// The roster of a `Game` split by capacity.
///
/// Both lists are in roster order and include placeholder participants,
/// since placeholders occupy capacity just like real users do. Use the
/// `notifiable_*` accessors to get only the participants that can receive
/// messages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RosterPartition {
    pub confirmed: Vec<Participant>,
    pub waitlisted: Vec<Participant>,
}

impl RosterPartition {
    pub fn notifiable_confirmed(&self) -> impl Iterator<Item = &Participant> {
        self.confirmed.iter().filter(|p| !p.is_placeholder())
    }

    pub fn notifiable_waitlisted(&self) -> impl Iterator<Item = &Participant> {
        self.waitlisted.iter().filter(|p| !p.is_placeholder())
    }

    pub fn is_confirmed(&self, participant_id: &ID) -> bool {
        self.confirmed.iter().any(|p| p.id == *participant_id)
    }

    pub fn is_waitlisted(&self, participant_id: &ID) -> bool {
        self.waitlisted.iter().any(|p| p.id == *participant_id)
    }

    /// 1-based position on the waitlist
    pub fn waitlist_position(&self, participant_id: &ID) -> Option<usize> {
        self.waitlisted
            .iter()
            .position(|p| p.id == *participant_id)
            .map(|pos| pos + 1)
    }

    pub fn confirmed_ids(&self) -> HashSet<ID> {
        self.confirmed.iter().map(|p| p.id).collect()
    }
}

/// Orders the roster by (category, rank, join time) and splits it into the
/// participants within `capacity` and the ones beyond it.
///
/// Ranks are only used as sort keys, so gaps left behind by removed
/// participants never shift anybody into the wrong slot. Placeholders are
/// part of the split and take up confirmed slots.
///
/// # Panics
/// If `capacity` is negative.
pub fn partition_roster(participants: &[Participant], capacity: Option<i64>) -> RosterPartition {
    if let Some(capacity) = capacity {
        assert!(
            capacity >= 0,
            "Roster capacity must not be negative, got: {}",
            capacity
        );
    }

    let mut ordered = participants
        .iter()
        .cloned()
        .sorted_by_key(|p| p.sort_key())
        .collect::<Vec<_>>();

    let waitlisted = match capacity {
        Some(capacity) if (capacity as usize) < ordered.len() => {
            ordered.split_off(capacity as usize)
        }
        _ => Vec::new(),
    };

    RosterPartition {
        confirmed: ordered,
        waitlisted,
    }
}

/// Participants that are confirmed after a roster change but were not
/// confirmed before it.
///
/// Both sides are computed with `partition_roster` so that promotion
/// detection can never disagree with what the dispatcher considers
/// confirmed. Promoted placeholders are left out as they cannot be notified.
pub fn detect_promotions(
    before: &[Participant],
    capacity_before: Option<i64>,
    after: &[Participant],
    capacity_after: Option<i64>,
) -> Vec<Participant> {
    let previously_confirmed = partition_roster(before, capacity_before).confirmed_ids();

    partition_roster(after, capacity_after)
        .notifiable_confirmed()
        .filter(|p| !previously_confirmed.contains(&p.id))
        .cloned()
        .collect()
}
