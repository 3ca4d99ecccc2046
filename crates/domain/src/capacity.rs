//! Capacity accountant.
//!
//! Pure admission arithmetic with no I/O and no state. Every input yields a
//! defined [`Decision`]; the stores call [`evaluate`] while holding the
//! event's serialization point and apply the result as-is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registration::PartySize;

/// Why a registration was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// The requested party size was zero, negative or out of range.
    #[error("Invalid party size: {requested} (must be greater than 0)")]
    InvalidPartySize { requested: i64 },

    /// Admitting the party would exceed the event's capacity.
    #[error("Capacity exceeded: {remaining} spots remaining")]
    CapacityExceeded { remaining: u32 },
}

impl Rejection {
    /// Returns a stable snake_case label, used for metrics and API bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::InvalidPartySize { .. } => "invalid_party_size",
            Rejection::CapacityExceeded { .. } => "capacity_exceeded",
        }
    }
}

/// Outcome of a capacity evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Admit the party; the event's count becomes `new_count`.
    Admit { new_count: u32 },
    /// Leave the event untouched.
    Reject(Rejection),
}

impl Decision {
    /// Returns true for [`Decision::Admit`].
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }
}

/// Decides whether a party of `requested` fits an event holding `existing`
/// attendees.
///
/// Party size is checked before any capacity arithmetic. Sums are computed in
/// 64 bits so no input can overflow.
pub fn evaluate(existing: u32, capacity: Option<u32>, requested: i64) -> Decision {
    let party_size = match PartySize::try_from(requested) {
        Ok(size) => size,
        Err(rejection) => return Decision::Reject(rejection),
    };

    let total = u64::from(existing) + u64::from(party_size.get());

    match capacity {
        Some(capacity) if total > u64::from(capacity) => {
            Decision::Reject(Rejection::CapacityExceeded {
                remaining: capacity.saturating_sub(existing),
            })
        }
        _ => match u32::try_from(total) {
            Ok(new_count) => Decision::Admit { new_count },
            Err(_) => Decision::Reject(Rejection::CapacityExceeded {
                remaining: u32::MAX - existing,
            }),
        },
    }
}

/// Returns the amount a cancellation removes from the event's count.
pub fn cancellation_delta(removed: PartySize) -> u32 {
    removed.get()
}

/// Applies a cancellation delta, flooring the count at zero.
///
/// The floor only matters if the cached count has drifted from the
/// registrations; it does not replace keeping the two in step.
pub fn apply_cancellation(current: u32, delta: u32) -> u32 {
    current.saturating_sub(delta)
}
