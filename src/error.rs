use std::fmt;

use crate::model::CallId;

pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised by the dispatch core.
///
/// Sampler variants (`EmptyCollection`, `DegenerateWeights`, `SelectionMiss`) are
/// programming errors at call sites using `draw()` and expected conditions at call
/// sites using `try_draw()`. `InvalidConfiguration` is only ever returned from
/// constructors and is never caught internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A sampler was drawn from with zero items.
    EmptyCollection,
    /// Items exist but every weight is zero, so the cumulative total is zero.
    DegenerateWeights { items: usize },
    /// A roll inside `[1, total]` landed in no interval. Indicates thresholds are stale.
    SelectionMiss { roll: u64, total: u64 },
    /// No valid location was found for an event type within the attempt ceiling.
    LocationSearchExhausted { zone: String, attempts: u32 },
    /// A zone's samplers produced no event type for the current world state.
    NoEligibleEvent { zone: String },
    /// A region stopped itself after too many consecutive failed iterations.
    SchedulerFault { region: String, failures: u32 },
    InvalidConfiguration(String),
    UnknownCall(CallId),
    DuplicateCall(CallId),
    /// A unit or call was asked to move between states that are not connected.
    InvalidTransition { subject: String, from: String, to: String },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCollection => write!(f, "cannot draw from an empty collection"),
            Self::DegenerateWeights { items } => {
                write!(f, "all {items} items have zero weight")
            }
            Self::SelectionMiss { roll, total } => {
                write!(f, "roll {roll} matched no interval in [1, {total}]")
            }
            Self::LocationSearchExhausted { zone, attempts } => {
                write!(f, "no free location in zone {zone} after {attempts} attempts")
            }
            Self::NoEligibleEvent { zone } => {
                write!(f, "zone {zone} has no eligible event type right now")
            }
            Self::SchedulerFault { region, failures } => write!(
                f,
                "region {region} stopped after {failures} consecutive failed iterations"
            ),
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            Self::UnknownCall(id) => write!(f, "unknown call {id}"),
            Self::DuplicateCall(id) => write!(f, "call {id} is already registered"),
            Self::InvalidTransition { subject, from, to } => {
                write!(f, "{subject} cannot move from {from} to {to}")
            }
        }
    }
}

impl std::error::Error for SimError {}

impl SimError {
    /// True for the sampler-level failures that `try_draw` folds into `None`.
    pub fn is_sampling_failure(&self) -> bool {
        matches!(
            self,
            Self::EmptyCollection | Self::DegenerateWeights { .. } | Self::SelectionMiss { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_region() {
        let err = SimError::SchedulerFault {
            region: "Los Santos".to_string(),
            failures: 3,
        };
        assert_eq!(
            err.to_string(),
            "region Los Santos stopped after 3 consecutive failed iterations"
        );
    }

    #[test]
    fn sampling_failures_are_classified() {
        assert!(SimError::EmptyCollection.is_sampling_failure());
        assert!(SimError::DegenerateWeights { items: 2 }.is_sampling_failure());
        assert!(!SimError::InvalidConfiguration("x".into()).is_sampling_failure());
    }
}
