//! Calendar integrity rules.
//!
//! # Responsibility
//! - Provide the closed-interval algebra used by the overlap and
//!   containment checks.
//! - Define the business-rule error taxonomy returned verbatim to callers.
//!
//! # Invariants
//! - Dates are zero-padded `YYYY-MM-DD` strings; lexicographic comparison
//!   is chronological comparison.
//! - Overlap is the closed-interval test `s1 <= e2 && s2 <= e1`; touching
//!   endpoints count as overlap.
//! - Rule errors carry a human-readable message naming the offending
//!   entity; they are expected, caller-correctable conditions.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Business-rule failures raised by calendar write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Range start is not strictly before range end.
    InvalidRange {
        entity: String,
        start: String,
        end: String,
    },
    /// Candidate range intersects a sibling range.
    Overlap { entity: String, other: String },
    /// Term range is not contained in the parent year range.
    OutOfBounds { term: String, year: String },
    /// Target (or an ancestor of the target) is administratively locked.
    Locked { entity: String },
}

impl Display for RuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { entity, start, end } => {
                write!(f, "{entity}: start date {start} must be before end date {end}")
            }
            Self::Overlap { entity, other } => {
                write!(f, "{entity}: date range overlaps {other}")
            }
            Self::OutOfBounds { term, year } => {
                write!(f, "{term}: date range is outside academic year {year}")
            }
            Self::Locked { entity } => {
                write!(f, "{entity} is locked and cannot be modified")
            }
        }
    }
}

impl Error for RuleError {}

/// Closed-interval overlap test over ISO date strings.
pub fn ranges_overlap(a_start: &str, a_end: &str, b_start: &str, b_end: &str) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Returns whether `[inner_start, inner_end]` lies within
/// `[outer_start, outer_end]`, endpoints inclusive.
pub fn range_contains(
    outer_start: &str,
    outer_end: &str,
    inner_start: &str,
    inner_end: &str,
) -> bool {
    outer_start <= inner_start && inner_end <= outer_end
}

/// Fails `InvalidRange` unless `start` is strictly before `end`.
pub fn check_range(entity: &str, start: &str, end: &str) -> Result<(), RuleError> {
    if start < end {
        Ok(())
    } else {
        Err(RuleError::InvalidRange {
            entity: entity.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}
