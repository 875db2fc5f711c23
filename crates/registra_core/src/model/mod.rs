//! Domain model for tenant-scoped calendar entities and actors.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep structural validation (names, date format) on the model itself.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Temporal invariants (range order, overlap, containment) are enforced
//!   by the rule engine at write time, not by constructors.

pub mod actor;
pub mod calendar;
