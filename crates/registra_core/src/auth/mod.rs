//! Authorization layer: role gate and ownership verification.
//!
//! # Responsibility
//! - Decide role eligibility per operation before any resource is looked
//!   up, so resource existence is never leaked to ineligible actors.
//! - Verify relational claims (teacher-class, parent-student,
//!   student-record) against externally stored facts.
//!
//! # Invariants
//! - The gate is pure: no storage access, no side effects.
//! - A failed ownership check and a nonexistent resource are
//!   indistinguishable to callers.

pub mod gate;
pub mod ownership;
