//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for calendar entities.
//! - Run every write through the full rule ordering inside one unit of
//!   work, so validation and persistence share a transactional snapshot.
//!
//! # Invariants
//! - Write paths validate structure (`validate()`) before opening the
//!   transaction and evaluate temporal rules inside it.
//! - Repository APIs return semantic errors (`YearNotFound`, rule
//!   failures) in addition to DB transport errors.

pub mod term_repo;
pub mod year_repo;
