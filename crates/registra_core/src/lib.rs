//! Core domain logic for the Registra records platform.
//! This crate is the single source of truth for authorization decisions
//! and calendar-integrity invariants.

pub mod auth;
pub mod db;
pub mod directory;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rules;
pub mod service;

pub use auth::gate::{authorize, ApiAction, AuthError};
pub use auth::ownership::{
    can_access, OwnershipError, OwnershipVerifier, RelationKind, SqliteOwnershipVerifier,
};
pub use directory::{resolve_actor, DirectoryError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::actor::{parse_role, Actor, ActorId, Role, RoleParseError};
pub use model::calendar::{
    is_valid_date, AcademicYear, CalendarValidationError, Tenant, TenantId, Term, TermId, YearId,
};
pub use repo::term_repo::{SqliteTermRepository, TermRepository, TermUpdate};
pub use repo::year_repo::{
    RepoError, RepoResult, SqliteYearRepository, YearRepository, YearUpdate,
};
pub use rules::{check_range, range_contains, ranges_overlap, RuleError};
pub use service::calendar_service::{
    CalendarService, CalendarServiceError, CreateTermRequest, CreateYearRequest,
    UpdateTermRequest, UpdateYearRequest,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
