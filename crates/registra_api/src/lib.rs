//! Request-facing facade for the Registra core.
//! Resolves actors, consults the authorization gate, dispatches to core
//! services and shapes results into the platform response envelope.

pub mod api;

pub use api::{
    create_term, create_year, delete_term, delete_year, list_terms, list_years, lock_term,
    lock_year, unlock_term, unlock_year, update_term, update_year, ApiResponse, RequestContext,
};
// Hosts bootstrap logging through the same surface they dispatch through.
pub use registra_core::{default_log_level, init_logging};
