//! Envelope API for calendar operations.
//!
//! # Responsibility
//! - Resolve the request's actor through the user directory.
//! - Consult the authorization gate before any resource is looked up.
//! - Map the core error taxonomy onto envelope bodies and status codes.
//!
//! # Invariants
//! - Role eligibility is decided before resource existence is revealed.
//! - Business-rule messages pass through verbatim; storage failures are
//!   logged in full and replaced with a generic message.
//! - Handlers never panic; every outcome is an [`ApiResponse`].

use log::error;
use registra_core::{
    authorize, resolve_actor, Actor, ApiAction, AuthError, CalendarService, CalendarServiceError,
    CreateTermRequest, CreateYearRequest, SqliteTermRepository, SqliteYearRepository,
    UpdateTermRequest, UpdateYearRequest,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Display;
use uuid::Uuid;

const GENERIC_SYSTEM_ERROR: &str = "internal storage error";

/// Per-request context handed in by the transport layer.
///
/// The identity provider has already validated credentials; this carries
/// only the resolved opaque subject, or nothing for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub external_identity: Option<String>,
}

impl RequestContext {
    /// Context for a request without any resolvable identity.
    pub fn anonymous() -> Self {
        Self {
            external_identity: None,
        }
    }

    /// Context for a request authenticated as the given external subject.
    pub fn for_identity(external_identity: impl Into<String>) -> Self {
        Self {
            external_identity: Some(external_identity.into()),
        }
    }
}

/// Response envelope: HTTP-style status plus the platform body contract.
///
/// Success bodies are `{"success": true, "data": ...}`; failures are
/// `{"error": message}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn success(status: u16, data: Value) -> Self {
        Self {
            status,
            body: json!({ "success": true, "data": data }),
        }
    }

    fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

/// Lists a tenant's academic years. Roles: admin, teacher.
pub fn list_years(conn: &Connection, ctx: &RequestContext, tenant_id: &str) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, ApiAction::ListYears) {
        return response;
    }
    let tenant_uuid = match parse_id(tenant_id, "tenant id") {
        Ok(value) => value,
        Err(response) => return response,
    };

    match calendar_service(conn).list_years(tenant_uuid) {
        Ok(years) => respond_with_data(200, &years),
        Err(err) => map_service_error(err),
    }
}

/// Creates an academic year. Roles: admin.
pub fn create_year(
    conn: &Connection,
    ctx: &RequestContext,
    payload: &CreateYearRequest,
) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, ApiAction::CreateYear) {
        return response;
    }

    match calendar_service(conn).create_year(payload) {
        Ok(year) => respond_with_data(201, &year),
        Err(err) => map_service_error(err),
    }
}

/// Replaces an academic year's mutable fields. Roles: admin.
pub fn update_year(
    conn: &Connection,
    ctx: &RequestContext,
    year_id: &str,
    payload: &UpdateYearRequest,
) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, ApiAction::UpdateYear) {
        return response;
    }
    let year_uuid = match parse_id(year_id, "academic year id") {
        Ok(value) => value,
        Err(response) => return response,
    };

    match calendar_service(conn).update_year(year_uuid, payload) {
        Ok(year) => respond_with_data(200, &year),
        Err(err) => map_service_error(err),
    }
}

/// Deletes an academic year and its terms. Roles: admin.
pub fn delete_year(conn: &Connection, ctx: &RequestContext, year_id: &str) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, ApiAction::DeleteYear) {
        return response;
    }
    let year_uuid = match parse_id(year_id, "academic year id") {
        Ok(value) => value,
        Err(response) => return response,
    };

    match calendar_service(conn).delete_year(year_uuid) {
        Ok(()) => ApiResponse::success(204, Value::Null),
        Err(err) => map_service_error(err),
    }
}

/// Locks an academic year (administrative close-out). Roles: admin.
pub fn lock_year(conn: &Connection, ctx: &RequestContext, year_id: &str) -> ApiResponse {
    year_lock_transition(conn, ctx, year_id, ApiAction::LockYear)
}

/// Explicitly unlocks an academic year. Roles: admin.
pub fn unlock_year(conn: &Connection, ctx: &RequestContext, year_id: &str) -> ApiResponse {
    year_lock_transition(conn, ctx, year_id, ApiAction::UnlockYear)
}

fn year_lock_transition(
    conn: &Connection,
    ctx: &RequestContext,
    year_id: &str,
    action: ApiAction,
) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, action) {
        return response;
    }
    let year_uuid = match parse_id(year_id, "academic year id") {
        Ok(value) => value,
        Err(response) => return response,
    };

    let service = calendar_service(conn);
    let result = if action == ApiAction::LockYear {
        service.lock_year(year_uuid)
    } else {
        service.unlock_year(year_uuid)
    };

    match result {
        Ok(year) => respond_with_data(200, &year),
        Err(err) => map_service_error(err),
    }
}

/// Lists one academic year's terms. Roles: admin, teacher.
pub fn list_terms(conn: &Connection, ctx: &RequestContext, year_id: &str) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, ApiAction::ListTerms) {
        return response;
    }
    let year_uuid = match parse_id(year_id, "academic year id") {
        Ok(value) => value,
        Err(response) => return response,
    };

    match calendar_service(conn).list_terms(year_uuid) {
        Ok(terms) => respond_with_data(200, &terms),
        Err(err) => map_service_error(err),
    }
}

/// Creates a term inside an academic year. Roles: admin.
pub fn create_term(
    conn: &Connection,
    ctx: &RequestContext,
    payload: &CreateTermRequest,
) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, ApiAction::CreateTerm) {
        return response;
    }

    match calendar_service(conn).create_term(payload) {
        Ok(term) => respond_with_data(201, &term),
        Err(err) => map_service_error(err),
    }
}

/// Replaces a term's mutable fields. Roles: admin.
pub fn update_term(
    conn: &Connection,
    ctx: &RequestContext,
    term_id: &str,
    payload: &UpdateTermRequest,
) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, ApiAction::UpdateTerm) {
        return response;
    }
    let term_uuid = match parse_id(term_id, "term id") {
        Ok(value) => value,
        Err(response) => return response,
    };

    match calendar_service(conn).update_term(term_uuid, payload) {
        Ok(term) => respond_with_data(200, &term),
        Err(err) => map_service_error(err),
    }
}

/// Deletes a term. Roles: admin.
pub fn delete_term(conn: &Connection, ctx: &RequestContext, term_id: &str) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, ApiAction::DeleteTerm) {
        return response;
    }
    let term_uuid = match parse_id(term_id, "term id") {
        Ok(value) => value,
        Err(response) => return response,
    };

    match calendar_service(conn).delete_term(term_uuid) {
        Ok(()) => ApiResponse::success(204, Value::Null),
        Err(err) => map_service_error(err),
    }
}

/// Locks a term. Roles: admin.
pub fn lock_term(conn: &Connection, ctx: &RequestContext, term_id: &str) -> ApiResponse {
    term_lock_transition(conn, ctx, term_id, ApiAction::LockTerm)
}

/// Explicitly unlocks a term. Roles: admin.
pub fn unlock_term(conn: &Connection, ctx: &RequestContext, term_id: &str) -> ApiResponse {
    term_lock_transition(conn, ctx, term_id, ApiAction::UnlockTerm)
}

fn term_lock_transition(
    conn: &Connection,
    ctx: &RequestContext,
    term_id: &str,
    action: ApiAction,
) -> ApiResponse {
    if let Err(response) = authorize_request(conn, ctx, action) {
        return response;
    }
    let term_uuid = match parse_id(term_id, "term id") {
        Ok(value) => value,
        Err(response) => return response,
    };

    let service = calendar_service(conn);
    let result = if action == ApiAction::LockTerm {
        service.lock_term(term_uuid)
    } else {
        service.unlock_term(term_uuid)
    };

    match result {
        Ok(term) => respond_with_data(200, &term),
        Err(err) => map_service_error(err),
    }
}

/// Runs identity resolution and the role gate, in that order, before any
/// resource is looked up.
fn authorize_request(
    conn: &Connection,
    ctx: &RequestContext,
    action: ApiAction,
) -> Result<Actor, ApiResponse> {
    let Some(identity) = ctx.external_identity.as_deref() else {
        return Err(deny(AuthError::Unauthenticated));
    };

    let actor = match resolve_actor(conn, identity) {
        Ok(actor) => actor,
        Err(err) => return Err(system_failure("directory_lookup", &err)),
    };
    let Some(actor) = actor else {
        return Err(deny(AuthError::Unauthenticated));
    };

    if let Err(err) = authorize(Some(actor.role), action) {
        return Err(deny(err));
    }

    Ok(actor)
}

fn calendar_service(
    conn: &Connection,
) -> CalendarService<SqliteYearRepository<'_>, SqliteTermRepository<'_>> {
    CalendarService::new(SqliteYearRepository::new(conn), SqliteTermRepository::new(conn))
}

fn respond_with_data<T: Serialize>(status: u16, data: &T) -> ApiResponse {
    match serde_json::to_value(data) {
        Ok(value) => ApiResponse::success(status, value),
        Err(err) => system_failure("response_encoding", &err),
    }
}

fn parse_id(value: &str, what: &str) -> Result<Uuid, ApiResponse> {
    Uuid::parse_str(value)
        .map_err(|_| ApiResponse::failure(400, format!("invalid {what}: `{value}`")))
}

fn deny(err: AuthError) -> ApiResponse {
    match err {
        AuthError::Unauthenticated => ApiResponse::failure(401, err.to_string()),
        AuthError::Forbidden { .. } => ApiResponse::failure(403, err.to_string()),
    }
}

fn map_service_error(err: CalendarServiceError) -> ApiResponse {
    match &err {
        CalendarServiceError::TenantNotFound(_)
        | CalendarServiceError::YearNotFound(_)
        | CalendarServiceError::TermNotFound(_) => ApiResponse::failure(404, err.to_string()),
        CalendarServiceError::Validation(_) | CalendarServiceError::Rule(_) => {
            ApiResponse::failure(400, err.to_string())
        }
        CalendarServiceError::Repo(_) | CalendarServiceError::InconsistentState(_) => {
            system_failure("calendar_storage", &err)
        }
    }
}

fn system_failure(context: &str, err: &dyn Display) -> ApiResponse {
    error!("event=api_error module=api status=error context={context} error={err}");
    ApiResponse::failure(500, GENERIC_SYSTEM_ERROR)
}

#[cfg(test)]
mod tests {
    use super::ApiResponse;
    use serde_json::json;

    #[test]
    fn success_envelope_wraps_data() {
        let response = ApiResponse::success(200, json!([1, 2, 3]));
        assert_eq!(response.status, 200);
        assert_eq!(response.body["success"], json!(true));
        assert_eq!(response.body["data"], json!([1, 2, 3]));
    }

    #[test]
    fn failure_envelope_carries_only_the_message() {
        let response = ApiResponse::failure(403, "denied");
        assert_eq!(response.status, 403);
        assert_eq!(response.body, json!({ "error": "denied" }));
        assert!(response.body.get("success").is_none());
    }
}
