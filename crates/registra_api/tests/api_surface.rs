use registra_api::{
    create_term, create_year, delete_year, list_terms, list_years, lock_term, lock_year,
    unlock_year, update_year, RequestContext,
};
use registra_core::db::open_db_in_memory;
use registra_core::{CreateTermRequest, CreateYearRequest, Role, UpdateYearRequest};
use rusqlite::{params, Connection};
use serde_json::Value;
use uuid::Uuid;

fn seed_tenant(conn: &Connection) -> Uuid {
    let tenant_uuid = Uuid::new_v4();
    conn.execute(
        "INSERT INTO tenants (tenant_uuid, display_name) VALUES (?1, ?2);",
        params![tenant_uuid.to_string(), "Springfield High"],
    )
    .expect("seed tenant");
    tenant_uuid
}

fn seed_actor(conn: &Connection, external_identity_id: &str, role: Role) {
    conn.execute(
        "INSERT INTO actors (actor_uuid, external_identity_id, role) VALUES (?1, ?2, ?3);",
        params![
            Uuid::new_v4().to_string(),
            external_identity_id,
            role.as_str()
        ],
    )
    .expect("seed actor");
}

fn admin_ctx(conn: &Connection) -> RequestContext {
    seed_actor(conn, "idp|admin", Role::Admin);
    RequestContext::for_identity("idp|admin")
}

fn year_payload(tenant: Uuid, name: &str, start: &str, end: &str) -> CreateYearRequest {
    CreateYearRequest {
        tenant_id: tenant,
        name: name.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        is_current: false,
    }
}

fn created_id(body: &Value) -> String {
    body["data"]["id"]
        .as_str()
        .expect("created entity id")
        .to_string()
}

#[test]
fn anonymous_requests_are_unauthenticated() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);

    let response = list_years(&conn, &RequestContext::anonymous(), &tenant.to_string());
    assert_eq!(response.status, 401);
    assert!(response.body["error"].is_string());
    assert!(response.body.get("success").is_none());
}

#[test]
fn unknown_identities_are_unauthenticated() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);
    seed_actor(&conn, "idp|admin", Role::Admin);

    let response = list_years(
        &conn,
        &RequestContext::for_identity("idp|mallory"),
        &tenant.to_string(),
    );
    assert_eq!(response.status, 401);
}

#[test]
fn role_gate_runs_before_any_resource_lookup() {
    let conn = open_db_in_memory().unwrap();
    seed_actor(&conn, "idp|student", Role::Student);
    let ctx = RequestContext::for_identity("idp|student");

    // A forbidden caller learns nothing about the (nonexistent) resource:
    // the gate answers 403 before ids are even parsed.
    let response = delete_year(&conn, &ctx, "not-a-uuid");
    assert_eq!(response.status, 403);
    let message = response.body["error"].as_str().unwrap();
    assert!(message.contains("student"));
    assert!(!message.contains("not found"));
}

#[test]
fn teacher_may_list_but_not_mutate() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);
    seed_actor(&conn, "idp|teacher", Role::Teacher);
    let ctx = RequestContext::for_identity("idp|teacher");

    let listed = list_years(&conn, &ctx, &tenant.to_string());
    assert_eq!(listed.status, 200);
    assert_eq!(listed.body["success"], Value::Bool(true));

    let denied = create_year(
        &conn,
        &ctx,
        &year_payload(tenant, "2024/2025", "2024-09-01", "2025-06-30"),
    );
    assert_eq!(denied.status, 403);
}

#[test]
fn admin_creates_and_lists_years() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);
    let ctx = admin_ctx(&conn);

    let created = create_year(
        &conn,
        &ctx,
        &year_payload(tenant, "2024/2025", "2024-09-01", "2025-06-30"),
    );
    assert_eq!(created.status, 201);
    assert_eq!(created.body["success"], Value::Bool(true));
    assert_eq!(created.body["data"]["name"], "2024/2025");
    assert_eq!(created.body["data"]["is_locked"], Value::Bool(false));

    let listed = list_years(&conn, &ctx, &tenant.to_string());
    assert_eq!(listed.status, 200);
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);
}

#[test]
fn overlap_failures_return_the_rule_message_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);
    let ctx = admin_ctx(&conn);

    let first = create_year(
        &conn,
        &ctx,
        &CreateYearRequest {
            is_current: true,
            ..year_payload(tenant, "2024/2025", "2024-09-01", "2025-06-30")
        },
    );
    assert_eq!(first.status, 201);

    let second = create_year(
        &conn,
        &ctx,
        &year_payload(tenant, "calendar 2025", "2025-01-01", "2025-12-31"),
    );
    assert_eq!(second.status, 400);
    let message = second.body["error"].as_str().unwrap();
    assert!(message.contains("calendar 2025"));
    assert!(message.contains("overlaps"));
    assert!(message.contains("2024/2025"));
}

#[test]
fn invalid_ids_and_missing_entities_are_distinct_failures() {
    let conn = open_db_in_memory().unwrap();
    let ctx = admin_ctx(&conn);

    let bad_id = lock_year(&conn, &ctx, "not-a-uuid");
    assert_eq!(bad_id.status, 400);

    let missing = lock_year(&conn, &ctx, &Uuid::new_v4().to_string());
    assert_eq!(missing.status, 404);

    let missing_terms = list_terms(&conn, &ctx, &Uuid::new_v4().to_string());
    assert_eq!(missing_terms.status, 404);
}

#[test]
fn update_flips_the_current_flag_exclusively() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);
    let ctx = admin_ctx(&conn);

    let year_a = create_year(
        &conn,
        &ctx,
        &CreateYearRequest {
            is_current: true,
            ..year_payload(tenant, "2023/2024", "2023-09-01", "2024-06-30")
        },
    );
    assert_eq!(year_a.status, 201);
    let year_b = create_year(
        &conn,
        &ctx,
        &year_payload(tenant, "2024/2025", "2024-09-01", "2025-06-30"),
    );
    let id_b = created_id(&year_b.body);

    let updated = update_year(
        &conn,
        &ctx,
        &id_b,
        &UpdateYearRequest {
            name: "2024/2025".to_string(),
            start_date: "2024-09-01".to_string(),
            end_date: "2025-06-30".to_string(),
            is_current: true,
        },
    );
    assert_eq!(updated.status, 200);
    assert_eq!(updated.body["data"]["is_current"], Value::Bool(true));

    let listed = list_years(&conn, &ctx, &tenant.to_string());
    let years = listed.body["data"].as_array().unwrap();
    let current: Vec<_> = years
        .iter()
        .filter(|year| year["is_current"] == Value::Bool(true))
        .collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["id"].as_str().unwrap(), id_b);
}

#[test]
fn locked_year_surfaces_as_a_validation_failure() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);
    let ctx = admin_ctx(&conn);

    let created = create_year(
        &conn,
        &ctx,
        &year_payload(tenant, "2024/2025", "2024-09-01", "2025-06-30"),
    );
    let year_id = created_id(&created.body);

    let locked = lock_year(&conn, &ctx, &year_id);
    assert_eq!(locked.status, 200);
    assert_eq!(locked.body["data"]["is_locked"], Value::Bool(true));

    let denied = update_year(
        &conn,
        &ctx,
        &year_id,
        &UpdateYearRequest {
            name: "X".to_string(),
            start_date: "2024-09-01".to_string(),
            end_date: "2025-06-30".to_string(),
            is_current: false,
        },
    );
    assert_eq!(denied.status, 400);
    assert!(denied.body["error"].as_str().unwrap().contains("locked"));

    let unlocked = unlock_year(&conn, &ctx, &year_id);
    assert_eq!(unlocked.status, 200);
    assert_eq!(unlocked.body["data"]["is_locked"], Value::Bool(false));
}

#[test]
fn term_flow_covers_create_list_lock_and_containment() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);
    let ctx = admin_ctx(&conn);

    let year = create_year(
        &conn,
        &ctx,
        &year_payload(tenant, "2024/2025", "2024-09-01", "2025-06-30"),
    );
    let year_id = created_id(&year.body);
    let year_uuid = Uuid::parse_str(&year_id).unwrap();

    let term = create_term(
        &conn,
        &ctx,
        &CreateTermRequest {
            academic_year_id: year_uuid,
            name: "Autumn term".to_string(),
            start_date: "2024-09-01".to_string(),
            end_date: "2024-12-20".to_string(),
        },
    );
    assert_eq!(term.status, 201);
    let term_id = created_id(&term.body);

    let out_of_bounds = create_term(
        &conn,
        &ctx,
        &CreateTermRequest {
            academic_year_id: year_uuid,
            name: "Summer school".to_string(),
            start_date: "2024-08-01".to_string(),
            end_date: "2024-09-15".to_string(),
        },
    );
    assert_eq!(out_of_bounds.status, 400);
    assert!(out_of_bounds.body["error"]
        .as_str()
        .unwrap()
        .contains("outside academic year"));

    let listed = list_terms(&conn, &ctx, &year_id);
    assert_eq!(listed.status, 200);
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let locked = lock_term(&conn, &ctx, &term_id);
    assert_eq!(locked.status, 200);
    assert_eq!(locked.body["data"]["is_locked"], Value::Bool(true));
}

#[test]
fn delete_year_returns_no_content_and_removes_terms() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);
    let ctx = admin_ctx(&conn);

    let year = create_year(
        &conn,
        &ctx,
        &year_payload(tenant, "2024/2025", "2024-09-01", "2025-06-30"),
    );
    let year_id = created_id(&year.body);
    let year_uuid = Uuid::parse_str(&year_id).unwrap();

    create_term(
        &conn,
        &ctx,
        &CreateTermRequest {
            academic_year_id: year_uuid,
            name: "Autumn term".to_string(),
            start_date: "2024-09-01".to_string(),
            end_date: "2024-12-20".to_string(),
        },
    );

    let deleted = delete_year(&conn, &ctx, &year_id);
    assert_eq!(deleted.status, 204);
    assert_eq!(deleted.body["success"], Value::Bool(true));

    let listed = list_years(&conn, &ctx, &tenant.to_string());
    assert!(listed.body["data"].as_array().unwrap().is_empty());

    let orphan_terms = list_terms(&conn, &ctx, &year_id);
    assert_eq!(orphan_terms.status, 404);
}

#[test]
fn storage_failures_are_replaced_with_a_generic_message() {
    let conn = open_db_in_memory().unwrap();
    let tenant = seed_tenant(&conn);
    let ctx = admin_ctx(&conn);

    conn.execute_batch("DROP TABLE academic_years;")
        .expect("sabotage storage");

    let response = list_years(&conn, &ctx, &tenant.to_string());
    assert_eq!(response.status, 500);
    assert_eq!(response.body["error"], "internal storage error");
}
