//! Two independent writers racing to flag different years current must
//! leave exactly one current year for the tenant.

use registra_core::db::open_db;
use registra_core::{AcademicYear, SqliteYearRepository, YearRepository, YearUpdate};
use rusqlite::params;
use std::path::PathBuf;
use std::thread;
use uuid::Uuid;

fn set_current(db_path: PathBuf, year: AcademicYear) {
    let conn = open_db(&db_path).expect("writer connection");
    let repo = SqliteYearRepository::new(&conn);
    repo.update_year(
        year.id,
        &YearUpdate {
            name: year.name.clone(),
            start_date: year.start_date.clone(),
            end_date: year.end_date.clone(),
            is_current: true,
        },
    )
    .expect("set-current write should serialize, not fail");
}

#[test]
fn concurrent_set_current_writers_leave_exactly_one_current_year() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("registra.sqlite3");

    let tenant = Uuid::new_v4();
    let year_a;
    let year_b;
    {
        let conn = open_db(&db_path).expect("seed connection");
        conn.execute(
            "INSERT INTO tenants (tenant_uuid, display_name) VALUES (?1, ?2);",
            params![tenant.to_string(), "Springfield High"],
        )
        .expect("seed tenant");

        let repo = SqliteYearRepository::new(&conn);
        year_a = AcademicYear::new(tenant, "2023/2024", "2023-09-01", "2024-06-30");
        repo.create_year(&year_a).expect("seed year A");
        year_b = AcademicYear::new(tenant, "2024/2025", "2024-09-01", "2025-06-30");
        repo.create_year(&year_b).expect("seed year B");
    }

    let path_a = db_path.clone();
    let path_b = db_path.clone();
    let thread_a = thread::spawn({
        let year = year_a.clone();
        move || set_current(path_a, year)
    });
    let thread_b = thread::spawn({
        let year = year_b.clone();
        move || set_current(path_b, year)
    });
    thread_a.join().expect("writer A");
    thread_b.join().expect("writer B");

    let conn = open_db(&db_path).expect("verify connection");
    let repo = SqliteYearRepository::new(&conn);
    let current: Vec<_> = repo
        .list_years(tenant)
        .expect("list years")
        .into_iter()
        .filter(|year| year.is_current)
        .collect();

    assert_eq!(
        current.len(),
        1,
        "exactly one year must be current after both writers commit"
    );
    assert!(current[0].id == year_a.id || current[0].id == year_b.id);
}

#[test]
fn sequential_set_current_is_last_writer_wins() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("registra.sqlite3");

    let tenant = Uuid::new_v4();
    let conn = open_db(&db_path).expect("connection");
    conn.execute(
        "INSERT INTO tenants (tenant_uuid, display_name) VALUES (?1, ?2);",
        params![tenant.to_string(), "Springfield High"],
    )
    .expect("seed tenant");

    let repo = SqliteYearRepository::new(&conn);
    let year_a = AcademicYear::new(tenant, "2023/2024", "2023-09-01", "2024-06-30");
    repo.create_year(&year_a).unwrap();
    let year_b = AcademicYear::new(tenant, "2024/2025", "2024-09-01", "2025-06-30");
    repo.create_year(&year_b).unwrap();

    set_current(db_path.clone(), year_a.clone());
    set_current(db_path.clone(), year_b.clone());

    let listed = repo.list_years(tenant).unwrap();
    let current: Vec<_> = listed.iter().filter(|year| year.is_current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, year_b.id);
}
