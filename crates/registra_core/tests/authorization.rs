use registra_core::db::open_db_in_memory;
use registra_core::{
    can_access, resolve_actor, Actor, DirectoryError, OwnershipVerifier, RelationKind, Role,
    SqliteOwnershipVerifier,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn seed_actor(conn: &Connection, external_identity_id: &str, role: Role) -> Uuid {
    let actor_uuid = Uuid::new_v4();
    conn.execute(
        "INSERT INTO actors (actor_uuid, external_identity_id, role) VALUES (?1, ?2, ?3);",
        params![actor_uuid.to_string(), external_identity_id, role.as_str()],
    )
    .expect("seed actor");
    actor_uuid
}

fn actor(id: Uuid, role: Role) -> Actor {
    Actor {
        id,
        external_identity_id: "unused".to_string(),
        role,
    }
}

#[test]
fn resolve_actor_maps_external_identity_to_role() {
    let conn = open_db_in_memory().unwrap();
    let actor_id = seed_actor(&conn, "idp|alice", Role::Admin);

    let resolved = resolve_actor(&conn, "idp|alice")
        .unwrap()
        .expect("known identity should resolve");
    assert_eq!(resolved.id, actor_id);
    assert_eq!(resolved.role, Role::Admin);
    assert_eq!(resolved.external_identity_id, "idp|alice");
}

#[test]
fn resolve_actor_returns_none_for_unknown_identity() {
    let conn = open_db_in_memory().unwrap();
    seed_actor(&conn, "idp|alice", Role::Admin);

    assert!(resolve_actor(&conn, "idp|mallory").unwrap().is_none());
}

#[test]
fn resolve_actor_rejects_corrupted_role_codes() {
    let conn = open_db_in_memory().unwrap();
    // Bypass the CHECK constraint to simulate corrupted persisted state.
    conn.execute_batch(&format!(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO actors (actor_uuid, external_identity_id, role)
         VALUES ('{}', 'idp|broken', 'superuser');
         PRAGMA ignore_check_constraints = OFF;",
        Uuid::new_v4()
    ))
    .expect("seed corrupted actor");

    let err = resolve_actor(&conn, "idp|broken").unwrap_err();
    assert!(matches!(err, DirectoryError::InvalidData(_)));
}

#[test]
fn each_relation_kind_checks_its_own_table() {
    let conn = open_db_in_memory().unwrap();
    let verifier = SqliteOwnershipVerifier::new(&conn);

    let teacher = Uuid::new_v4();
    let parent = Uuid::new_v4();
    let student = Uuid::new_v4();
    let class_uuid = Uuid::new_v4().to_string();
    let lesson_uuid = Uuid::new_v4().to_string();
    let record_uuid = Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO class_teachers (class_uuid, teacher_uuid) VALUES (?1, ?2);",
        params![class_uuid, teacher.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO lesson_teachers (lesson_uuid, teacher_uuid) VALUES (?1, ?2);",
        params![lesson_uuid, teacher.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO parent_students (parent_uuid, student_uuid) VALUES (?1, ?2);",
        params![parent.to_string(), student.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO class_students (class_uuid, student_uuid) VALUES (?1, ?2);",
        params![class_uuid, student.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO student_records (record_uuid, student_uuid) VALUES (?1, ?2);",
        params![record_uuid, student.to_string()],
    )
    .unwrap();

    assert!(verifier
        .verify(teacher, &class_uuid, RelationKind::TeacherSupervisesClass)
        .unwrap());
    assert!(verifier
        .verify(teacher, &lesson_uuid, RelationKind::TeacherOwnsLesson)
        .unwrap());
    assert!(verifier
        .verify(parent, &student.to_string(), RelationKind::ParentOwnsStudent)
        .unwrap());
    assert!(verifier
        .verify(student, &class_uuid, RelationKind::StudentInClass)
        .unwrap());
    assert!(verifier
        .verify(student, &record_uuid, RelationKind::StudentOwnsRecord)
        .unwrap());
}

#[test]
fn missing_relationship_and_missing_resource_are_indistinguishable() {
    let conn = open_db_in_memory().unwrap();
    let verifier = SqliteOwnershipVerifier::new(&conn);

    let teacher = Uuid::new_v4();
    let other_teacher = Uuid::new_v4();
    let class_uuid = Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO class_teachers (class_uuid, teacher_uuid) VALUES (?1, ?2);",
        params![class_uuid, teacher.to_string()],
    )
    .unwrap();

    // Existing class, no relationship.
    let unrelated = verifier
        .verify(other_teacher, &class_uuid, RelationKind::TeacherSupervisesClass)
        .unwrap();
    // No such class at all.
    let nonexistent = verifier
        .verify(
            other_teacher,
            &Uuid::new_v4().to_string(),
            RelationKind::TeacherSupervisesClass,
        )
        .unwrap();

    assert!(!unrelated);
    assert!(!nonexistent);
    assert_eq!(unrelated, nonexistent);
}

#[test]
fn relation_kinds_expose_stable_event_names() {
    let expected = [
        (RelationKind::TeacherOwnsLesson, "teacher_owns_lesson"),
        (RelationKind::TeacherSupervisesClass, "teacher_supervises_class"),
        (RelationKind::ParentOwnsStudent, "parent_owns_student"),
        (RelationKind::StudentOwnsRecord, "student_owns_record"),
        (RelationKind::StudentInClass, "student_in_class"),
    ];
    for (kind, name) in expected {
        assert_eq!(kind.as_str(), name);
        assert_eq!(kind.to_string(), name);
    }
}

#[test]
fn can_access_grants_admin_without_a_stored_relation() {
    let conn = open_db_in_memory().unwrap();
    let verifier = SqliteOwnershipVerifier::new(&conn);

    let admin = actor(Uuid::new_v4(), Role::Admin);
    let granted = can_access(
        &verifier,
        &admin,
        &Uuid::new_v4().to_string(),
        RelationKind::TeacherSupervisesClass,
    )
    .unwrap();
    assert!(granted);
}

#[test]
fn can_access_consults_the_relation_for_non_admin_roles() {
    let conn = open_db_in_memory().unwrap();
    let verifier = SqliteOwnershipVerifier::new(&conn);

    let teacher_id = Uuid::new_v4();
    let class_uuid = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO class_teachers (class_uuid, teacher_uuid) VALUES (?1, ?2);",
        params![class_uuid, teacher_id.to_string()],
    )
    .unwrap();

    let supervising = actor(teacher_id, Role::Teacher);
    assert!(can_access(
        &verifier,
        &supervising,
        &class_uuid,
        RelationKind::TeacherSupervisesClass
    )
    .unwrap());

    let stranger = actor(Uuid::new_v4(), Role::Teacher);
    assert!(!can_access(
        &verifier,
        &stranger,
        &class_uuid,
        RelationKind::TeacherSupervisesClass
    )
    .unwrap());
}
