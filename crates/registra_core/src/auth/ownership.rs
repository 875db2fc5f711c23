//! Ownership verification against externally stored relations.
//!
//! # Responsibility
//! - Answer whether a qualifying relationship exists between an actor and
//!   one specific resource instance.
//! - Keep each relation kind behind one targeted existence check.
//!
//! # Invariants
//! - `verify` never distinguishes "no relationship" from "no such
//!   resource"; both are `false`, so resource IDs cannot be enumerated.
//! - Relation tables are read-only to this module.

use crate::model::actor::{Actor, ActorId, Role};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Relational claim kinds consulted by access decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Teacher delivers the referenced lesson.
    TeacherOwnsLesson,
    /// Teacher supervises the referenced class.
    TeacherSupervisesClass,
    /// Parent is guardian of the referenced student.
    ParentOwnsStudent,
    /// Student is the subject of the referenced record.
    StudentOwnsRecord,
    /// Student is enrolled in the referenced class.
    StudentInClass,
}

impl RelationKind {
    /// Stable relation name used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TeacherOwnsLesson => "teacher_owns_lesson",
            Self::TeacherSupervisesClass => "teacher_supervises_class",
            Self::ParentOwnsStudent => "parent_owns_student",
            Self::StudentOwnsRecord => "student_owns_record",
            Self::StudentInClass => "student_in_class",
        }
    }
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ownership lookup errors.
#[derive(Debug)]
pub enum OwnershipError {
    Db(rusqlite::Error),
}

impl Display for OwnershipError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OwnershipError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for OwnershipError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(value)
    }
}

/// Verifies relational claims between actors and resource instances.
pub trait OwnershipVerifier {
    /// Returns whether the claimed relationship exists.
    fn verify(
        &self,
        actor_id: ActorId,
        resource_uuid: &str,
        relation: RelationKind,
    ) -> Result<bool, OwnershipError>;
}

/// SQLite-backed verifier reading the relation tables.
pub struct SqliteOwnershipVerifier<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOwnershipVerifier<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OwnershipVerifier for SqliteOwnershipVerifier<'_> {
    fn verify(
        &self,
        actor_id: ActorId,
        resource_uuid: &str,
        relation: RelationKind,
    ) -> Result<bool, OwnershipError> {
        let sql = match relation {
            RelationKind::TeacherOwnsLesson => {
                "SELECT EXISTS(
                    SELECT 1 FROM lesson_teachers
                    WHERE lesson_uuid = ?1 AND teacher_uuid = ?2
                );"
            }
            RelationKind::TeacherSupervisesClass => {
                "SELECT EXISTS(
                    SELECT 1 FROM class_teachers
                    WHERE class_uuid = ?1 AND teacher_uuid = ?2
                );"
            }
            RelationKind::ParentOwnsStudent => {
                "SELECT EXISTS(
                    SELECT 1 FROM parent_students
                    WHERE student_uuid = ?1 AND parent_uuid = ?2
                );"
            }
            RelationKind::StudentOwnsRecord => {
                "SELECT EXISTS(
                    SELECT 1 FROM student_records
                    WHERE record_uuid = ?1 AND student_uuid = ?2
                );"
            }
            RelationKind::StudentInClass => {
                "SELECT EXISTS(
                    SELECT 1 FROM class_students
                    WHERE class_uuid = ?1 AND student_uuid = ?2
                );"
            }
        };

        let exists: i64 = self
            .conn
            .query_row(sql, (resource_uuid, actor_id.to_string()), |row| {
                row.get(0)
            })?;
        Ok(exists == 1)
    }
}

/// Access decision facade composing role shortcuts with relation checks.
///
/// Admins hold every relational claim implicitly; other roles are checked
/// against the stored relation. The result is a bare boolean so callers
/// surface denial and nonexistence identically.
pub fn can_access<V: OwnershipVerifier>(
    verifier: &V,
    actor: &Actor,
    resource_uuid: &str,
    relation: RelationKind,
) -> Result<bool, OwnershipError> {
    if actor.role == Role::Admin {
        return Ok(true);
    }
    verifier.verify(actor.id, resource_uuid, relation)
}
