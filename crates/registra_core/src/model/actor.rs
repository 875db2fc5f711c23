//! Actor identity and role model.
//!
//! # Responsibility
//! - Define the closed role set used by the authorization gate.
//! - Map between stable role codes in storage and the `Role` enum.
//!
//! # Invariants
//! - Role codes are lowercase and stable; unknown codes are rejected on
//!   read instead of being coerced.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for an actor known to the user directory.
pub type ActorId = Uuid;

/// Closed role set for request authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Institution administrator; may mutate calendar entities.
    Admin,
    /// Teaching staff; read access to calendar entities.
    Teacher,
    /// Enrolled student.
    Student,
    /// Parent or guardian linked to one or more students.
    Parent,
}

/// Stable storage code for the admin role.
pub const ROLE_ADMIN: &str = "admin";
/// Stable storage code for the teacher role.
pub const ROLE_TEACHER: &str = "teacher";
/// Stable storage code for the student role.
pub const ROLE_STUDENT: &str = "student";
/// Stable storage code for the parent role.
pub const ROLE_PARENT: &str = "parent";

impl Role {
    /// Stable string code used in the actors table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Teacher => ROLE_TEACHER,
            Self::Student => ROLE_STUDENT,
            Self::Parent => ROLE_PARENT,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses one role from its stable storage code.
pub fn parse_role(value: &str) -> Result<Role, RoleParseError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(RoleParseError::EmptyRole);
    }

    match normalized {
        ROLE_ADMIN => Ok(Role::Admin),
        ROLE_TEACHER => Ok(Role::Teacher),
        ROLE_STUDENT => Ok(Role::Student),
        ROLE_PARENT => Ok(Role::Parent),
        other => Err(RoleParseError::UnknownRole(other.to_string())),
    }
}

/// Role parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleParseError {
    EmptyRole,
    UnknownRole(String),
}

impl Display for RoleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRole => write!(f, "role value must not be empty"),
            Self::UnknownRole(value) => write!(f, "role is unknown: {value}"),
        }
    }
}

impl Error for RoleParseError {}

/// Actor resolved through the user directory.
///
/// Ownership relations (teacher-class, parent-student, student-record) are
/// externally stored facts consulted by the ownership verifier; they are
/// not fields of the actor itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable internal actor ID.
    pub id: ActorId,
    /// Opaque identity-provider subject this actor maps to.
    pub external_identity_id: String,
    /// Role consulted by the authorization gate.
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::{parse_role, Role, RoleParseError};

    #[test]
    fn parses_all_known_roles() {
        assert_eq!(parse_role("admin").expect("admin parse"), Role::Admin);
        assert_eq!(parse_role("teacher").expect("teacher parse"), Role::Teacher);
        assert_eq!(parse_role("student").expect("student parse"), Role::Student);
        assert_eq!(parse_role("parent").expect("parent parse"), Role::Parent);
    }

    #[test]
    fn rejects_empty_role() {
        let err = parse_role("   ").expect_err("empty role must fail");
        assert_eq!(err, RoleParseError::EmptyRole);
    }

    #[test]
    fn rejects_unknown_role() {
        let err = parse_role("principal").expect_err("unknown role must fail");
        assert_eq!(err, RoleParseError::UnknownRole("principal".to_string()));
    }

    #[test]
    fn rejects_non_lowercase_role_codes() {
        let err = parse_role("Admin").expect_err("capitalized role must fail");
        assert_eq!(err, RoleParseError::UnknownRole("Admin".to_string()));
    }

    #[test]
    fn role_codes_round_trip() {
        for role in [Role::Admin, Role::Teacher, Role::Student, Role::Parent] {
            assert_eq!(parse_role(role.as_str()).expect("round trip"), role);
        }
    }
}
