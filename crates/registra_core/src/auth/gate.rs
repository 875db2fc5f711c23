//! Role-based authorization gate.
//!
//! # Responsibility
//! - Keep the per-operation required-role table in one place.
//! - Answer allow/deny for a resolved (or missing) actor role.
//!
//! # Invariants
//! - The gate runs before resource lookup; it must never touch storage.
//! - Role checks are not re-derived inline by handlers; this table is the
//!   single dispatch surface.

use crate::model::actor::Role;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const ADMIN_AND_TEACHER: &[Role] = &[Role::Admin, Role::Teacher];

/// Closed set of operations exposed by the core API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiAction {
    ListYears,
    CreateYear,
    UpdateYear,
    DeleteYear,
    LockYear,
    UnlockYear,
    ListTerms,
    CreateTerm,
    UpdateTerm,
    DeleteTerm,
    LockTerm,
    UnlockTerm,
}

impl ApiAction {
    /// Stable action name used in deny messages and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListYears => "year_list",
            Self::CreateYear => "year_create",
            Self::UpdateYear => "year_update",
            Self::DeleteYear => "year_delete",
            Self::LockYear => "year_lock",
            Self::UnlockYear => "year_unlock",
            Self::ListTerms => "term_list",
            Self::CreateTerm => "term_create",
            Self::UpdateTerm => "term_update",
            Self::DeleteTerm => "term_delete",
            Self::LockTerm => "term_lock",
            Self::UnlockTerm => "term_unlock",
        }
    }

    /// Static required-role set for this operation.
    pub fn required_roles(self) -> &'static [Role] {
        match self {
            Self::ListYears | Self::ListTerms => ADMIN_AND_TEACHER,
            Self::CreateYear
            | Self::UpdateYear
            | Self::DeleteYear
            | Self::LockYear
            | Self::UnlockYear
            | Self::CreateTerm
            | Self::UpdateTerm
            | Self::DeleteTerm
            | Self::LockTerm
            | Self::UnlockTerm => ADMIN_ONLY,
        }
    }
}

impl Display for ApiAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gate deny outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No actor identity is resolvable for the request.
    Unauthenticated,
    /// The actor's role is not in the operation's required set.
    Forbidden { action: &'static str, role: Role },
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no resolvable actor identity"),
            Self::Forbidden { action, role } => {
                write!(f, "role {role} is not permitted to perform {action}")
            }
        }
    }
}

impl Error for AuthError {}

/// Decides whether an actor role may perform `action`.
///
/// Pure predicate: consults only the static role table. `None` means the
/// request carried no resolvable actor.
pub fn authorize(role: Option<Role>, action: ApiAction) -> Result<(), AuthError> {
    let role = role.ok_or(AuthError::Unauthenticated)?;
    if action.required_roles().contains(&role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            action: action.as_str(),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{authorize, ApiAction, AuthError};
    use crate::model::actor::Role;

    const ALL_ACTIONS: &[ApiAction] = &[
        ApiAction::ListYears,
        ApiAction::CreateYear,
        ApiAction::UpdateYear,
        ApiAction::DeleteYear,
        ApiAction::LockYear,
        ApiAction::UnlockYear,
        ApiAction::ListTerms,
        ApiAction::CreateTerm,
        ApiAction::UpdateTerm,
        ApiAction::DeleteTerm,
        ApiAction::LockTerm,
        ApiAction::UnlockTerm,
    ];

    #[test]
    fn admin_may_perform_every_action() {
        for action in ALL_ACTIONS {
            authorize(Some(Role::Admin), *action).expect("admin should be allowed");
        }
    }

    #[test]
    fn teacher_may_only_list() {
        authorize(Some(Role::Teacher), ApiAction::ListYears).expect("teacher may list years");
        authorize(Some(Role::Teacher), ApiAction::ListTerms).expect("teacher may list terms");

        for action in ALL_ACTIONS {
            if matches!(*action, ApiAction::ListYears | ApiAction::ListTerms) {
                continue;
            }
            let err = authorize(Some(Role::Teacher), *action)
                .expect_err("teacher mutation must be denied");
            assert!(matches!(err, AuthError::Forbidden { .. }));
        }
    }

    #[test]
    fn student_and_parent_are_denied_everywhere() {
        for role in [Role::Student, Role::Parent] {
            for action in ALL_ACTIONS {
                let err =
                    authorize(Some(role), *action).expect_err("non-staff role must be denied");
                assert!(matches!(err, AuthError::Forbidden { .. }));
            }
        }
    }

    #[test]
    fn missing_identity_is_unauthenticated_not_forbidden() {
        for action in ALL_ACTIONS {
            let err = authorize(None, *action).expect_err("missing identity must be denied");
            assert_eq!(err, AuthError::Unauthenticated);
        }
    }

    #[test]
    fn deny_message_names_role_and_action() {
        let err = authorize(Some(Role::Student), ApiAction::CreateYear)
            .expect_err("student create must be denied");
        let message = err.to_string();
        assert!(message.contains("student"));
        assert!(message.contains("year_create"));
    }
}
