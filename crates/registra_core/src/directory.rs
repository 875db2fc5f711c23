//! User directory boundary.
//!
//! # Responsibility
//! - Map an opaque identity-provider subject to the internal actor record.
//! - Reject invalid persisted role codes instead of masking them.
//!
//! # Invariants
//! - Credential validation is the identity provider's job; the core only
//!   receives resolved external identity ids.
//! - An unknown identity resolves to `None`, which callers surface as
//!   `Unauthenticated`.

use crate::model::actor::{parse_role, Actor};
use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Directory lookup errors.
#[derive(Debug)]
pub enum DirectoryError {
    Db(rusqlite::Error),
    /// Persisted actor row carries data this binary cannot interpret.
    InvalidData(String),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted actor data: {message}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DirectoryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(value)
    }
}

/// Resolves an external identity to the internal actor, if any.
pub fn resolve_actor(
    conn: &Connection,
    external_identity_id: &str,
) -> Result<Option<Actor>, DirectoryError> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT actor_uuid, role
             FROM actors
             WHERE external_identity_id = ?1;",
            [external_identity_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((actor_uuid, role_code)) = row else {
        return Ok(None);
    };

    let id = Uuid::parse_str(&actor_uuid).map_err(|_| {
        DirectoryError::InvalidData(format!("invalid uuid value `{actor_uuid}` in actors.actor_uuid"))
    })?;
    let role = parse_role(&role_code).map_err(|_| {
        DirectoryError::InvalidData(format!("invalid role value `{role_code}` in actors.role"))
    })?;

    Ok(Some(Actor {
        id,
        external_identity_id: external_identity_id.to_string(),
        role,
    }))
}
