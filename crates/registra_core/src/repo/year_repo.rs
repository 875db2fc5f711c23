//! Academic year repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and lock-transition APIs over `academic_years` storage.
//! - Enforce the tenant-scoped overlap and single-current invariants
//!   inside the write transaction.
//!
//! # Invariants
//! - Rule ordering for writes: date range, lock guard, overlap detection,
//!   single-current enforcement, persist. Any failure aborts the unit.
//! - Sibling ranges are read from the same transaction the write applies
//!   to; a concurrent writer cannot slip between check and write.
//! - Setting one year current clears the flag on every other year of the
//!   tenant before the target row is written, so the storage-level unique
//!   index never observes two current rows.

use crate::db::{DbError, UnitOfWork};
use crate::model::calendar::{
    AcademicYear, CalendarValidationError, Tenant, TenantId, TermId, YearId,
};
use crate::rules::{check_range, ranges_overlap, RuleError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const YEAR_SELECT_SQL: &str = "SELECT
    year_uuid,
    tenant_uuid,
    display_name,
    start_date,
    end_date,
    is_current,
    is_locked
FROM academic_years";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for calendar persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CalendarValidationError),
    Rule(RuleError),
    Db(DbError),
    TenantNotFound(TenantId),
    YearNotFound(YearId),
    TermNotFound(TermId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Rule(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::TenantNotFound(id) => write!(f, "tenant not found: {id}"),
            Self::YearNotFound(id) => write!(f, "academic year not found: {id}"),
            Self::TermNotFound(id) => write!(f, "term not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted calendar data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Rule(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::TenantNotFound(_) | Self::YearNotFound(_) | Self::TermNotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<CalendarValidationError> for RepoError {
    fn from(value: CalendarValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RuleError> for RepoError {
    fn from(value: RuleError) -> Self {
        Self::Rule(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Full replacement of an academic year's mutable fields.
///
/// The lock flag is deliberately absent; lock transitions go through
/// [`YearRepository::set_year_locked`] only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearUpdate {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
}

/// Repository interface for academic year operations.
pub trait YearRepository {
    fn create_year(&self, year: &AcademicYear) -> RepoResult<YearId>;
    fn update_year(&self, year_uuid: YearId, changes: &YearUpdate) -> RepoResult<()>;
    fn delete_year(&self, year_uuid: YearId) -> RepoResult<()>;
    fn get_year(&self, year_uuid: YearId) -> RepoResult<Option<AcademicYear>>;
    fn list_years(&self, tenant_uuid: TenantId) -> RepoResult<Vec<AcademicYear>>;
    fn set_year_locked(&self, year_uuid: YearId, locked: bool) -> RepoResult<()>;
}

/// SQLite-backed academic year repository.
pub struct SqliteYearRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteYearRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl YearRepository for SqliteYearRepository<'_> {
    fn create_year(&self, year: &AcademicYear) -> RepoResult<YearId> {
        year.validate()?;

        UnitOfWork::new(self.conn).run(|tx| {
            check_range(&year_label(&year.name), &year.start_date, &year.end_date)?;
            load_tenant(tx, year.tenant_id)?;

            if let Some(other) =
                overlapping_year(tx, year.tenant_id, &year.start_date, &year.end_date, None)?
            {
                return Err(RepoError::Rule(RuleError::Overlap {
                    entity: year_label(&year.name),
                    other: year_label(&other.name),
                }));
            }

            if year.is_current {
                clear_current_years(tx, year.tenant_id, None)?;
            }

            tx.execute(
                "INSERT INTO academic_years (
                    year_uuid,
                    tenant_uuid,
                    display_name,
                    start_date,
                    end_date,
                    is_current,
                    is_locked
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    year.id.to_string(),
                    year.tenant_id.to_string(),
                    year.name.as_str(),
                    year.start_date.as_str(),
                    year.end_date.as_str(),
                    bool_to_int(year.is_current),
                    bool_to_int(year.is_locked),
                ],
            )?;

            Ok(year.id)
        })
    }

    fn update_year(&self, year_uuid: YearId, changes: &YearUpdate) -> RepoResult<()> {
        UnitOfWork::new(self.conn).run(|tx| {
            let existing = load_year(tx, year_uuid)?.ok_or(RepoError::YearNotFound(year_uuid))?;

            let candidate = AcademicYear {
                name: changes.name.clone(),
                start_date: changes.start_date.clone(),
                end_date: changes.end_date.clone(),
                is_current: changes.is_current,
                ..existing.clone()
            };
            candidate.validate()?;
            check_range(
                &year_label(&candidate.name),
                &candidate.start_date,
                &candidate.end_date,
            )?;

            if existing.is_locked {
                return Err(RepoError::Rule(RuleError::Locked {
                    entity: year_label(&existing.name),
                }));
            }

            if let Some(other) = overlapping_year(
                tx,
                existing.tenant_id,
                &candidate.start_date,
                &candidate.end_date,
                Some(year_uuid),
            )? {
                return Err(RepoError::Rule(RuleError::Overlap {
                    entity: year_label(&candidate.name),
                    other: year_label(&other.name),
                }));
            }

            if candidate.is_current {
                clear_current_years(tx, existing.tenant_id, Some(year_uuid))?;
            }

            tx.execute(
                "UPDATE academic_years
                 SET
                    display_name = ?2,
                    start_date = ?3,
                    end_date = ?4,
                    is_current = ?5,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE year_uuid = ?1;",
                params![
                    year_uuid.to_string(),
                    candidate.name.as_str(),
                    candidate.start_date.as_str(),
                    candidate.end_date.as_str(),
                    bool_to_int(candidate.is_current),
                ],
            )?;

            Ok(())
        })
    }

    fn delete_year(&self, year_uuid: YearId) -> RepoResult<()> {
        UnitOfWork::new(self.conn).run(|tx| {
            let existing = load_year(tx, year_uuid)?.ok_or(RepoError::YearNotFound(year_uuid))?;

            if existing.is_locked {
                return Err(RepoError::Rule(RuleError::Locked {
                    entity: year_label(&existing.name),
                }));
            }

            // Terms cascade through the foreign key; per-term lock flags
            // are not consulted on year close-out.
            tx.execute(
                "DELETE FROM academic_years WHERE year_uuid = ?1;",
                [year_uuid.to_string()],
            )?;

            Ok(())
        })
    }

    fn get_year(&self, year_uuid: YearId) -> RepoResult<Option<AcademicYear>> {
        load_year(self.conn, year_uuid)
    }

    fn list_years(&self, tenant_uuid: TenantId) -> RepoResult<Vec<AcademicYear>> {
        let mut stmt = self.conn.prepare(&format!(
            "{YEAR_SELECT_SQL}
             WHERE tenant_uuid = ?1
             ORDER BY start_date ASC, year_uuid ASC;"
        ))?;

        let mut rows = stmt.query([tenant_uuid.to_string()])?;
        let mut years = Vec::new();
        while let Some(row) = rows.next()? {
            years.push(parse_year_row(row)?);
        }

        Ok(years)
    }

    fn set_year_locked(&self, year_uuid: YearId, locked: bool) -> RepoResult<()> {
        UnitOfWork::new(self.conn).run(|tx| {
            if load_year(tx, year_uuid)?.is_none() {
                return Err(RepoError::YearNotFound(year_uuid));
            }

            tx.execute(
                "UPDATE academic_years
                 SET
                    is_locked = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE year_uuid = ?1;",
                params![year_uuid.to_string(), bool_to_int(locked)],
            )?;

            Ok(())
        })
    }
}

/// Loads one academic year by stable ID.
pub(crate) fn load_year(conn: &Connection, year_uuid: YearId) -> RepoResult<Option<AcademicYear>> {
    let mut stmt = conn.prepare(&format!("{YEAR_SELECT_SQL} WHERE year_uuid = ?1;"))?;
    let mut rows = stmt.query([year_uuid.to_string()])?;

    if let Some(row) = rows.next()? {
        return Ok(Some(parse_year_row(row)?));
    }

    Ok(None)
}

/// Finds the first sibling year whose range intersects the candidate.
///
/// Must be called inside the write's transaction so the sibling set is the
/// one the write will be applied against.
fn overlapping_year(
    conn: &Connection,
    tenant_uuid: TenantId,
    start_date: &str,
    end_date: &str,
    exclude: Option<YearId>,
) -> RepoResult<Option<AcademicYear>> {
    let mut stmt = conn.prepare(&format!(
        "{YEAR_SELECT_SQL}
         WHERE tenant_uuid = ?1
         ORDER BY start_date ASC, year_uuid ASC;"
    ))?;

    let mut rows = stmt.query([tenant_uuid.to_string()])?;
    while let Some(row) = rows.next()? {
        let sibling = parse_year_row(row)?;
        if Some(sibling.id) == exclude {
            continue;
        }
        if ranges_overlap(&sibling.start_date, &sibling.end_date, start_date, end_date) {
            return Ok(Some(sibling));
        }
    }

    Ok(None)
}

/// Clears the current flag on every year of the tenant except `keep`.
///
/// Runs before the target row is flagged, inside the same unit, so no
/// interleaving observes two current years or a transient duplicate in the
/// unique index.
fn clear_current_years(
    conn: &Connection,
    tenant_uuid: TenantId,
    keep: Option<YearId>,
) -> RepoResult<()> {
    conn.execute(
        "UPDATE academic_years
         SET
            is_current = 0,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE tenant_uuid = ?1
           AND is_current = 1
           AND (?2 IS NULL OR year_uuid <> ?2);",
        params![
            tenant_uuid.to_string(),
            keep.map(|value| value.to_string()),
        ],
    )?;
    Ok(())
}

fn load_tenant(conn: &Connection, tenant_uuid: TenantId) -> RepoResult<Tenant> {
    let name: Option<String> = conn
        .query_row(
            "SELECT display_name FROM tenants WHERE tenant_uuid = ?1;",
            [tenant_uuid.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match name {
        Some(name) => Ok(Tenant {
            id: tenant_uuid,
            name,
        }),
        None => Err(RepoError::TenantNotFound(tenant_uuid)),
    }
}

pub(crate) fn parse_year_row(row: &Row<'_>) -> RepoResult<AcademicYear> {
    let year_uuid: String = row.get("year_uuid")?;
    let id = Uuid::parse_str(&year_uuid).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{year_uuid}` in academic_years.year_uuid"
        ))
    })?;

    let tenant_uuid: String = row.get("tenant_uuid")?;
    let tenant_id = Uuid::parse_str(&tenant_uuid).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{tenant_uuid}` in academic_years.tenant_uuid"
        ))
    })?;

    Ok(AcademicYear {
        id,
        tenant_id,
        name: row.get("display_name")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        is_current: int_to_bool(row.get("is_current")?, "academic_years.is_current")?,
        is_locked: int_to_bool(row.get("is_locked")?, "academic_years.is_locked")?,
    })
}

pub(crate) fn year_label(name: &str) -> String {
    format!("academic year `{name}`")
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}
