//! Term repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and lock-transition APIs over `terms` storage.
//! - Enforce containment in the parent year and non-overlap among sibling
//!   terms inside the write transaction.
//!
//! # Invariants
//! - Rule ordering for writes: date range, lock guard (target, then parent
//!   year), containment, overlap detection, persist.
//! - Locks cascade downward: a locked parent year blocks every term write
//!   even when the term's own flag is clear.

use crate::db::UnitOfWork;
use crate::model::calendar::{AcademicYear, Term, TermId, YearId};
use crate::repo::year_repo::{
    bool_to_int, int_to_bool, load_year, year_label, RepoError, RepoResult,
};
use crate::rules::{check_range, range_contains, ranges_overlap, RuleError};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const TERM_SELECT_SQL: &str = "SELECT
    term_uuid,
    year_uuid,
    display_name,
    start_date,
    end_date,
    is_locked
FROM terms";

/// Full replacement of a term's mutable fields.
///
/// The lock flag is deliberately absent; lock transitions go through
/// [`TermRepository::set_term_locked`] only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermUpdate {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

/// Repository interface for term operations.
pub trait TermRepository {
    fn create_term(&self, term: &Term) -> RepoResult<TermId>;
    fn update_term(&self, term_uuid: TermId, changes: &TermUpdate) -> RepoResult<()>;
    fn delete_term(&self, term_uuid: TermId) -> RepoResult<()>;
    fn get_term(&self, term_uuid: TermId) -> RepoResult<Option<Term>>;
    fn list_terms(&self, year_uuid: YearId) -> RepoResult<Vec<Term>>;
    fn set_term_locked(&self, term_uuid: TermId, locked: bool) -> RepoResult<()>;
}

/// SQLite-backed term repository.
pub struct SqliteTermRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTermRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TermRepository for SqliteTermRepository<'_> {
    fn create_term(&self, term: &Term) -> RepoResult<TermId> {
        term.validate()?;

        UnitOfWork::new(self.conn).run(|tx| {
            check_range(&term_label(&term.name), &term.start_date, &term.end_date)?;

            let parent = load_year(tx, term.academic_year_id)?
                .ok_or(RepoError::YearNotFound(term.academic_year_id))?;
            ensure_parent_unlocked(&parent)?;
            ensure_contained(&parent, &term.name, &term.start_date, &term.end_date)?;

            if let Some(other) = overlapping_term(
                tx,
                term.academic_year_id,
                &term.start_date,
                &term.end_date,
                None,
            )? {
                return Err(RepoError::Rule(RuleError::Overlap {
                    entity: term_label(&term.name),
                    other: term_label(&other.name),
                }));
            }

            tx.execute(
                "INSERT INTO terms (
                    term_uuid,
                    year_uuid,
                    display_name,
                    start_date,
                    end_date,
                    is_locked
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    term.id.to_string(),
                    term.academic_year_id.to_string(),
                    term.name.as_str(),
                    term.start_date.as_str(),
                    term.end_date.as_str(),
                    bool_to_int(term.is_locked),
                ],
            )?;

            Ok(term.id)
        })
    }

    fn update_term(&self, term_uuid: TermId, changes: &TermUpdate) -> RepoResult<()> {
        UnitOfWork::new(self.conn).run(|tx| {
            let existing = load_term(tx, term_uuid)?.ok_or(RepoError::TermNotFound(term_uuid))?;

            let candidate = Term {
                name: changes.name.clone(),
                start_date: changes.start_date.clone(),
                end_date: changes.end_date.clone(),
                ..existing.clone()
            };
            candidate.validate()?;
            check_range(
                &term_label(&candidate.name),
                &candidate.start_date,
                &candidate.end_date,
            )?;

            if existing.is_locked {
                return Err(RepoError::Rule(RuleError::Locked {
                    entity: term_label(&existing.name),
                }));
            }

            let parent = load_year(tx, existing.academic_year_id)?
                .ok_or(RepoError::YearNotFound(existing.academic_year_id))?;
            ensure_parent_unlocked(&parent)?;
            ensure_contained(
                &parent,
                &candidate.name,
                &candidate.start_date,
                &candidate.end_date,
            )?;

            if let Some(other) = overlapping_term(
                tx,
                existing.academic_year_id,
                &candidate.start_date,
                &candidate.end_date,
                Some(term_uuid),
            )? {
                return Err(RepoError::Rule(RuleError::Overlap {
                    entity: term_label(&candidate.name),
                    other: term_label(&other.name),
                }));
            }

            tx.execute(
                "UPDATE terms
                 SET
                    display_name = ?2,
                    start_date = ?3,
                    end_date = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE term_uuid = ?1;",
                params![
                    term_uuid.to_string(),
                    candidate.name.as_str(),
                    candidate.start_date.as_str(),
                    candidate.end_date.as_str(),
                ],
            )?;

            Ok(())
        })
    }

    fn delete_term(&self, term_uuid: TermId) -> RepoResult<()> {
        UnitOfWork::new(self.conn).run(|tx| {
            let existing = load_term(tx, term_uuid)?.ok_or(RepoError::TermNotFound(term_uuid))?;

            if existing.is_locked {
                return Err(RepoError::Rule(RuleError::Locked {
                    entity: term_label(&existing.name),
                }));
            }

            let parent = load_year(tx, existing.academic_year_id)?
                .ok_or(RepoError::YearNotFound(existing.academic_year_id))?;
            ensure_parent_unlocked(&parent)?;

            tx.execute(
                "DELETE FROM terms WHERE term_uuid = ?1;",
                [term_uuid.to_string()],
            )?;

            Ok(())
        })
    }

    fn get_term(&self, term_uuid: TermId) -> RepoResult<Option<Term>> {
        load_term(self.conn, term_uuid)
    }

    fn list_terms(&self, year_uuid: YearId) -> RepoResult<Vec<Term>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TERM_SELECT_SQL}
             WHERE year_uuid = ?1
             ORDER BY start_date ASC, term_uuid ASC;"
        ))?;

        let mut rows = stmt.query([year_uuid.to_string()])?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            terms.push(parse_term_row(row)?);
        }

        Ok(terms)
    }

    fn set_term_locked(&self, term_uuid: TermId, locked: bool) -> RepoResult<()> {
        UnitOfWork::new(self.conn).run(|tx| {
            let existing = load_term(tx, term_uuid)?.ok_or(RepoError::TermNotFound(term_uuid))?;

            // A closed-out year freezes term lock state along with the rest
            // of the term.
            let parent = load_year(tx, existing.academic_year_id)?
                .ok_or(RepoError::YearNotFound(existing.academic_year_id))?;
            ensure_parent_unlocked(&parent)?;

            tx.execute(
                "UPDATE terms
                 SET
                    is_locked = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE term_uuid = ?1;",
                params![term_uuid.to_string(), bool_to_int(locked)],
            )?;

            Ok(())
        })
    }
}

fn load_term(conn: &Connection, term_uuid: TermId) -> RepoResult<Option<Term>> {
    let mut stmt = conn.prepare(&format!("{TERM_SELECT_SQL} WHERE term_uuid = ?1;"))?;
    let mut rows = stmt.query([term_uuid.to_string()])?;

    if let Some(row) = rows.next()? {
        return Ok(Some(parse_term_row(row)?));
    }

    Ok(None)
}

/// Finds the first sibling term of the same year intersecting the candidate.
///
/// Must be called inside the write's transaction so the sibling set is the
/// one the write will be applied against.
fn overlapping_term(
    conn: &Connection,
    year_uuid: YearId,
    start_date: &str,
    end_date: &str,
    exclude: Option<TermId>,
) -> RepoResult<Option<Term>> {
    let mut stmt = conn.prepare(&format!(
        "{TERM_SELECT_SQL}
         WHERE year_uuid = ?1
         ORDER BY start_date ASC, term_uuid ASC;"
    ))?;

    let mut rows = stmt.query([year_uuid.to_string()])?;
    while let Some(row) = rows.next()? {
        let sibling = parse_term_row(row)?;
        if Some(sibling.id) == exclude {
            continue;
        }
        if ranges_overlap(&sibling.start_date, &sibling.end_date, start_date, end_date) {
            return Ok(Some(sibling));
        }
    }

    Ok(None)
}

fn ensure_parent_unlocked(parent: &AcademicYear) -> RepoResult<()> {
    if parent.is_locked {
        return Err(RepoError::Rule(RuleError::Locked {
            entity: year_label(&parent.name),
        }));
    }
    Ok(())
}

fn ensure_contained(
    parent: &AcademicYear,
    term_name: &str,
    start_date: &str,
    end_date: &str,
) -> RepoResult<()> {
    if !range_contains(&parent.start_date, &parent.end_date, start_date, end_date) {
        return Err(RepoError::Rule(RuleError::OutOfBounds {
            term: term_label(term_name),
            year: year_label(&parent.name),
        }));
    }
    Ok(())
}

fn parse_term_row(row: &Row<'_>) -> RepoResult<Term> {
    let term_uuid: String = row.get("term_uuid")?;
    let id = Uuid::parse_str(&term_uuid).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{term_uuid}` in terms.term_uuid"))
    })?;

    let year_uuid: String = row.get("year_uuid")?;
    let academic_year_id = Uuid::parse_str(&year_uuid).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{year_uuid}` in terms.year_uuid"))
    })?;

    Ok(Term {
        id,
        academic_year_id,
        name: row.get("display_name")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        is_locked: int_to_bool(row.get("is_locked")?, "terms.is_locked")?,
    })
}

fn term_label(name: &str) -> String {
    format!("term `{name}`")
}
