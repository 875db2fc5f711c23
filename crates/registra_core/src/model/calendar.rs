//! Calendar period domain model.
//!
//! # Responsibility
//! - Define the canonical academic year and term records.
//! - Validate structural fields (names, ISO date format) before writes.
//!
//! # Invariants
//! - Dates are zero-padded `YYYY-MM-DD` strings, so lexicographic order is
//!   chronological order. The rule engine's interval algebra relies on this.
//! - `validate()` covers shape only; range order, overlap and containment
//!   are rule-engine concerns evaluated inside the write transaction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a tenant.
pub type TenantId = Uuid;
/// Stable identifier for an academic year.
pub type YearId = Uuid;
/// Stable identifier for a term.
pub type TermId = Uuid;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid iso date regex"));

/// Tenant record: the isolation boundary grouping one institution's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Stable tenant ID.
    pub id: TenantId,
    /// Display name of the institution.
    pub name: String,
}

/// Academic year record.
///
/// Within one tenant, year ranges never overlap and at most one year is
/// flagged current at any observable instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYear {
    /// Stable year ID.
    pub id: YearId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name, e.g. `2024/2025`.
    pub name: String,
    /// Inclusive range start, `YYYY-MM-DD`.
    pub start_date: String,
    /// Inclusive range end, `YYYY-MM-DD`.
    pub end_date: String,
    /// At most one year per tenant carries this flag.
    pub is_current: bool,
    /// Administrative close-out flag; blocks mutation and deletion.
    pub is_locked: bool,
}

impl AcademicYear {
    /// Creates a new unlocked academic year with a generated stable ID.
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            is_current: false,
            is_locked: false,
        }
    }

    /// Validates structural fields.
    ///
    /// # Errors
    /// - `EmptyName` when the display name is blank after trim.
    /// - `InvalidDate` when a date is not a valid `YYYY-MM-DD` calendar day.
    pub fn validate(&self) -> Result<(), CalendarValidationError> {
        validate_name(&self.name)?;
        validate_date("start_date", &self.start_date)?;
        validate_date("end_date", &self.end_date)?;
        Ok(())
    }
}

/// Term record: a subdivision of one academic year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Stable term ID.
    pub id: TermId,
    /// Parent academic year.
    pub academic_year_id: YearId,
    /// Display name, e.g. `Autumn term`.
    pub name: String,
    /// Inclusive range start, `YYYY-MM-DD`.
    pub start_date: String,
    /// Inclusive range end, `YYYY-MM-DD`.
    pub end_date: String,
    /// Administrative close-out flag; the parent year's flag also applies.
    pub is_locked: bool,
}

impl Term {
    /// Creates a new unlocked term with a generated stable ID.
    pub fn new(
        academic_year_id: YearId,
        name: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            academic_year_id,
            name: name.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            is_locked: false,
        }
    }

    /// Validates structural fields; same rules as [`AcademicYear::validate`].
    pub fn validate(&self) -> Result<(), CalendarValidationError> {
        validate_name(&self.name)?;
        validate_date("start_date", &self.start_date)?;
        validate_date("end_date", &self.end_date)?;
        Ok(())
    }
}

/// Structural validation errors for calendar entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarValidationError {
    /// Display name is blank after trim.
    EmptyName,
    /// Date field is not a valid `YYYY-MM-DD` calendar day.
    InvalidDate { field: &'static str, value: String },
}

impl Display for CalendarValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "display name must not be blank"),
            Self::InvalidDate { field, value } => {
                write!(f, "{field} is not a valid ISO date: `{value}`")
            }
        }
    }
}

impl Error for CalendarValidationError {}

fn validate_name(name: &str) -> Result<(), CalendarValidationError> {
    if name.trim().is_empty() {
        return Err(CalendarValidationError::EmptyName);
    }
    Ok(())
}

fn validate_date(field: &'static str, value: &str) -> Result<(), CalendarValidationError> {
    if is_valid_date(value) {
        Ok(())
    } else {
        Err(CalendarValidationError::InvalidDate {
            field,
            value: value.to_string(),
        })
    }
}

/// Returns whether `value` is a zero-padded `YYYY-MM-DD` calendar day.
pub fn is_valid_date(value: &str) -> bool {
    let Some(caps) = ISO_DATE_RE.captures(value) else {
        return false;
    };
    let year: i32 = caps[1].parse().unwrap_or(0);
    let month: u32 = caps[2].parse().unwrap_or(0);
    let day: u32 = caps[3].parse().unwrap_or(0);

    if !(1..=12).contains(&month) {
        return false;
    }
    day >= 1 && day <= days_in_month(year, month)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
