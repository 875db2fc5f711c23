//! Calendar use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete/list/lock APIs for academic years and
//!   terms over the repository layer.
//! - Normalize request payloads and read written rows back for callers.
//!
//! # Invariants
//! - Display names are trimmed before persistence.
//! - Lock transitions only travel through the dedicated lock/unlock
//!   operations; update payloads cannot carry the flag.

use crate::model::calendar::{
    AcademicYear, CalendarValidationError, TenantId, Term, TermId, YearId,
};
use crate::repo::term_repo::{TermRepository, TermUpdate};
use crate::repo::year_repo::{RepoError, YearRepository, YearUpdate};
use crate::rules::RuleError;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for calendar use-cases.
#[derive(Debug)]
pub enum CalendarServiceError {
    /// Referenced tenant does not exist.
    TenantNotFound(TenantId),
    /// Referenced academic year does not exist.
    YearNotFound(YearId),
    /// Referenced term does not exist.
    TermNotFound(TermId),
    /// Structural payload failure (blank name, malformed date).
    Validation(CalendarValidationError),
    /// Business-rule failure from the calendar rule engine.
    Rule(RuleError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for CalendarServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TenantNotFound(id) => write!(f, "tenant not found: {id}"),
            Self::YearNotFound(id) => write!(f, "academic year not found: {id}"),
            Self::TermNotFound(id) => write!(f, "term not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Rule(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent calendar state: {details}"),
        }
    }
}

impl Error for CalendarServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Rule(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CalendarServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TenantNotFound(id) => Self::TenantNotFound(id),
            RepoError::YearNotFound(id) => Self::YearNotFound(id),
            RepoError::TermNotFound(id) => Self::TermNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Rule(err) => Self::Rule(err),
            other => Self::Repo(other),
        }
    }
}

/// Payload for creating an academic year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateYearRequest {
    pub tenant_id: TenantId,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub is_current: bool,
}

/// Full replacement payload for an academic year's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateYearRequest {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub is_current: bool,
}

/// Payload for creating a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTermRequest {
    pub academic_year_id: YearId,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

/// Full replacement payload for a term's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTermRequest {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

/// Calendar service facade over repository implementations.
pub struct CalendarService<Y: YearRepository, T: TermRepository> {
    years: Y,
    terms: T,
}

impl<Y: YearRepository, T: TermRepository> CalendarService<Y, T> {
    /// Creates a service using the provided repository implementations.
    pub fn new(years: Y, terms: T) -> Self {
        Self { years, terms }
    }

    /// Lists a tenant's academic years ordered by range start.
    pub fn list_years(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<AcademicYear>, CalendarServiceError> {
        Ok(self.years.list_years(tenant_id)?)
    }

    /// Creates one academic year through the rule engine.
    pub fn create_year(
        &self,
        request: &CreateYearRequest,
    ) -> Result<AcademicYear, CalendarServiceError> {
        let mut year = AcademicYear::new(
            request.tenant_id,
            request.name.trim(),
            request.start_date.as_str(),
            request.end_date.as_str(),
        );
        year.is_current = request.is_current;

        let year_uuid = self.years.create_year(&year)?;
        info!(
            "event=year_create module=calendar status=ok year={year_uuid} tenant={}",
            request.tenant_id
        );

        self.years
            .get_year(year_uuid)?
            .ok_or(CalendarServiceError::InconsistentState(
                "created year not found in read-back",
            ))
    }

    /// Replaces an academic year's mutable fields.
    pub fn update_year(
        &self,
        year_uuid: YearId,
        request: &UpdateYearRequest,
    ) -> Result<AcademicYear, CalendarServiceError> {
        self.years.update_year(
            year_uuid,
            &YearUpdate {
                name: request.name.trim().to_string(),
                start_date: request.start_date.clone(),
                end_date: request.end_date.clone(),
                is_current: request.is_current,
            },
        )?;
        info!("event=year_update module=calendar status=ok year={year_uuid}");

        self.years
            .get_year(year_uuid)?
            .ok_or(CalendarServiceError::InconsistentState(
                "updated year not found in read-back",
            ))
    }

    /// Deletes an academic year; its terms cascade.
    pub fn delete_year(&self, year_uuid: YearId) -> Result<(), CalendarServiceError> {
        self.years.delete_year(year_uuid)?;
        info!("event=year_delete module=calendar status=ok year={year_uuid}");
        Ok(())
    }

    /// Locks an academic year (administrative close-out).
    pub fn lock_year(&self, year_uuid: YearId) -> Result<AcademicYear, CalendarServiceError> {
        self.set_year_locked(year_uuid, true)
    }

    /// Explicitly unlocks an academic year.
    pub fn unlock_year(&self, year_uuid: YearId) -> Result<AcademicYear, CalendarServiceError> {
        self.set_year_locked(year_uuid, false)
    }

    fn set_year_locked(
        &self,
        year_uuid: YearId,
        locked: bool,
    ) -> Result<AcademicYear, CalendarServiceError> {
        self.years.set_year_locked(year_uuid, locked)?;
        info!("event=year_set_locked module=calendar status=ok year={year_uuid} locked={locked}");

        self.years
            .get_year(year_uuid)?
            .ok_or(CalendarServiceError::InconsistentState(
                "year not found after lock transition",
            ))
    }

    /// Lists one academic year's terms ordered by range start.
    pub fn list_terms(&self, year_uuid: YearId) -> Result<Vec<Term>, CalendarServiceError> {
        if self.years.get_year(year_uuid)?.is_none() {
            return Err(CalendarServiceError::YearNotFound(year_uuid));
        }
        Ok(self.terms.list_terms(year_uuid)?)
    }

    /// Creates one term through the rule engine.
    pub fn create_term(&self, request: &CreateTermRequest) -> Result<Term, CalendarServiceError> {
        let term = Term::new(
            request.academic_year_id,
            request.name.trim(),
            request.start_date.as_str(),
            request.end_date.as_str(),
        );

        let term_uuid = self.terms.create_term(&term)?;
        info!(
            "event=term_create module=calendar status=ok term={term_uuid} year={}",
            request.academic_year_id
        );

        self.terms
            .get_term(term_uuid)?
            .ok_or(CalendarServiceError::InconsistentState(
                "created term not found in read-back",
            ))
    }

    /// Replaces a term's mutable fields.
    pub fn update_term(
        &self,
        term_uuid: TermId,
        request: &UpdateTermRequest,
    ) -> Result<Term, CalendarServiceError> {
        self.terms.update_term(
            term_uuid,
            &TermUpdate {
                name: request.name.trim().to_string(),
                start_date: request.start_date.clone(),
                end_date: request.end_date.clone(),
            },
        )?;
        info!("event=term_update module=calendar status=ok term={term_uuid}");

        self.terms
            .get_term(term_uuid)?
            .ok_or(CalendarServiceError::InconsistentState(
                "updated term not found in read-back",
            ))
    }

    /// Deletes a term.
    pub fn delete_term(&self, term_uuid: TermId) -> Result<(), CalendarServiceError> {
        self.terms.delete_term(term_uuid)?;
        info!("event=term_delete module=calendar status=ok term={term_uuid}");
        Ok(())
    }

    /// Locks a term.
    pub fn lock_term(&self, term_uuid: TermId) -> Result<Term, CalendarServiceError> {
        self.set_term_locked(term_uuid, true)
    }

    /// Explicitly unlocks a term.
    pub fn unlock_term(&self, term_uuid: TermId) -> Result<Term, CalendarServiceError> {
        self.set_term_locked(term_uuid, false)
    }

    fn set_term_locked(
        &self,
        term_uuid: TermId,
        locked: bool,
    ) -> Result<Term, CalendarServiceError> {
        self.terms.set_term_locked(term_uuid, locked)?;
        info!("event=term_set_locked module=calendar status=ok term={term_uuid} locked={locked}");

        self.terms
            .get_term(term_uuid)?
            .ok_or(CalendarServiceError::InconsistentState(
                "term not found after lock transition",
            ))
    }
}
