//! Context key: the (subject, period, search) tuple every page belongs to.
//!
//! Any change to any component of the key is a hard reset for pagination,
//! accumulation and the initial-load flag.

use chrono::{Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which kind of subject is being viewed. Carries the fold policy difference
/// between account statements and credit-card bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Statement,
    Bill,
}

/// How a page past the first is merged into the accumulated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldPolicy {
    /// Append new rows, then re-sort the whole list by date descending.
    ResortOnMerge,
    /// Append new rows in arrival order; pages are assumed pre-sorted server-side.
    AppendOnly,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Statement => "statement",
            SubjectKind::Bill => "bill",
        }
    }

    pub fn fold_policy(&self) -> FoldPolicy {
        match self {
            SubjectKind::Statement => FoldPolicy::ResortOnMerge,
            // Bills have never been re-sorted after page 1. Kept as is.
            SubjectKind::Bill => FoldPolicy::AppendOnly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("period must look like YYYY-MM, got '{0}'")]
    Format(String),
    #[error("month out of range in '{0}'")]
    Month(String),
    #[error("invalid timezone: {0}")]
    Timezone(String),
}

/// A calendar month. Displayed and parsed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::Month(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Current month in an IANA timezone like "America/Sao_Paulo".
    pub fn current_in(tz: &str) -> Result<Self, PeriodError> {
        let tz: Tz = tz
            .parse()
            .map_err(|_| PeriodError::Timezone(tz.to_string()))?;
        let today = Utc::now().with_timezone(&tz).date_naive();
        Self::new(today.year(), today.month())
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| PeriodError::Format(s.to_string()))?;
        if y.len() != 4 || m.len() != 2 {
            return Err(PeriodError::Format(s.to_string()));
        }
        let year: i32 = y.parse().map_err(|_| PeriodError::Format(s.to_string()))?;
        let month: u32 = m.parse().map_err(|_| PeriodError::Format(s.to_string()))?;
        Self::new(year, month).map_err(|_| PeriodError::Month(s.to_string()))
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.to_string()
    }
}

/// Unit of reset granularity for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextKey {
    pub kind: SubjectKind,
    pub subject_id: String,
    pub period: Period,
    pub search: Option<String>,
}

impl ContextKey {
    pub fn new(kind: SubjectKind, subject_id: impl Into<String>, period: Period) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
            period,
            search: None,
        }
    }

    pub fn statement(subject_id: impl Into<String>, period: Period) -> Self {
        Self::new(SubjectKind::Statement, subject_id, period)
    }

    pub fn bill(subject_id: impl Into<String>, period: Period) -> Self {
        Self::new(SubjectKind::Bill, subject_id, period)
    }

    /// Blank search terms collapse to `None`, so they do not count as a context change.
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    pub fn fold_policy(&self) -> FoldPolicy {
        self.kind.fold_policy()
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.kind.as_str(), self.subject_id, self.period)?;
        if let Some(search) = &self.search {
            write!(f, "?q={search}")?;
        }
        Ok(())
    }
}
