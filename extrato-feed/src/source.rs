//! Collaborator contracts: where pages and subject metadata come from.
//!
//! The engine only consumes these; transport, caching, retries and timeouts
//! belong to the implementations.

use serde::{Deserialize, Serialize};

use extrato_core::{PageRequest, RawPage, SubjectKind};

use crate::error::SourceError;

/// An account or credit card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub kind: SubjectKind,
    #[serde(default)]
    pub institution: Option<String>,
    /// Credit cards only.
    #[serde(default)]
    pub credit_limit: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Per-page transaction fetches, resolvable independently per page.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<RawPage, SourceError>;
}

/// Subject identity lookups.
#[allow(async_fn_in_trait)]
pub trait SubjectSource {
    async fn subject(&self, kind: SubjectKind, id: &str) -> Result<Subject, SourceError>;

    async fn subjects(&self, kind: SubjectKind) -> Result<Vec<Subject>, SourceError>;
}
