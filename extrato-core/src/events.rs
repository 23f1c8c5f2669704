//! Message types flowing between the facade and the engine components.
//!
//! Every page request and page response carries the context key and session
//! epoch it was issued under, so late responses from an abandoned context can
//! be recognized and dropped instead of merged.

use serde::{Deserialize, Serialize};

use crate::context::ContextKey;
use crate::model::{Batch, PaginationMeta, RawPage, Summary};

/// A page fetch issued by the pagination state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub context: ContextKey,
    /// Session number; bumps on every context change.
    pub epoch: u64,
    /// 1-based page to fetch.
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.context.subject_id.trim().is_empty() {
            return Err("subject_id must be non-empty".to_string());
        }
        if self.page == 0 {
            return Err("page must be >= 1".to_string());
        }
        if self.limit == 0 {
            return Err("limit must be >= 1".to_string());
        }
        Ok(())
    }
}

/// The user moved to a different subject, period or search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextChanged {
    pub context: ContextKey,
    pub epoch: u64,
}

impl ContextChanged {
    pub fn validate(&self) -> Result<(), String> {
        if self.context.subject_id.trim().is_empty() {
            return Err("subject_id must be non-empty".to_string());
        }
        Ok(())
    }
}

/// A page response, tagged with the request it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageArrived {
    pub context: ContextKey,
    pub epoch: u64,
    pub page: u32,
    pub batches: Vec<Batch>,
    pub pagination: PaginationMeta,
    pub summary: Option<Summary>,
}

impl PageArrived {
    pub fn from_response(request: &PageRequest, response: RawPage) -> Self {
        Self {
            context: request.context.clone(),
            epoch: request.epoch,
            page: request.page,
            batches: response.batches,
            pagination: response.pagination,
            summary: response.summary,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.context.subject_id.trim().is_empty() {
            return Err("subject_id must be non-empty".to_string());
        }
        if self.page == 0 {
            return Err("page must be >= 1".to_string());
        }
        Ok(())
    }

    pub fn transaction_count(&self) -> usize {
        self.batches.iter().map(|b| b.transactions.len()).sum()
    }
}
