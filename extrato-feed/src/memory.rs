//! In-memory collaborator for fixtures, tests and offline use.
//!
//! Fixture file layout:
//!
//! ```json
//! {
//!   "subjects": [{ "id": "acc-1", "name": "Conta", "kind": "statement" }],
//!   "statement": { "1": { "extracts": [...], "pagination": {...} } },
//!   "bill": { "1": { "bills": [...] } }
//! }
//! ```
//!
//! Pages are served per kind regardless of subject or period. A page that is
//! not in the table comes back empty.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use extrato_core::{PageRequest, RawPage, SubjectKind};
use extrato_ingest::decode_page;

use crate::error::SourceError;
use crate::source::{PageSource, Subject, SubjectSource};

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    subjects: Vec<Subject>,
    pages: HashMap<SubjectKind, BTreeMap<u32, RawPage>>,
    failures: HashMap<(SubjectKind, u32), SourceError>,
    fetches: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    pub fn with_page(mut self, kind: SubjectKind, page: u32, raw: RawPage) -> Self {
        self.pages.entry(kind).or_default().insert(page, raw);
        self
    }

    /// Make every fetch of `page` for `kind` fail with `error`.
    pub fn with_failure(mut self, kind: SubjectKind, page: u32, error: SourceError) -> Self {
        self.failures.insert((kind, page), error);
        self
    }

    pub fn clear_failure(&mut self, kind: SubjectKind, page: u32) {
        self.failures.remove(&(kind, page));
    }

    /// Number of page fetches served so far, shared across clones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn from_fixture(value: &Value) -> Result<Self> {
        let mut source = Self::new();

        if let Some(subjects) = value.get("subjects") {
            source.subjects = serde_json::from_value(subjects.clone())
                .context("fixture `subjects` is not a list of subjects")?;
        }

        for kind in [SubjectKind::Statement, SubjectKind::Bill] {
            let Some(table) = value.get(kind.as_str()) else {
                continue;
            };
            let table = table
                .as_object()
                .with_context(|| format!("fixture `{}` must be an object keyed by page", kind.as_str()))?;
            for (page, payload) in table {
                let n: u32 = page
                    .parse()
                    .with_context(|| format!("fixture page key `{page}` is not a number"))?;
                source = source.with_page(kind, n, decode_page(kind, payload));
            }
        }
        Ok(source)
    }

    pub fn from_fixture_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("fixture {} is not valid JSON", path.display()))?;
        Self::from_fixture(&value)
    }
}

impl PageSource for MemorySource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<RawPage, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let kind = request.context.kind;
        if let Some(err) = self.failures.get(&(kind, request.page)) {
            return Err(err.clone());
        }
        let mut page = self
            .pages
            .get(&kind)
            .and_then(|t| t.get(&request.page))
            .cloned()
            .unwrap_or_default();

        if let Some(term) = &request.context.search {
            let term = term.to_lowercase();
            for batch in &mut page.batches {
                batch
                    .transactions
                    .retain(|tx| tx.description.to_lowercase().contains(&term));
            }
        }
        debug!(context = %request.context, page = request.page, rows = page.transaction_count(), "memory page served");
        Ok(page)
    }
}

impl SubjectSource for MemorySource {
    async fn subject(&self, kind: SubjectKind, id: &str) -> Result<Subject, SourceError> {
        self.subjects
            .iter()
            .find(|s| s.kind == kind && s.id == id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }

    async fn subjects(&self, kind: SubjectKind) -> Result<Vec<Subject>, SourceError> {
        Ok(self
            .subjects
            .iter()
            .filter(|s| s.kind == kind)
            .cloned()
            .collect())
    }
}
