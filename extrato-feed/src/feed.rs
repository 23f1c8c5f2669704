//! StatementFeed: the facade the view layer talks to.
//!
//! A synchronous reducer. It hands out `PageRequest`s, takes responses back
//! through `receive_*`, and exposes one read-model via [`StatementFeed::view`].
//! All I/O lives in the collaborators; see `driver` for the async loop.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use extrato_core::{
    Accumulator, CanonicalTransaction, ContextChanged, ContextKey, FoldOutcome, InitialLoad,
    LoadMore, PageArrived, PageRequest, PaginationMeta, Pagination, RawPage, Settled, Summary,
};

use crate::error::{FeedError, SourceError};
use crate::source::Subject;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub page_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Everything the view layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub context: Option<ContextKey>,
    pub subject: Option<Subject>,
    pub transactions: Vec<CanonicalTransaction>,
    pub summary: Summary,
    pub pagination: PaginationMeta,
    /// Page 1 of a freshly selected context is outstanding.
    pub is_loading: bool,
    pub is_initial_load: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    pub error: Option<FeedError>,
}

/// Result of handing a page response to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Folded(FoldOutcome),
    Failed,
    /// Stale or duplicate delivery; nothing changed.
    Ignored(Settled),
}

// All per-context state. Rebuilt as a unit on every context change.
#[derive(Debug)]
struct Session {
    pagination: Pagination,
    accumulator: Accumulator,
    initial_load: InitialLoad,
    summary: Option<Summary>,
    subject: Option<Subject>,
    subject_error: Option<SourceError>,
    page_error: Option<FeedError>,
}

impl Session {
    fn open(event: &ContextChanged, limit: u32) -> Self {
        Self {
            pagination: Pagination::new(event.context.clone(), event.epoch, limit),
            accumulator: Accumulator::new(event.context.clone(), event.epoch),
            initial_load: InitialLoad::new(event.context.clone(), event.epoch),
            summary: None,
            subject: None,
            subject_error: None,
            page_error: None,
        }
    }

    fn context(&self) -> &ContextKey {
        self.pagination.context()
    }
}

#[derive(Debug, Default)]
pub struct StatementFeed {
    config: FeedConfig,
    epoch: u64,
    session: Option<Session>,
    subjects: Vec<Subject>,
    subjects_error: Option<SourceError>,
    categories: HashMap<String, String>,
}

impl StatementFeed {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> FeedConfig {
        self.config
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn context(&self) -> Option<&ContextKey> {
        self.session.as_ref().map(Session::context)
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Switch to `context`, discarding all state of the previous one, and
    /// issue its page-1 fetch. Selecting the current context again reloads it
    /// from scratch.
    pub fn select(&mut self, context: ContextKey) -> PageRequest {
        self.epoch += 1;
        let event = ContextChanged {
            context,
            epoch: self.epoch,
        };
        info!(context = %event.context, epoch = event.epoch, "context selected");

        let mut session = Session::open(&event, self.config.page_limit);
        let request = match session.pagination.start() {
            Some(req) => req,
            // A fresh session has nothing in flight.
            None => PageRequest {
                context: event.context.clone(),
                epoch: event.epoch,
                page: 1,
                limit: self.config.page_limit.max(1),
            },
        };
        self.session = Some(session);
        request
    }

    /// Re-fetch page 1 of the current context, keeping the visible rows until
    /// it lands. `None` when nothing is selected or a fetch is in flight.
    pub fn refresh(&mut self) -> Option<PageRequest> {
        let session = self.session.as_mut()?;
        let request = session.pagination.start()?;
        debug!(context = %request.context, "refresh issued");
        Some(request)
    }

    /// Request the next page. `None` when exhausted, busy or not started.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        let session = self.session.as_mut()?;
        match session.pagination.request_more() {
            LoadMore::Accepted(req) => Some(req),
            LoadMore::Rejected(_) => None,
        }
    }

    pub fn receive_page(
        &mut self,
        request: &PageRequest,
        result: Result<RawPage, SourceError>,
    ) -> PageOutcome {
        let Some(session) = self.session.as_mut() else {
            return PageOutcome::Ignored(Settled::Stale);
        };

        match result {
            Ok(page) => {
                let settled = session.pagination.settle_ok(request, &page.pagination);
                if !matches!(settled, Settled::Applied { .. }) {
                    debug!(request = %request.context, page = request.page, ?settled, "page ignored");
                    return PageOutcome::Ignored(settled);
                }
                session.initial_load.observe_response(&request.context, request.epoch);
                session.page_error = None;
                if page.summary.is_some() {
                    session.summary = page.summary.clone();
                }
                // Only start() issues page 1, so a second page 1 is a refresh.
                if request.page == 1 && session.accumulator.has_folded(1) {
                    session.accumulator.begin_refresh();
                }
                let event = PageArrived::from_response(request, page);
                let outcome = session.accumulator.fold(&event);
                if outcome == FoldOutcome::EmptyPage {
                    session.pagination.mark_exhausted();
                }
                debug!(
                    context = %request.context,
                    page = request.page,
                    ?outcome,
                    rows = session.accumulator.len(),
                    "page folded"
                );
                PageOutcome::Folded(outcome)
            }
            Err(source) => {
                let settled = session.pagination.settle_err(request);
                if !matches!(settled, Settled::Failed { .. }) {
                    debug!(request = %request.context, page = request.page, ?settled, "failure ignored");
                    return PageOutcome::Ignored(settled);
                }
                session.initial_load.observe_response(&request.context, request.epoch);
                warn!(context = %request.context, page = request.page, error = %source, "page fetch failed");
                session.page_error = Some(FeedError::Page {
                    page: request.page,
                    source,
                });
                PageOutcome::Failed
            }
        }
    }

    /// Subject lookup result for `context`. Ignored unless `context` is current.
    pub fn receive_subject(&mut self, context: &ContextKey, result: Result<Subject, SourceError>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.context() != context {
            debug!(stale = %context, "subject lookup for superseded context dropped");
            return;
        }
        match result {
            Ok(subject) => {
                session.subject = Some(subject);
                session.subject_error = None;
            }
            Err(e) => {
                warn!(subject = %context.subject_id, error = %e, "subject lookup failed");
                session.subject_error = Some(e);
            }
        }
    }

    pub fn receive_subjects(&mut self, result: Result<Vec<Subject>, SourceError>) {
        match result {
            Ok(list) => {
                self.subjects = list;
                self.subjects_error = None;
            }
            Err(e) => {
                warn!(error = %e, "subject list lookup failed");
                self.subjects_error = Some(e);
            }
        }
    }

    /// Category id to display name. An empty map means rows carry no category.
    pub fn set_categories(&mut self, categories: HashMap<String, String>) {
        self.categories = categories;
    }

    pub fn view(&self) -> FeedView {
        let Some(session) = self.session.as_ref() else {
            return FeedView {
                context: None,
                subject: None,
                transactions: Vec::new(),
                summary: Summary::default(),
                pagination: PaginationMeta::default(),
                is_loading: false,
                is_initial_load: false,
                is_loading_more: false,
                has_more: false,
                error: self.subjects_error.clone().map(FeedError::SubjectList),
            };
        };

        let is_initial_load = session.initial_load.is_initial();
        FeedView {
            context: Some(session.context().clone()),
            subject: session.subject.clone(),
            transactions: self.with_categories(session.accumulator.transactions()),
            summary: session.summary.clone().unwrap_or_default(),
            pagination: session.pagination.meta().clone(),
            is_loading: session.pagination.is_loading() && is_initial_load,
            is_initial_load,
            is_loading_more: session.pagination.is_loading_more(),
            has_more: session.pagination.has_more(),
            error: self.error(session),
        }
    }

    fn error(&self, session: &Session) -> Option<FeedError> {
        if let Some(e) = &session.subject_error {
            return Some(FeedError::Subject(e.clone()));
        }
        if let Some(e) = &self.subjects_error {
            return Some(FeedError::SubjectList(e.clone()));
        }
        session.page_error.clone()
    }

    fn with_categories(&self, rows: &[CanonicalTransaction]) -> Vec<CanonicalTransaction> {
        rows.iter()
            .map(|tx| {
                let mut tx = tx.clone();
                tx.category = tx
                    .category_id
                    .as_ref()
                    .and_then(|id| self.categories.get(id))
                    .cloned();
                tx
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extrato_core::{Batch, RawTransaction, SubjectKind};
    use chrono::NaiveDate;

    fn key(id: &str) -> ContextKey {
        ContextKey::statement(id, "2026-03".parse().unwrap())
    }

    fn page(n: u32, has_next: bool, rows: &[(&str, u32)]) -> RawPage {
        let txs = rows
            .iter()
            .map(|(id, day)| {
                let date = NaiveDate::from_ymd_opt(2026, 3, *day)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap();
                RawTransaction::new(date, format!("Compra no débito - {id}"), -5.0)
                    .with_correlation_id(*id)
                    .with_category_id("food")
            })
            .collect();
        RawPage {
            batches: vec![Batch::new("ext", txs)],
            pagination: PaginationMeta {
                page: n,
                limit: 20,
                total: 60,
                total_pages: 3,
                total_amount: None,
                has_next_page: has_next,
                has_previous_page: n > 1,
            },
            summary: None,
        }
    }

    fn subject(id: &str) -> Subject {
        Subject {
            id: id.into(),
            name: "Conta".into(),
            kind: SubjectKind::Statement,
            institution: None,
            credit_limit: None,
            color: None,
        }
    }

    #[test]
    fn empty_feed_has_an_empty_view() {
        let feed = StatementFeed::default();
        let v = feed.view();
        assert!(v.context.is_none());
        assert!(v.transactions.is_empty());
        assert!(!v.is_loading);
    }

    #[test]
    fn select_bumps_epoch_and_starts_page_one() {
        let mut feed = StatementFeed::new(FeedConfig { page_limit: 50 });
        let r = feed.select(key("a"));
        assert_eq!((r.page, r.limit, r.epoch), (1, 50, 1));
        let v = feed.view();
        assert!(v.is_loading && v.is_initial_load);
        assert_eq!(feed.select(key("a")).epoch, 2);
    }

    #[test]
    fn categories_are_attached_on_view() {
        let mut feed = StatementFeed::default();
        let r = feed.select(key("a"));
        feed.receive_page(&r, Ok(page(1, false, &[("x", 2)])));
        assert_eq!(feed.view().transactions[0].category, None);

        feed.set_categories(HashMap::from([("food".to_string(), "Alimentação".to_string())]));
        assert_eq!(feed.view().transactions[0].category.as_deref(), Some("Alimentação"));
    }

    #[test]
    fn refresh_replaces_list_without_initial_flag() {
        let mut feed = StatementFeed::default();
        let r = feed.select(key("a"));
        feed.receive_page(&r, Ok(page(1, false, &[("x", 2)])));

        let again = feed.refresh().unwrap();
        let v = feed.view();
        assert!(!v.is_loading);
        assert!(!v.is_initial_load);
        assert_eq!(v.transactions.len(), 1);

        let out = feed.receive_page(&again, Ok(page(1, false, &[("x", 2), ("y", 3)])));
        assert_eq!(out, PageOutcome::Folded(FoldOutcome::Replaced { count: 2 }));
    }

    #[test]
    fn subject_for_old_context_is_dropped() {
        let mut feed = StatementFeed::default();
        feed.select(key("a"));
        feed.select(key("b"));
        feed.receive_subject(&key("a"), Ok(subject("a")));
        assert!(feed.view().subject.is_none());
        feed.receive_subject(&key("b"), Ok(subject("b")));
        assert_eq!(feed.view().subject.unwrap().id, "b");
    }

    #[test]
    fn summary_is_kept_from_latest_page_that_reports_one() {
        let mut feed = StatementFeed::default();
        let r1 = feed.select(key("a"));
        let mut p1 = page(1, true, &[("x", 2)]);
        p1.summary = Some(Summary {
            opening_balance: 10.0,
            closing_balance: 5.0,
            total_in: 0.0,
            total_out: 5.0,
        });
        feed.receive_page(&r1, Ok(p1));
        let r2 = feed.load_more().unwrap();
        feed.receive_page(&r2, Ok(page(2, false, &[("y", 1)])));
        assert_eq!(feed.view().summary.closing_balance, 5.0);
    }
}
