//! Pagination state machine for one context.
//!
//! Idle -> Loading(1) -> Loaded -> LoadingMore(n+1) -> Loaded -> ... -> Exhausted
//!
//! One instance lives for exactly one (context, epoch). A context change builds
//! a fresh instance instead of mutating this one, so nothing from the old
//! context can leak into the new one.
//!
//! Re-entrancy: at most one page is in flight at a time. `request_more` while a
//! fetch is pending is rejected, which makes rapid repeated load-more signals
//! (fast scrolling) harmless.

use tracing::debug;

use crate::context::ContextKey;
use crate::events::PageRequest;
use crate::model::PaginationMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    Idle,
    Loading,
    Loaded,
    LoadingMore,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreRejection {
    /// Page 1 has not landed yet.
    NotStarted,
    /// A fetch is already in flight.
    Busy,
    /// Server reported no next page.
    Exhausted,
    /// Next page would exceed the reported total page count.
    BeyondLastPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMore {
    Accepted(PageRequest),
    Rejected(LoadMoreRejection),
}

/// What happened when a response was handed to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Applied { page: u32 },
    Failed { page: u32 },
    /// Response belongs to another context or epoch.
    Stale,
    /// Response for a page that is not pending (duplicate delivery).
    Unsolicited,
}

#[derive(Debug, Clone)]
pub struct Pagination {
    context: ContextKey,
    epoch: u64,
    limit: u32,
    page: u32,
    meta: PaginationMeta,
    phase: PagePhase,
    in_flight: Option<u32>,
}

impl Pagination {
    pub fn new(context: ContextKey, epoch: u64, limit: u32) -> Self {
        Self {
            context,
            epoch,
            limit: limit.max(1),
            page: 1,
            meta: PaginationMeta::default(),
            phase: PagePhase::Idle,
            in_flight: None,
        }
    }

    pub fn context(&self) -> &ContextKey {
        &self.context
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn meta(&self) -> &PaginationMeta {
        &self.meta
    }

    pub fn phase(&self) -> PagePhase {
        self.phase
    }

    pub fn in_flight(&self) -> Option<u32> {
        self.in_flight
    }

    pub fn is_loading(&self) -> bool {
        self.phase == PagePhase::Loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.phase == PagePhase::LoadingMore
    }

    pub fn has_more(&self) -> bool {
        self.meta.has_next_page
    }

    /// True when the request was issued under this instance's context and epoch.
    pub fn is_current(&self, request: &PageRequest) -> bool {
        request.epoch == self.epoch && request.context == self.context
    }

    /// Issue the page-1 fetch. Also used to refresh an already loaded list.
    ///
    /// Returns `None` while another fetch is pending.
    pub fn start(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() {
            debug!(context = %self.context, "page 1 not issued: fetch already in flight");
            return None;
        }
        self.in_flight = Some(1);
        self.phase = PagePhase::Loading;
        Some(self.request_for(1))
    }

    /// Ask for the next page.
    pub fn request_more(&mut self) -> LoadMore {
        let rejection = if self.in_flight.is_some()
            || matches!(self.phase, PagePhase::Loading | PagePhase::LoadingMore)
        {
            Some(LoadMoreRejection::Busy)
        } else if self.phase == PagePhase::Idle {
            Some(LoadMoreRejection::NotStarted)
        } else if !self.meta.has_next_page {
            self.phase = PagePhase::Exhausted;
            Some(LoadMoreRejection::Exhausted)
        } else if self.meta.total_pages > 0 && self.page + 1 > self.meta.total_pages {
            // Server says there is more but the page count disagrees. Treat as the end.
            self.phase = PagePhase::Exhausted;
            Some(LoadMoreRejection::BeyondLastPage)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(context = %self.context, page = self.page, ?reason, "load more rejected");
            return LoadMore::Rejected(reason);
        }

        let next = self.page + 1;
        self.in_flight = Some(next);
        self.phase = PagePhase::LoadingMore;
        LoadMore::Accepted(self.request_for(next))
    }

    /// A fetch completed successfully. Metadata is replaced wholesale.
    pub fn settle_ok(&mut self, request: &PageRequest, meta: &PaginationMeta) -> Settled {
        if let Some(s) = self.check(request) {
            return s;
        }
        self.in_flight = None;
        self.meta = meta.clone();
        self.page = if meta.page > 0 { meta.page } else { request.page };
        self.phase = if meta.has_next_page {
            PagePhase::Loaded
        } else {
            PagePhase::Exhausted
        };
        Settled::Applied { page: self.page }
    }

    /// A fetch failed. Metadata is kept; the pending slot is freed so a retry is allowed.
    pub fn settle_err(&mut self, request: &PageRequest) -> Settled {
        if let Some(s) = self.check(request) {
            return s;
        }
        self.in_flight = None;
        self.phase = if self.meta == PaginationMeta::default() {
            PagePhase::Idle
        } else if self.meta.has_next_page {
            PagePhase::Loaded
        } else {
            PagePhase::Exhausted
        };
        Settled::Failed { page: request.page }
    }

    /// An empty page ends the list whatever the metadata claims.
    /// No-op while a fetch is in flight.
    pub fn mark_exhausted(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        if self.meta.has_next_page {
            debug!(context = %self.context, page = self.page, "empty page; ignoring hasNextPage");
        }
        self.meta.has_next_page = false;
        self.phase = PagePhase::Exhausted;
    }

    fn check(&self, request: &PageRequest) -> Option<Settled> {
        if !self.is_current(request) {
            return Some(Settled::Stale);
        }
        if self.in_flight != Some(request.page) {
            return Some(Settled::Unsolicited);
        }
        None
    }

    fn request_for(&self, page: u32) -> PageRequest {
        PageRequest {
            context: self.context.clone(),
            epoch: self.epoch,
            page,
            limit: self.limit,
        }
    }
}
