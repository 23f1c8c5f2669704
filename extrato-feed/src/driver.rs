//! Async loop around [`StatementFeed`]: issues the feed's requests against
//! the collaborators and hands the results back.

use tracing::info;

use extrato_core::{ContextKey, PageRequest};

use crate::feed::{FeedView, PageOutcome, StatementFeed};
use crate::source::{PageSource, SubjectSource};

pub struct FeedDriver<P, S> {
    feed: StatementFeed,
    pages: P,
    subjects: S,
}

impl<P: PageSource, S: SubjectSource> FeedDriver<P, S> {
    pub fn new(feed: StatementFeed, pages: P, subjects: S) -> Self {
        Self {
            feed,
            pages,
            subjects,
        }
    }

    pub fn feed(&self) -> &StatementFeed {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut StatementFeed {
        &mut self.feed
    }

    pub fn view(&self) -> FeedView {
        self.feed.view()
    }

    pub fn into_feed(self) -> StatementFeed {
        self.feed
    }

    /// Select `context` and load its first page, subject and subject list
    /// concurrently.
    pub async fn select(&mut self, context: ContextKey) -> PageOutcome {
        let request = self.feed.select(context.clone());
        let (subject, subjects, page) = tokio::join!(
            self.subjects.subject(context.kind, &context.subject_id),
            self.subjects.subjects(context.kind),
            self.pages.fetch_page(&request),
        );
        self.feed.receive_subject(&context, subject);
        self.feed.receive_subjects(subjects);
        self.feed.receive_page(&request, page)
    }

    /// Fetch the next page. `None` when the feed refused to issue one.
    pub async fn load_more(&mut self) -> Option<PageOutcome> {
        let request = self.feed.load_more()?;
        Some(self.run(request).await)
    }

    pub async fn refresh(&mut self) -> Option<PageOutcome> {
        let request = self.feed.refresh()?;
        Some(self.run(request).await)
    }

    /// Keep loading until the feed reports no more pages, a fetch fails, or
    /// `max_pages` further pages were fetched. Returns how many were fetched.
    pub async fn load_all(&mut self, max_pages: Option<u32>) -> u32 {
        let mut fetched = 0;
        while max_pages.is_none_or(|max| fetched < max) {
            match self.load_more().await {
                Some(PageOutcome::Folded(_)) => fetched += 1,
                Some(_) => {
                    fetched += 1;
                    break;
                }
                None => break,
            }
        }
        if let Some(ctx) = self.feed.context() {
            info!(context = %ctx, pages = fetched, rows = self.view().transactions.len(), "load finished");
        }
        fetched
    }

    async fn run(&mut self, request: PageRequest) -> PageOutcome {
        let result = self.pages.fetch_page(&request).await;
        self.feed.receive_page(&request, result)
    }
}
