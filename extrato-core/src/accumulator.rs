//! Accumulator: the merged, deduplicated transaction list for one context.
//!
//! Fold rules:
//! - page 1 replaces the list
//! - later pages append only ids not already present; statements re-sort by
//!   date descending afterwards, bills keep arrival order
//! - a page already folded in is a no-op (cache replays)
//! - an empty page is a terminal signal: nothing is merged; past page 1
//!   nothing is cleared either, while an empty page 1 empties the list
//! - events from another context or epoch are dropped

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::context::{ContextKey, FoldPolicy};
use crate::dedupe::{dedupe, new_rows};
use crate::events::PageArrived;
use crate::model::CanonicalTransaction;
use crate::normalize::normalize_batches;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    Replaced { count: usize },
    Appended { added: usize },
    AlreadyApplied,
    EmptyPage,
    Stale,
}

#[derive(Debug, Clone)]
pub struct Accumulator {
    context: ContextKey,
    epoch: u64,
    policy: FoldPolicy,
    transactions: Vec<CanonicalTransaction>,
    folded_pages: BTreeSet<u32>,
}

impl Accumulator {
    pub fn new(context: ContextKey, epoch: u64) -> Self {
        let policy = context.fold_policy();
        Self {
            context,
            epoch,
            policy,
            transactions: Vec::new(),
            folded_pages: BTreeSet::new(),
        }
    }

    pub fn context(&self) -> &ContextKey {
        &self.context
    }

    pub fn policy(&self) -> FoldPolicy {
        self.policy
    }

    pub fn transactions(&self) -> &[CanonicalTransaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn folded_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.folded_pages.iter().copied()
    }

    pub fn has_folded(&self, page: u32) -> bool {
        self.folded_pages.contains(&page)
    }

    /// Forget which pages were folded so a refresh can replace the list again.
    /// The visible rows stay until the new page 1 lands.
    pub fn begin_refresh(&mut self) {
        self.folded_pages.clear();
    }

    pub fn fold(&mut self, event: &PageArrived) -> FoldOutcome {
        if event.epoch != self.epoch || event.context != self.context {
            debug!(
                current = %self.context,
                stale = %event.context,
                page = event.page,
                "dropping page from superseded context"
            );
            return FoldOutcome::Stale;
        }
        if event.page == 0 {
            warn!(context = %self.context, "page 0 in response; treating as page 1");
        }
        let page = event.page.max(1);

        if !self.folded_pages.insert(page) {
            return FoldOutcome::AlreadyApplied;
        }

        let incoming = normalize_batches(&event.batches);
        if incoming.is_empty() {
            if page == 1 {
                self.transactions.clear();
            }
            return FoldOutcome::EmptyPage;
        }

        if page == 1 {
            self.transactions = dedupe(incoming);
            if self.policy == FoldPolicy::ResortOnMerge {
                sort_newest_first(&mut self.transactions);
            }
            return FoldOutcome::Replaced {
                count: self.transactions.len(),
            };
        }

        let fresh = new_rows(&self.transactions, incoming);
        let added = fresh.len();
        self.transactions.extend(fresh);
        if self.policy == FoldPolicy::ResortOnMerge {
            sort_newest_first(&mut self.transactions);
        }
        FoldOutcome::Appended { added }
    }
}

// Stable, so rows sharing a timestamp keep arrival order.
fn sort_newest_first(txs: &mut [CanonicalTransaction]) {
    txs.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Batch, PaginationMeta, RawTransaction};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn key(id: &str) -> ContextKey {
        ContextKey::statement(id, "2026-03".parse().unwrap())
    }

    /// One batch; each row is (correlation id, day).
    fn page(context: &ContextKey, epoch: u64, page: u32, rows: &[(&str, u32)]) -> PageArrived {
        let raws = rows
            .iter()
            .map(|(id, day)| {
                RawTransaction::new(at(*day), format!("Pix recebido - {id}"), 10.0)
                    .with_correlation_id(*id)
            })
            .collect();
        PageArrived {
            context: context.clone(),
            epoch,
            page,
            batches: vec![Batch::new("ext", raws)],
            pagination: PaginationMeta::default(),
            summary: None,
        }
    }

    fn is_newest_first(txs: &[CanonicalTransaction]) -> bool {
        txs.windows(2).all(|w| w[0].date >= w[1].date)
    }

    #[test]
    fn page_one_replaces_and_sorts() {
        let k = key("a");
        let mut acc = Accumulator::new(k.clone(), 1);
        let out = acc.fold(&page(&k, 1, 1, &[("x", 1), ("y", 9), ("z", 5)]));
        assert_eq!(out, FoldOutcome::Replaced { count: 3 });
        assert!(is_newest_first(acc.transactions()));
        assert_eq!(acc.transactions()[0].date, at(9));
    }

    #[test]
    fn applying_same_page_twice_is_idempotent() {
        let k = key("a");
        let mut acc = Accumulator::new(k.clone(), 1);
        let p1 = page(&k, 1, 1, &[("x", 3), ("y", 2)]);
        let p2 = page(&k, 1, 2, &[("z", 1)]);
        acc.fold(&p1);
        acc.fold(&p2);
        let before = acc.transactions().to_vec();

        assert_eq!(acc.fold(&p2), FoldOutcome::AlreadyApplied);
        assert_eq!(acc.fold(&p1), FoldOutcome::AlreadyApplied);
        assert_eq!(acc.transactions(), before.as_slice());
    }

    #[test]
    fn cross_page_duplicates_are_dropped() {
        let k = key("a");
        let mut acc = Accumulator::new(k.clone(), 1);
        acc.fold(&page(&k, 1, 1, &[("x", 9), ("y", 8)]));
        // Page boundary shifted: "y" is delivered again, same batch slot.
        let out = acc.fold(&page(&k, 1, 2, &[("w", 7), ("y", 8)]));
        assert_eq!(out, FoldOutcome::Appended { added: 1 });
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn out_of_order_pages_end_up_sorted() {
        let k = key("a");
        let mut acc = Accumulator::new(k.clone(), 1);
        acc.fold(&page(&k, 1, 1, &[("a", 30), ("b", 28)]));
        acc.fold(&page(&k, 1, 3, &[("e", 10), ("f", 8)]));
        acc.fold(&page(&k, 1, 2, &[("c", 20), ("d", 15)]));
        assert_eq!(acc.len(), 6);
        assert!(is_newest_first(acc.transactions()));
        assert_eq!(acc.folded_pages().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn bill_pages_append_in_arrival_order() {
        let k = ContextKey::bill("card", "2026-03".parse().unwrap());
        let mut acc = Accumulator::new(k.clone(), 1);
        acc.fold(&page(&k, 1, 1, &[("a", 5), ("b", 20)]));
        acc.fold(&page(&k, 1, 2, &[("c", 30)]));
        let days: Vec<_> = acc.transactions().iter().map(|t| t.date).collect();
        assert_eq!(days, vec![at(5), at(20), at(30)]);
    }

    #[test]
    fn empty_page_keeps_existing_rows() {
        let k = key("a");
        let mut acc = Accumulator::new(k.clone(), 1);
        acc.fold(&page(&k, 1, 1, &[("a", 5), ("b", 4)]));
        assert_eq!(acc.fold(&page(&k, 1, 2, &[])), FoldOutcome::EmptyPage);
        assert_eq!(acc.len(), 2);
        assert!(acc.has_folded(2));
    }

    #[test]
    fn empty_page_one_after_refresh_clears_old_rows() {
        let k = key("a");
        let mut acc = Accumulator::new(k.clone(), 1);
        acc.fold(&page(&k, 1, 1, &[("a", 5), ("b", 4)]));
        acc.fold(&page(&k, 1, 2, &[("c", 3)]));
        acc.begin_refresh();
        assert_eq!(acc.fold(&page(&k, 1, 1, &[])), FoldOutcome::EmptyPage);
        assert!(acc.is_empty());
    }

    #[test]
    fn stale_context_is_dropped() {
        let a = key("a");
        let b = key("b");
        let mut acc = Accumulator::new(b.clone(), 2);
        acc.fold(&page(&b, 2, 1, &[("n", 1)]));
        let before = acc.len();

        assert_eq!(acc.fold(&page(&a, 1, 2, &[("o1", 2), ("o2", 3)])), FoldOutcome::Stale);
        // Right key, wrong epoch.
        assert_eq!(acc.fold(&page(&b, 1, 2, &[("o3", 2)])), FoldOutcome::Stale);
        assert_eq!(acc.len(), before);
    }

    #[test]
    fn refresh_allows_page_one_again() {
        let k = key("a");
        let mut acc = Accumulator::new(k.clone(), 1);
        acc.fold(&page(&k, 1, 1, &[("a", 5)]));
        acc.begin_refresh();
        assert_eq!(acc.len(), 1);
        let out = acc.fold(&page(&k, 1, 1, &[("a", 5), ("new", 6)]));
        assert_eq!(out, FoldOutcome::Replaced { count: 2 });
    }
}
