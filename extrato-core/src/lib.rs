//! extrato-core: statement/bill aggregation engine.
//!
//! Classifier, normalizer, deduplicator, pagination state machine,
//! accumulator and initial-load tracker. No I/O.

pub mod accumulator;
pub mod classifier;
pub mod context;
pub mod dedupe;
pub mod events;
pub mod initial_load;
pub mod model;
pub mod normalize;
pub mod pagination;

pub use accumulator::{Accumulator, FoldOutcome};
pub use classifier::{Classification, TransactionKind, classify, FALLBACK_COUNTERPARTY};
pub use context::{ContextKey, FoldPolicy, Period, PeriodError, SubjectKind};
pub use dedupe::dedupe;
pub use events::{ContextChanged, PageArrived, PageRequest};
pub use initial_load::InitialLoad;
pub use model::{
    Batch, BillMeta, BillStatus, CanonicalTransaction, Installment, PaginationMeta, RawPage,
    RawTransaction, Summary,
};
pub use normalize::{normalize, normalize_batch, normalize_batches};
pub use pagination::{LoadMore, LoadMoreRejection, PagePhase, Pagination, Settled};
