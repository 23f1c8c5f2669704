//! extrato-feed: the statement feed facade and its collaborators.
//!
//! [`StatementFeed`] is the synchronous reducer over the core engine;
//! [`FeedDriver`] runs it against a [`PageSource`] / [`SubjectSource`] on tokio.

pub mod driver;
pub mod error;
pub mod export;
pub mod feed;
pub mod http;
pub mod memory;
pub mod source;

pub use driver::FeedDriver;
pub use error::{FeedError, SourceError};
pub use export::write_csv;
pub use feed::{DEFAULT_PAGE_LIMIT, FeedConfig, FeedView, PageOutcome, StatementFeed};
pub use http::HttpSource;
pub use memory::MemorySource;
pub use source::{PageSource, Subject, SubjectSource};
