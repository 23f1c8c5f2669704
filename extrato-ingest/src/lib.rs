//! extrato-ingest: decode statement and bill page payloads into raw pages.
//!
//! Decoding degrades instead of failing: malformed transaction lists become
//! empty batches and bad fields are coerced. Only text that is not JSON at all
//! is an error.

pub mod dates;
pub mod parsers;

use anyhow::{Context, Result};
use serde_json::Value;

use extrato_core::{RawPage, SubjectKind};

pub use parsers::bill::decode_bill_page;
pub use parsers::statement::decode_statement_page;

/// Decode an already-parsed JSON payload for the given subject kind.
pub fn decode_page(kind: SubjectKind, value: &Value) -> RawPage {
    match kind {
        SubjectKind::Statement => decode_statement_page(value),
        SubjectKind::Bill => decode_bill_page(value),
    }
}

/// Parse and decode a JSON page body.
pub fn parse_page(kind: SubjectKind, text: &str) -> Result<RawPage> {
    let value: Value = serde_json::from_str(text).context("page body is not valid JSON")?;
    Ok(decode_page(kind, &value))
}
