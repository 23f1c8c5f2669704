//! Account statement pages.
//!
//! Expected shape (optionally wrapped in `{"data": ...}`):
//!   { "extracts": [ { "id": "ext-1", "transactions": [ {...}, ... ] } ],
//!     "pagination": { "page": 1, "limit": 20, "total": 57, "totalPages": 3,
//!                     "hasNextPage": true, "hasPreviousPage": false },
//!     "summary": { "openingBalance": 0, "closingBalance": 0, "totalIn": 0, "totalOut": 0 } }
//!
//! A bare top-level `transactions` array is accepted as a single batch.

use serde_json::Value;
use tracing::debug;

use extrato_core::{Batch, RawPage};

use super::fields::{
    array_field, decode_pagination, decode_summary, decode_transactions, payload_root, str_field,
};

/// Decode a statement page. Never fails; unusable shapes become an empty page.
pub fn decode_statement_page(value: &Value) -> RawPage {
    let root = payload_root(value);
    let Some(obj) = root.as_object() else {
        debug!("statement payload is not an object; treating as empty page");
        return RawPage::default();
    };

    let batches = if obj.contains_key("extracts") || obj.contains_key("statements") {
        array_field(obj, &["extracts", "statements"])
            .iter()
            .filter_map(Value::as_object)
            .map(|extract| Batch {
                id: str_field(extract, &["id", "extractId"]).unwrap_or_default(),
                transactions: decode_transactions(extract),
                bill: None,
            })
            .collect()
    } else {
        vec![Batch::new("page", decode_transactions(obj))]
    };

    RawPage {
        batches,
        pagination: decode_pagination(root),
        summary: decode_summary(root),
    }
}
