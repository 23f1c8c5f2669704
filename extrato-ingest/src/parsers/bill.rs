//! Credit-card bill pages.
//!
//! Expected shape (optionally wrapped in `{"data": ...}`):
//!   { "bills": [ { "id": "bill-1", "month": "2026-03", "total": 812.4,
//!                  "dueDate": "2026-03-10", "status": "OPEN",
//!                  "transactions": [ {...}, ... ] } ],
//!     "pagination": { ..., "totalAmount": 812.4 } }
//!
//! A single `bill` object, or a bare `transactions` array, is also accepted.

use serde_json::{Map, Value};
use tracing::debug;

use extrato_core::{Batch, BillMeta, BillStatus, RawPage};

use super::fields::{
    array_field, decode_pagination, decode_summary, decode_transactions, f64_field, payload_root,
    str_field,
};
use crate::dates::parse_date;

/// Decode a bill page. Never fails; unusable shapes become an empty page.
pub fn decode_bill_page(value: &Value) -> RawPage {
    let root = payload_root(value);
    let Some(obj) = root.as_object() else {
        debug!("bill payload is not an object; treating as empty page");
        return RawPage::default();
    };

    let batches = if obj.contains_key("bills") {
        array_field(obj, &["bills"])
            .iter()
            .filter_map(Value::as_object)
            .map(decode_bill)
            .collect()
    } else if let Some(bill) = obj.get("bill").and_then(Value::as_object) {
        vec![decode_bill(bill)]
    } else {
        vec![Batch::new("page", decode_transactions(obj))]
    };

    RawPage {
        batches,
        pagination: decode_pagination(root),
        summary: decode_summary(root),
    }
}

fn decode_bill(obj: &Map<String, Value>) -> Batch {
    let id = str_field(obj, &["id", "billId"]).unwrap_or_default();
    let meta = BillMeta {
        bill_id: id.clone(),
        month: str_field(obj, &["month", "referenceMonth"]).unwrap_or_default(),
        total: f64_field(obj, &["total", "totalAmount", "amount"]).unwrap_or(0.0),
        due_date: str_field(obj, &["dueDate", "due_date"]).and_then(|s| parse_date(&s)),
        status: str_field(obj, &["status"])
            .map(|s| parse_status(&s))
            .unwrap_or(BillStatus::Open),
    };
    Batch {
        id,
        transactions: decode_transactions(obj),
        bill: Some(meta),
    }
}

fn parse_status(s: &str) -> BillStatus {
    match s.trim().to_ascii_uppercase().as_str() {
        "CLOSED" => BillStatus::Closed,
        "PAID" => BillStatus::Paid,
        "OPEN" => BillStatus::Open,
        other => {
            debug!(status = other, "unknown bill status; using OPEN");
            BillStatus::Open
        }
    }
}
