//! Field access helpers shared by the statement and bill decoders.
//!
//! Everything here coerces instead of failing: a row with a bad field is kept
//! with a neutral value, only a row that is not an object at all is skipped.

use serde_json::{Map, Value};
use tracing::debug;

use extrato_core::{Installment, PaginationMeta, RawTransaction, Summary};

use crate::dates::parse_datetime;

/// Unwrap `{"data": {...}}` envelopes.
pub(crate) fn payload_root(value: &Value) -> &Value {
    match value.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

/// First present, non-null key among `keys`.
pub(crate) fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

pub(crate) fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match field(obj, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn f64_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    match field(obj, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

pub(crate) fn u64_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    match field(obj, keys)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Like `u64_field`, but values that do not fit a `u32` count as missing.
pub(crate) fn u32_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    u64_field(obj, keys).and_then(|v| u32::try_from(v).ok())
}

pub(crate) fn bool_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    match field(obj, keys)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// "1234.56", "1.234,56", "R$ 12,90", "-3,5".
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        // Both present: the later one is the decimal separator.
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        _ => cleaned,
    };
    normalized.parse().ok()
}

/// The list under the first of `keys` that is an array. Anything else is empty.
pub(crate) fn array_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> &'a [Value] {
    match field(obj, keys) {
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => {
            debug!(keys = ?keys, kind = value_kind(other), "expected array; treating as empty");
            &[]
        }
        None => &[],
    }
}

pub(crate) fn decode_transactions(obj: &Map<String, Value>) -> Vec<RawTransaction> {
    array_field(obj, &["transactions", "items"])
        .iter()
        .filter_map(Value::as_object)
        .map(decode_transaction)
        .collect()
}

pub(crate) fn decode_transaction(obj: &Map<String, Value>) -> RawTransaction {
    let date = str_field(obj, &["date", "transactionDate", "createdAt", "created_at"])
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_default();

    RawTransaction {
        date,
        description: str_field(obj, &["description", "title", "name"])
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        amount: f64_field(obj, &["amount", "value"]).unwrap_or(0.0),
        correlation_id: str_field(
            obj,
            &["externalId", "external_id", "correlationId", "correlation_id", "endToEndId"],
        ),
        category_id: str_field(obj, &["categoryId", "category_id"]),
        installment: decode_installment(obj),
    }
}

fn decode_installment(obj: &Map<String, Value>) -> Option<Installment> {
    if let Some(Value::Object(inst)) = field(obj, &["installment", "installments"]) {
        let current = u32_field(inst, &["current", "number"])?;
        let total = u32_field(inst, &["total", "count"])?;
        return Some(Installment {
            current,
            total,
            description: str_field(inst, &["description", "baseDescription"]),
        });
    }
    let current = u32_field(obj, &["installmentNumber", "installment_number"])?;
    let total = u32_field(obj, &["totalInstallments", "total_installments"])?;
    Some(Installment {
        current,
        total,
        description: None,
    })
}

pub(crate) fn decode_pagination(root: &Value) -> PaginationMeta {
    let Some(obj) = root
        .get("pagination")
        .or_else(|| root.get("meta"))
        .and_then(Value::as_object)
    else {
        return PaginationMeta::default();
    };

    PaginationMeta {
        page: u32_field(obj, &["page", "currentPage"]).unwrap_or(0),
        limit: u32_field(obj, &["limit", "perPage", "pageSize"]).unwrap_or(0),
        total: u64_field(obj, &["total", "totalItems", "count"]).unwrap_or(0),
        total_pages: u32_field(obj, &["totalPages", "total_pages", "pages"]).unwrap_or(0),
        total_amount: f64_field(obj, &["totalAmount", "total_amount"]),
        has_next_page: bool_field(obj, &["hasNextPage", "has_next_page", "hasNext"])
            .unwrap_or(false),
        has_previous_page: bool_field(obj, &["hasPreviousPage", "has_previous_page", "hasPrev"])
            .unwrap_or(false),
    }
}

pub(crate) fn decode_summary(root: &Value) -> Option<Summary> {
    let obj = root.get("summary").and_then(Value::as_object)?;
    Some(Summary {
        opening_balance: f64_field(obj, &["openingBalance", "opening_balance", "initialBalance"])
            .unwrap_or(0.0),
        closing_balance: f64_field(obj, &["closingBalance", "closing_balance", "finalBalance"])
            .unwrap_or(0.0),
        total_in: f64_field(obj, &["totalIn", "totalCredits", "income"]).unwrap_or(0.0),
        total_out: f64_field(obj, &["totalOut", "totalDebits", "expenses"]).unwrap_or(0.0),
    })
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde_json::json;

    #[test]
    fn amounts_in_both_notations() {
        assert_eq!(parse_amount("1234.56"), Some(1234.56));
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("R$ 12,90"), Some(12.90));
        assert_eq!(parse_amount("-3,5"), Some(-3.5));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("  "), None);
    }

    #[test]
    fn transaction_with_bad_fields_is_coerced() {
        let v = json!({"date": "não sei", "amount": "x", "description": null});
        let tx = decode_transaction(v.as_object().unwrap());
        assert_eq!(tx.date, NaiveDateTime::default());
        assert_eq!(tx.amount, 0.0);
        assert_eq!(tx.description, "");
        assert_eq!(tx.correlation_id, None);
    }

    #[test]
    fn installment_nested_or_flat() {
        let nested = json!({"installment": {"current": 2, "total": 6, "description": "TV"}});
        let flat = json!({"installmentNumber": "3", "totalInstallments": 4});
        let a = decode_transaction(nested.as_object().unwrap()).installment.unwrap();
        let b = decode_transaction(flat.as_object().unwrap()).installment.unwrap();
        assert_eq!((a.current, a.total, a.description.as_deref()), (2, 6, Some("TV")));
        assert_eq!((b.current, b.total), (3, 4));
    }

    #[test]
    fn oversized_counts_fall_back_to_defaults() {
        let root = json!({"pagination": {"page": 4294967296u64, "totalPages": 3, "limit": 99999999999u64}});
        let meta = decode_pagination(&root);
        assert_eq!(meta.page, 0);
        assert_eq!(meta.limit, 0);
        assert_eq!(meta.total_pages, 3);

        let v = json!({"installmentNumber": 2, "totalInstallments": 5000000000u64});
        assert_eq!(decode_installment(v.as_object().unwrap()), None);
    }

    #[test]
    fn non_array_transactions_are_empty() {
        let v = json!({"transactions": {"oops": true}});
        assert!(decode_transactions(v.as_object().unwrap()).is_empty());
        let v = json!({"transactions": [1, "two", {"description": "ok", "amount": 1}]});
        assert_eq!(decode_transactions(v.as_object().unwrap()).len(), 1);
    }
}
