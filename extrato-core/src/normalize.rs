//! Raw server rows -> canonical transactions with stable ids.

use crate::classifier::classify;
use crate::model::{Batch, CanonicalTransaction, RawTransaction};

/// Build the canonical record for one raw row.
///
/// Id rule:
/// - with a correlation id: `{batch}-{correlation}-{index}`
/// - without: batch, index, date, description and amount joined, which stays
///   deterministic for the same input page
///
/// Never fails; missing pieces are coerced.
pub fn normalize(
    batch: &Batch,
    batch_index: usize,
    raw: &RawTransaction,
    index_in_batch: usize,
) -> CanonicalTransaction {
    let batch_id = batch_key(batch, batch_index);

    let id = match raw
        .correlation_id
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        Some(correlation) => format!("{batch_id}-{correlation}-{index_in_batch}"),
        None => format!(
            "{batch_id}-{index_in_batch}-{}-{}-{:.2}",
            raw.date.format("%Y%m%dT%H%M%S"),
            raw.description.trim(),
            raw.amount
        ),
    };

    CanonicalTransaction {
        id,
        batch_id,
        date: raw.date,
        description: raw.description.clone(),
        amount: raw.amount,
        correlation_id: raw.correlation_id.clone(),
        category_id: raw.category_id.clone(),
        category: None,
        installment_label: raw.installment.as_ref().map(|i| i.label()),
        classification: classify(&raw.description, raw.amount),
        bill: batch.bill.clone(),
    }
}

/// All rows of one batch, in order. An empty batch yields nothing.
pub fn normalize_batch(batch: &Batch, batch_index: usize) -> Vec<CanonicalTransaction> {
    batch
        .transactions
        .iter()
        .enumerate()
        .map(|(i, raw)| normalize(batch, batch_index, raw, i))
        .collect()
}

/// All rows of a page, batch by batch.
pub fn normalize_batches(batches: &[Batch]) -> Vec<CanonicalTransaction> {
    batches
        .iter()
        .enumerate()
        .flat_map(|(bi, batch)| normalize_batch(batch, bi))
        .collect()
}

fn batch_key(batch: &Batch, batch_index: usize) -> String {
    let id = batch.id.trim();
    if id.is_empty() {
        format!("batch{batch_index}")
    } else {
        id.to_string()
    }
}
