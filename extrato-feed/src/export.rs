//! CSV export of the visible list.

use std::io;

use anyhow::Result;
use serde::Serialize;

use crate::feed::FeedView;

#[derive(Serialize)]
struct CsvRow<'a> {
    date: String,
    description: &'a str,
    amount: String,
    kind: &'a str,
    counterparty: &'a str,
    category: &'a str,
    installment: &'a str,
}

/// Write `view.transactions` in display order. Returns the row count.
pub fn write_csv<W: io::Write>(view: &FeedView, writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for tx in &view.transactions {
        wtr.serialize(CsvRow {
            date: tx.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            description: &tx.description,
            amount: format!("{:.2}", tx.amount),
            kind: &tx.classification.label,
            counterparty: &tx.classification.counterparty,
            category: tx.category.as_deref().unwrap_or(""),
            installment: tx.installment_label.as_deref().unwrap_or(""),
        })?;
    }
    wtr.flush()?;
    Ok(view.transactions.len())
}
