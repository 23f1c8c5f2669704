//! Transaction, batch and pagination records shared across the engine.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::classifier::Classification;

/// Installment descriptor attached to card purchases split across bills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub current: u32,
    pub total: u32,
    /// Description of the original purchase, when the server reports it.
    pub description: Option<String>,
}

impl Installment {
    pub fn label(&self) -> String {
        format!("Parcela {}/{}", self.current, self.total)
    }
}

/// A transaction exactly as the server reported it for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub date: NaiveDateTime,
    pub description: String,
    /// Positive = credit/inflow, negative = debit/outflow.
    pub amount: f64,
    pub correlation_id: Option<String>,
    pub category_id: Option<String>,
    pub installment: Option<Installment>,
}

impl RawTransaction {
    pub fn new(date: NaiveDateTime, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            correlation_id: None,
            category_id: None,
            installment: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_category_id(mut self, id: impl Into<String>) -> Self {
        self.category_id = Some(id.into());
        self
    }

    pub fn with_installment(mut self, current: u32, total: u32) -> Self {
        self.installment = Some(Installment {
            current,
            total,
            description: None,
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BillStatus {
    Open,
    Closed,
    Paid,
}

/// Metadata of the credit-card bill a transaction belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillMeta {
    pub bill_id: String,
    pub month: String,
    pub total: f64,
    pub due_date: Option<NaiveDate>,
    pub status: BillStatus,
}

/// Source grouping of raw transactions: a statement extract or a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    pub transactions: Vec<RawTransaction>,
    pub bill: Option<BillMeta>,
}

impl Batch {
    pub fn new(id: impl Into<String>, transactions: Vec<RawTransaction>) -> Self {
        Self {
            id: id.into(),
            transactions,
            bill: None,
        }
    }

    pub fn with_bill(mut self, bill: BillMeta) -> Self {
        self.bill = Some(bill);
        self
    }
}

/// Engine-owned transaction record with a stable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTransaction {
    /// Unique within one context's accumulated list.
    pub id: String,
    pub batch_id: String,
    pub date: NaiveDateTime,
    pub description: String,
    pub amount: f64,
    pub correlation_id: Option<String>,
    pub category_id: Option<String>,
    /// Resolved label; absent until a category map is applied.
    pub category: Option<String>,
    pub installment_label: Option<String>,
    pub classification: Classification,
    pub bill: Option<BillMeta>,
}

impl CanonicalTransaction {
    pub fn is_credit(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_debit(&self) -> bool {
        self.amount < 0.0
    }
}

/// Server-reported pagination metadata. Replaced wholesale on every response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// 1-based; 0 means the server did not report it.
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    /// Bill pages only.
    pub total_amount: Option<f64>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Aggregate figures for the period, passed through from the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub opening_balance: f64,
    pub closing_balance: f64,
    pub total_in: f64,
    pub total_out: f64,
}

/// One decoded page response, before normalization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPage {
    pub batches: Vec<Batch>,
    pub pagination: PaginationMeta,
    pub summary: Option<Summary>,
}

impl RawPage {
    pub fn transaction_count(&self) -> usize {
        self.batches.iter().map(|b| b.transactions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn installment_label_format() {
        let raw = RawTransaction::new(at(2026, 3, 1), "LOJA X", -100.0).with_installment(2, 10);
        assert_eq!(raw.installment.unwrap().label(), "Parcela 2/10");
    }

    #[test]
    fn raw_page_counts_across_batches() {
        let page = RawPage {
            batches: vec![
                Batch::new("e1", vec![RawTransaction::new(at(2026, 3, 1), "a", 1.0)]),
                Batch::new("e2", vec![]),
                Batch::new(
                    "e3",
                    vec![
                        RawTransaction::new(at(2026, 3, 2), "b", -1.0),
                        RawTransaction::new(at(2026, 3, 3), "c", -2.0),
                    ],
                ),
            ],
            ..Default::default()
        };
        assert_eq!(page.transaction_count(), 3);
        assert!(!page.is_empty());
        assert!(RawPage::default().is_empty());
    }

    #[test]
    fn bill_status_is_uppercase_on_the_wire() {
        let json = serde_json::to_string(&BillStatus::Paid).unwrap();
        assert_eq!(json, "\"PAID\"");
        let back: BillStatus = serde_json::from_str("\"CLOSED\"").unwrap();
        assert_eq!(back, BillStatus::Closed);
    }
}
