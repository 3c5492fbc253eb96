use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::LineItem;

/// Derived snapshot of the whole bill for the summary layer.
/// Recomputed whole by `AllocationEngine::bill_summary`, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub receipt_id: String,
    pub subtotal: BigDecimal,
    pub tax_amount: BigDecimal,
    pub tip_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub people_count: usize,
    pub calculated_at: DateTime<Utc>,
}

/// Parser output: the best-effort structure recovered from one block of OCR
/// text, plus a 0-100 confidence score. Converted into persistent records by
/// the editor layer and then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReceipt {
    pub line_items: Vec<LineItem>,
    pub subtotal: Option<BigDecimal>,
    pub tax_amount: Option<BigDecimal>,
    pub tip_amount: Option<BigDecimal>,
    pub total_amount: Option<BigDecimal>,
    pub confidence: u8,
    pub raw_text: String,
}

impl ParsedReceipt {
    /// An empty result for unusable input. Not an error: confidence 0 tells
    /// the caller everything it needs.
    pub fn empty(raw_text: &str) -> Self {
        Self {
            line_items: Vec::new(),
            subtotal: None,
            tax_amount: None,
            tip_amount: None,
            total_amount: None,
            confidence: 0,
            raw_text: raw_text.to_string(),
        }
    }
}
