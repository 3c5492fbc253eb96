use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::models::ItemAssignment;

/// One purchased entry on the bill, parsed from OCR text or entered by hand.
///
/// Invariant: `total_price == round2(quantity * unit_price)` unless the user
/// overrode the total directly (`manually_edited`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    pub category: Option<String>,
    pub is_shared: bool,
    /// The receipt line this item was extracted from, for review in the editor.
    pub extracted_text: String,
    pub manually_edited: bool,
}

impl LineItem {
    /// A parser-created item. User edits flip `manually_edited` elsewhere.
    pub fn parsed(
        id: String,
        name: String,
        quantity: BigDecimal,
        unit_price: BigDecimal,
        total_price: BigDecimal,
        extracted_text: String,
    ) -> Self {
        Self {
            id,
            name,
            quantity,
            unit_price,
            total_price,
            category: None,
            is_shared: false,
            extracted_text,
            manually_edited: false,
        }
    }
}

/// Remove a line item and cascade removal of its assignments.
/// Returns the surviving items and assignments; unknown ids are a no-op.
pub fn remove_line_item(
    items: &[LineItem],
    assignments: &[ItemAssignment],
    id: &str,
) -> (Vec<LineItem>, Vec<ItemAssignment>) {
    let items = items.iter().filter(|it| it.id != id).cloned().collect();
    let assignments = assignments
        .iter()
        .filter(|a| a.line_item_id != id)
        .cloned()
        .collect();
    (items, assignments)
}
