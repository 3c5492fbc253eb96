use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

/// A participant in the bill split.
///
/// The four decimal fields are derived: `AllocationEngine::person_totals`
/// recomputes them whenever assignments change. They are never authoritative
/// on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub subtotal: BigDecimal,
    pub tax_amount: BigDecimal,
    pub tip_amount: BigDecimal,
    pub total_owed: BigDecimal,
    /// Display color assigned by the editor layer.
    pub color: String,
}

impl Person {
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        let zero = BigDecimal::zero().with_scale(2);
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: None,
            subtotal: zero.clone(),
            tax_amount: zero.clone(),
            tip_amount: zero.clone(),
            total_owed: zero,
            color: color.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_person_owes_nothing() {
        let person = Person::new("p1", "Nok", "#e74c3c");
        assert_eq!(person.total_owed.to_string(), "0.00");
        assert_eq!(person.subtotal.to_string(), "0.00");
        assert!(person.email.is_none());
    }
}
