//! Decimal-exact allocation of bill costs to people.
//!
//! Every monetary path stays in `BigDecimal`; binary floating point never
//! appears. Monetary results round HALF_UP to the money scale (2 dp by
//! default), share percentages to the share scale (4 dp). Tax and tip are
//! allocated proportionally to each person's item subtotal, never split
//! equally.
//!
//! The engine never raises on bad or incomplete data: malformed decimals
//! degrade to zero, dangling item references produce zero amounts, and
//! incomplete share coverage is reported through `validate_assignments`.
//! The one fail-fast path is an invalid scale configuration.

use bigdecimal::{BigDecimal, One, RoundingMode, Zero};
use chrono::Utc;
use indexmap::IndexMap;
use tracing::debug;

use crate::models::{
    AssignmentIssue, AssignmentValidation, BillSummary, ItemAssignment, LineItem, Person,
};

pub struct AllocationEngine {
    money_scale: i64,
    share_scale: i64,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self {
            money_scale: 2,
            share_scale: 4,
        }
    }
}

impl AllocationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-default rounding scales. An out-of-range scale is a caller
    /// contract violation and fails fast instead of producing quiet garbage.
    pub fn with_scales(money_scale: i64, share_scale: i64) -> Result<Self, String> {
        if !(0..=12).contains(&money_scale) || !(0..=12).contains(&share_scale) {
            return Err(format!(
                "invalid rounding scales: money={}, share={}",
                money_scale, share_scale
            ));
        }
        Ok(Self {
            money_scale,
            share_scale,
        })
    }

    fn round_money(&self, v: &BigDecimal) -> BigDecimal {
        v.with_scale_round(self.money_scale, RoundingMode::HalfUp)
    }

    fn round_share(&self, v: &BigDecimal) -> BigDecimal {
        v.with_scale_round(self.share_scale, RoundingMode::HalfUp)
    }

    fn zero_money(&self) -> BigDecimal {
        BigDecimal::zero().with_scale(self.money_scale)
    }

    /// Lenient parse: a malformed decimal degrades to zero at point of use.
    fn parse_decimal(&self, s: &str) -> BigDecimal {
        s.trim().parse().unwrap_or_else(|_| BigDecimal::zero())
    }

    // --- String primitives for the editor layer ---

    pub fn add(&self, a: &str, b: &str) -> String {
        self.round_money(&(self.parse_decimal(a) + self.parse_decimal(b)))
            .to_string()
    }

    pub fn subtract(&self, a: &str, b: &str) -> String {
        self.round_money(&(self.parse_decimal(a) - self.parse_decimal(b)))
            .to_string()
    }

    pub fn multiply(&self, a: &str, b: &str) -> String {
        self.round_money(&(self.parse_decimal(a) * self.parse_decimal(b)))
            .to_string()
    }

    /// Division by zero yields zero money, not a fault.
    pub fn divide(&self, a: &str, b: &str) -> String {
        let divisor = self.parse_decimal(b);
        if divisor.is_zero() {
            return self.zero_money().to_string();
        }
        self.round_money(&(self.parse_decimal(a) / divisor))
            .to_string()
    }

    // --- Item-level operations ---

    pub fn line_item_total(&self, quantity: &BigDecimal, unit_price: &BigDecimal) -> BigDecimal {
        self.round_money(&(quantity * unit_price))
    }

    /// Order-independent sum of item totals.
    pub fn subtotal(&self, items: &[LineItem]) -> BigDecimal {
        let sum = items
            .iter()
            .fold(BigDecimal::zero(), |acc, it| acc + &it.total_price);
        self.round_money(&sum)
    }

    /// Recompute each assignment's monetary amount from its share. An
    /// assignment referencing a missing line item degrades to zero rather
    /// than erroring.
    pub fn assignment_amounts(
        &self,
        items: &[LineItem],
        assignments: &[ItemAssignment],
    ) -> Vec<ItemAssignment> {
        assignments
            .iter()
            .map(|a| {
                let assigned_amount = items
                    .iter()
                    .find(|it| it.id == a.line_item_id)
                    .map(|it| self.round_money(&(&it.total_price * &a.share_percentage)))
                    .unwrap_or_else(|| self.zero_money());
                ItemAssignment {
                    assigned_amount,
                    ..a.clone()
                }
            })
            .collect()
    }

    // --- Person-level operations ---

    /// Recompute every person's derived fields. Tax and tip are carried in
    /// proportion to each person's share of the item subtotal. A zero
    /// subtotal or an empty assignment set zeroes everyone explicitly; no
    /// division ever runs against zero.
    pub fn person_totals(
        &self,
        items: &[LineItem],
        assignments: &[ItemAssignment],
        people: &[Person],
        tax: &BigDecimal,
        tip: &BigDecimal,
    ) -> Vec<Person> {
        let subtotal = self.subtotal(items);
        if subtotal.is_zero() || assignments.is_empty() {
            return people
                .iter()
                .map(|p| Person {
                    subtotal: self.zero_money(),
                    tax_amount: self.zero_money(),
                    tip_amount: self.zero_money(),
                    total_owed: self.zero_money(),
                    ..p.clone()
                })
                .collect();
        }

        let totals: Vec<Person> = people
            .iter()
            .map(|p| {
                let person_subtotal = self.round_money(
                    &assignments
                        .iter()
                        .filter(|a| a.person_id == p.id)
                        .fold(BigDecimal::zero(), |acc, a| acc + &a.assigned_amount),
                );
                let percentage = &person_subtotal / &subtotal;
                let tax_amount = self.round_money(&(tax * &percentage));
                let tip_amount = self.round_money(&(tip * &percentage));
                let total_owed =
                    self.round_money(&(&person_subtotal + &tax_amount + &tip_amount));
                Person {
                    subtotal: person_subtotal,
                    tax_amount,
                    tip_amount,
                    total_owed,
                    ..p.clone()
                }
            })
            .collect();

        debug!(people = totals.len(), subtotal = %subtotal, "person totals recomputed");
        totals
    }

    /// Check that every line item is fully covered: at least one assignment
    /// and shares summing to exactly one. Reports findings in item order;
    /// never auto-corrects.
    pub fn validate_assignments(
        &self,
        items: &[LineItem],
        assignments: &[ItemAssignment],
    ) -> AssignmentValidation {
        let expected = BigDecimal::one().with_scale(self.share_scale);

        let mut coverage: IndexMap<&str, (usize, BigDecimal)> = items
            .iter()
            .map(|it| (it.id.as_str(), (0usize, BigDecimal::zero())))
            .collect();
        for a in assignments {
            if let Some((count, sum)) = coverage.get_mut(a.line_item_id.as_str()) {
                *count += 1;
                *sum = &*sum + &a.share_percentage;
            }
        }

        let mut errors = Vec::new();
        for it in items {
            let (count, sum) = &coverage[it.id.as_str()];
            if *count == 0 {
                errors.push(AssignmentIssue::Unassigned {
                    line_item_id: it.id.clone(),
                    name: it.name.clone(),
                });
            } else if *sum != expected {
                errors.push(AssignmentIssue::ShareMismatch {
                    line_item_id: it.id.clone(),
                    name: it.name.clone(),
                    expected: expected.clone(),
                    actual: sum.with_scale_round(self.share_scale, RoundingMode::HalfUp),
                });
            }
        }

        AssignmentValidation {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Split every item evenly across all people: each share is
    /// round4(1 / people_count). For counts where the division does not
    /// terminate in the share scale (e.g. 3 people -> 0.3333 each) the
    /// shares sum to 0.9999, and `validate_assignments` will flag that
    /// residue rather than anything redistributing it silently.
    pub fn equal_assignments(
        &self,
        items: &[LineItem],
        people: &[Person],
    ) -> Vec<ItemAssignment> {
        if people.is_empty() {
            return Vec::new();
        }
        let share = self.round_share(
            &(BigDecimal::one() / BigDecimal::from(people.len() as u64)),
        );
        let drafts: Vec<ItemAssignment> = items
            .iter()
            .flat_map(|it| {
                people.iter().map(|p| ItemAssignment {
                    line_item_id: it.id.clone(),
                    person_id: p.id.clone(),
                    share_percentage: share.clone(),
                    assigned_amount: self.zero_money(),
                })
            })
            .collect();
        self.assignment_amounts(items, &drafts)
    }

    /// Derived whole-bill snapshot for the summary layer.
    pub fn bill_summary(
        &self,
        receipt_id: &str,
        items: &[LineItem],
        people: &[Person],
        tax: &BigDecimal,
        tip: &BigDecimal,
    ) -> BillSummary {
        let subtotal = self.subtotal(items);
        let total_amount = self.round_money(&(&subtotal + tax + tip));
        BillSummary {
            receipt_id: receipt_id.to_string(),
            subtotal,
            tax_amount: self.round_money(tax),
            tip_amount: self.round_money(tip),
            total_amount,
            people_count: people.len(),
            calculated_at: Utc::now(),
        }
    }
}
