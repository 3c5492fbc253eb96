//! Parse normalized OCR text into a structured receipt.
//!
//! OCR output from Thai/English receipts has no reliable structure, so
//! extraction runs as an ordered chain of passes, each looser than the one
//! before it:
//! 1. labeled summary fields (subtotal / tax / tip / total)
//! 2. shaped line items ("name....price", "name   price")
//! 3. aggressive fallback (last decimal token on the line is the price)
//! 4. last resort (any numeric token on a non-noise line), only when
//!    passes 2-3 found nothing
//!
//! The pass order is a load-bearing contract: per line, strategies compose
//! first-success-wins. Parsing never fails; the worst outcome is an empty
//! result with confidence 0.

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use regex::Regex;
use tracing::debug;

use crate::config::ParserConfig;
use crate::models::{LineItem, ParsedReceipt};
use crate::service::normalizer;

const AMOUNT: &str = r"([0-9]+(?:\.[0-9]{1,2})?)";
/// Item prices must carry an explicit decimal part; bare integers are only
/// promoted to prices by the last-resort pass.
const ITEM_PRICE: &str = r"([0-9]+\.[0-9]{1,2})";

struct Patterns {
    /// Ordered label alternatives per summary field (English, then Thai).
    subtotal: Vec<Regex>,
    tax: Vec<Regex>,
    tip: Vec<Regex>,
    total: Vec<Regex>,
    dotted_item: Regex,
    column_item: Regex,
    /// A token with an explicit decimal part, e.g. "180.00".
    decimal_token: Regex,
    /// Any numeric token, decimal part optional.
    any_number: Regex,
    qty_prefix: Regex,
    qty_suffix: Regex,
    /// Header/footer noise the last-resort pass must not mine for prices.
    noise: Vec<Regex>,
}

impl Patterns {
    fn compile() -> Self {
        let labeled = |label: &str| Regex::new(&format!(r"{label}\D*{AMOUNT}")).unwrap();
        Self {
            subtotal: vec![
                labeled(r"(?i)\bsub\s*-?\s*total\b"),
                labeled(r"(?:ยอดรวมย่อย|รวมย่อย)"),
            ],
            tax: vec![
                labeled(r"(?i)\b(?:tax|vat)\b"),
                labeled(r"(?:ภาษีมูลค่าเพิ่ม|ภาษี)"),
            ],
            tip: vec![
                labeled(r"(?i)\b(?:tip|service\s*charge)\b"),
                labeled(r"(?:ค่าบริการ|ทิป)"),
            ],
            total: vec![
                labeled(r"(?i)\b(?:grand\s*total|total|amount\s*due)\b"),
                labeled(r"(?:ยอดรวมทั้งสิ้น|รวมทั้งสิ้น|รวมทั้งหมด|ยอดสุทธิ|ยอดรวม|รวม)"),
            ],
            dotted_item: Regex::new(&format!(r"^(.+?)\.{{2,}}\s*{ITEM_PRICE}\s*$")).unwrap(),
            column_item: Regex::new(&format!(r"^(.+?)\s+{ITEM_PRICE}\s*$")).unwrap(),
            decimal_token: Regex::new(r"[0-9]+\.[0-9]{1,2}").unwrap(),
            any_number: Regex::new(r"[0-9]+(?:\.[0-9]{1,2})?").unwrap(),
            qty_prefix: Regex::new(r"^([0-9]+)\s*[xX×]\s*(\S.*)$").unwrap(),
            qty_suffix: Regex::new(r"^(.+?)\s*[xX×]\s*([0-9]+)$").unwrap(),
            noise: vec![
                Regex::new(r"(?i)www\.|https?://|\.com|\.co\.th|@").unwrap(),
                Regex::new(r"(?i)\btel\b|โทร|[0-9]{2,3}-[0-9]{3}-[0-9]{4}").unwrap(),
                Regex::new(r"[0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{2,4}").unwrap(),
                Regex::new(r"(?i)thank\s*you|welcome|\breceipt\b|ขอบคุณ|ยินดีต้อนรับ|ใบเสร็จ")
                    .unwrap(),
            ],
        }
    }
}

#[derive(Default)]
struct SummaryFields {
    subtotal: Option<BigDecimal>,
    tax: Option<BigDecimal>,
    tip: Option<BigDecimal>,
    total: Option<BigDecimal>,
}

pub struct ReceiptParser {
    config: ParserConfig,
    patterns: Patterns,
    tolerance: BigDecimal,
}

impl ReceiptParser {
    pub fn new(config: ParserConfig) -> Self {
        let tolerance = config
            .reconcile_tolerance
            .parse()
            .unwrap_or_else(|_| "0.01".parse().unwrap());
        Self {
            config,
            patterns: Patterns::compile(),
            tolerance,
        }
    }

    /// Parse one block of recognized text. Never panics and never errors:
    /// unparseable lines are skipped and the result may be empty.
    pub fn parse(&self, raw_text: &str) -> ParsedReceipt {
        let text = normalizer::normalize(raw_text);
        let trimmed = text.trim();

        if trimmed.chars().count() < self.config.short_input_limit {
            return self.parse_degenerate(raw_text, trimmed);
        }

        let lines: Vec<&str> = trimmed.lines().filter(|l| !l.is_empty()).collect();
        let mut claimed = vec![false; lines.len()];

        // Pass 1: labeled summary fields. First match per field wins; later
        // lines never overwrite an already-found field.
        let mut summary = SummaryFields::default();
        for (i, line) in lines.iter().enumerate() {
            if self.claim_summary_line(line, &mut summary) {
                claimed[i] = true;
            }
        }

        // Passes 2-3, first-success-wins per line.
        let mut items: Vec<LineItem> = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            let candidate = self
                .item_from_dotted_leader(line)
                .or_else(|| self.item_from_columns(line))
                .or_else(|| self.item_from_trailing_price(line));
            if let Some((name, price)) = candidate {
                items.push(self.finalize_item(items.len(), name, price, line));
            }
        }

        // Pass 4: only when the structured passes came up empty.
        if items.is_empty() {
            for (i, line) in lines.iter().enumerate() {
                if claimed[i] || self.is_noise(line) {
                    continue;
                }
                if let Some((name, price)) = self.item_from_any_number(line) {
                    items.push(self.finalize_item(items.len(), name, price, line));
                }
            }
        }

        // A receipt with items but no printed subtotal still has one: the
        // item sum. Needed for reconciliation against the stated total.
        if summary.subtotal.is_none() && !items.is_empty() {
            let sum = items
                .iter()
                .fold(BigDecimal::zero(), |acc, it| acc + &it.total_price);
            summary.subtotal = Some(round2(&sum));
        }

        let confidence = self.score_confidence(&items, &summary);
        debug!(
            items = items.len(),
            confidence, "receipt parse complete"
        );

        ParsedReceipt {
            line_items: items,
            subtotal: summary.subtotal,
            tax_amount: summary.tax,
            tip_amount: summary.tip,
            total_amount: summary.total,
            confidence,
            raw_text: raw_text.to_string(),
        }
    }

    /// Inputs too short for the passes: salvage at most one generic item
    /// from the last numeric token, if any.
    fn parse_degenerate(&self, raw_text: &str, trimmed: &str) -> ParsedReceipt {
        let Some(token) = self.patterns.any_number.find_iter(trimmed).last() else {
            return ParsedReceipt::empty(raw_text);
        };
        let price = round2(&parse_decimal(&pad_decimal(token.as_str())));
        let item = LineItem::parsed(
            "item-1".to_string(),
            "Receipt Item".to_string(),
            BigDecimal::from(1u32),
            price.clone(),
            price,
            trimmed.to_string(),
        );
        ParsedReceipt {
            line_items: vec![item],
            confidence: 10,
            ..ParsedReceipt::empty(raw_text)
        }
    }

    /// Try each summary field in order; a matching line is claimed even when
    /// its field is already filled, so duplicates never become line items.
    fn claim_summary_line(&self, line: &str, summary: &mut SummaryFields) -> bool {
        if let Some(v) = match_amount(&self.patterns.subtotal, line) {
            summary.subtotal.get_or_insert(v);
            return true;
        }
        if let Some(v) = match_amount(&self.patterns.tax, line) {
            summary.tax.get_or_insert(v);
            return true;
        }
        if let Some(v) = match_amount(&self.patterns.tip, line) {
            summary.tip.get_or_insert(v);
            return true;
        }
        if let Some(v) = match_amount(&self.patterns.total, line) {
            summary.total.get_or_insert(v);
            return true;
        }
        false
    }

    /// Pass 2a: "Pad Thai.......180.00"
    fn item_from_dotted_leader(&self, line: &str) -> Option<(String, BigDecimal)> {
        let caps = self.patterns.dotted_item.captures(line)?;
        let name = clean_name(&caps[1]);
        if !self.acceptable_name(&name) {
            return None;
        }
        Some((name, round2(&parse_decimal(&caps[2]))))
    }

    /// Pass 2b: "Pad Thai   180.00"
    fn item_from_columns(&self, line: &str) -> Option<(String, BigDecimal)> {
        let caps = self.patterns.column_item.captures(line)?;
        let name = clean_name(&caps[1]);
        if !self.acceptable_name(&name) {
            return None;
        }
        Some((name, round2(&parse_decimal(&caps[2]))))
    }

    /// Pass 3: take the last decimal-bearing token as the price and whatever
    /// precedes it as the name, synthesizing a placeholder when the name is
    /// unusable.
    fn item_from_trailing_price(&self, line: &str) -> Option<(String, BigDecimal)> {
        let m = self.patterns.decimal_token.find_iter(line).last()?;
        let price = round2(&parse_decimal(m.as_str()));
        let name = clean_name(&line[..m.start()]);
        let name = if self.acceptable_name(&name) {
            name
        } else {
            placeholder_name(line)
        };
        Some((name, price))
    }

    /// Pass 4: any numeric token at all, preferring decimal-bearing tokens,
    /// else a bare integer large enough to plausibly be a price.
    fn item_from_any_number(&self, line: &str) -> Option<(String, BigDecimal)> {
        let tokens: Vec<_> = self.patterns.any_number.find_iter(line).collect();
        let chosen = tokens
            .iter()
            .rev()
            .find(|m| m.as_str().contains('.'))
            .or_else(|| {
                tokens.iter().rev().find(|m| {
                    m.as_str()
                        .parse::<u64>()
                        .map(|v| v > u64::from(self.config.min_integer_price))
                        .unwrap_or(false)
                })
            })?;
        let price = round2(&parse_decimal(&pad_decimal(chosen.as_str())));
        let remainder = clean_name(&line[..chosen.start()]);
        let name = if self.acceptable_name(&remainder) {
            remainder
        } else if remainder.is_empty() {
            "Receipt Item".to_string()
        } else {
            placeholder_name(line)
        };
        Some((name, price))
    }

    fn acceptable_name(&self, name: &str) -> bool {
        name.chars().count() >= self.config.min_name_chars && !purely_numeric(name)
    }

    /// Header/footer lines the last-resort pass must skip: shouting caps,
    /// URLs and emails, phone numbers, dates, boilerplate greetings.
    fn is_noise(&self, line: &str) -> bool {
        let all_caps = line.chars().any(|c| c.is_ascii_uppercase())
            && !line
                .chars()
                .any(|c| c.is_lowercase() || c.is_ascii_digit());
        all_caps || self.patterns.noise.iter().any(|re| re.is_match(line))
    }

    /// Quantity markers on the candidate name: "2 x Pad Thai" or
    /// "Pad Thai x 2", ASCII x or the multiplication sign. Unit price is
    /// always derived from the line total, never parsed independently.
    fn finalize_item(
        &self,
        index: usize,
        name: String,
        price: BigDecimal,
        line: &str,
    ) -> LineItem {
        let (quantity, name) = self.infer_quantity(&name);
        let qty = BigDecimal::from(quantity);
        let unit_price = if quantity == 1 {
            price.clone()
        } else {
            round2(&(&price / &qty))
        };
        LineItem::parsed(
            format!("item-{}", index + 1),
            name,
            qty,
            unit_price,
            price,
            line.to_string(),
        )
    }

    fn infer_quantity(&self, name: &str) -> (u32, String) {
        if let Some(caps) = self.patterns.qty_prefix.captures(name) {
            let qty = caps[1].parse::<u32>().unwrap_or(1).max(1);
            return (qty, clean_name(&caps[2]));
        }
        if let Some(caps) = self.patterns.qty_suffix.captures(name) {
            let qty = caps[2].parse::<u32>().unwrap_or(1).max(1);
            return (qty, clean_name(&caps[1]));
        }
        (1, name.to_string())
    }

    /// Up to 60 points from item count, the rest from summary fields and a
    /// reconciliation bonus. Clamped to 0..=100.
    fn score_confidence(&self, items: &[LineItem], summary: &SummaryFields) -> u8 {
        let mut score = (items.len().min(3) * 20) as i32;
        if summary.subtotal.is_some() {
            score += 15;
        }
        if summary.tax.is_some() {
            score += 10;
        }
        if summary.total.is_some() {
            score += 15;
        }
        if let (Some(subtotal), Some(total)) = (&summary.subtotal, &summary.total) {
            let tax = summary.tax.clone().unwrap_or_else(BigDecimal::zero);
            if ((subtotal + tax) - total).abs() <= self.tolerance {
                score += 10;
            }
        }
        score.clamp(0, 100) as u8
    }
}

fn match_amount(patterns: &[Regex], line: &str) -> Option<BigDecimal> {
    patterns
        .iter()
        .find_map(|re| re.captures(line))
        .map(|caps| round2(&parse_decimal(&caps[1])))
}

/// Lenient decimal parse: malformed input degrades to zero at point of use.
fn parse_decimal(s: &str) -> BigDecimal {
    s.trim().parse().unwrap_or_else(|_| BigDecimal::zero())
}

fn round2(v: &BigDecimal) -> BigDecimal {
    v.with_scale_round(2, RoundingMode::HalfUp)
}

/// Pad a bare integer token into money shape: "7" -> "7.00".
fn pad_decimal(token: &str) -> String {
    if token.contains('.') {
        token.to_string()
    } else {
        format!("{token}.00")
    }
}

fn clean_name(s: &str) -> String {
    s.trim()
        .trim_matches(|c: char| c == '.' || c == ':' || c == '-' || c.is_whitespace())
        .to_string()
}

fn purely_numeric(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',' || c.is_whitespace())
}

fn placeholder_name(line: &str) -> String {
    let prefix: String = line.chars().take(10).collect();
    format!("Item ({})", prefix.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    fn parser() -> ReceiptParser {
        ReceiptParser::new(ParserConfig::default())
    }

    #[test]
    fn test_simple_receipt_with_total() {
        let receipt = parser().parse("Pad Thai 180.00\nTotal 180.00");
        assert_eq!(receipt.line_items.len(), 1);
        assert_eq!(receipt.line_items[0].name, "Pad Thai");
        assert_eq!(receipt.line_items[0].total_price.to_string(), "180.00");
        assert_eq!(
            receipt.total_amount.as_ref().map(|v| v.to_string()),
            Some("180.00".to_string())
        );
        assert!(receipt.confidence >= 60);
    }

    #[test]
    fn test_empty_input() {
        let receipt = parser().parse("");
        assert!(receipt.line_items.is_empty());
        assert_eq!(receipt.confidence, 0);
    }

    #[test]
    fn test_short_input_synthesizes_generic_item() {
        let receipt = parser().parse("7");
        assert_eq!(receipt.line_items.len(), 1);
        assert_eq!(receipt.line_items[0].name, "Receipt Item");
        assert_eq!(receipt.line_items[0].total_price.to_string(), "7.00");
        assert_eq!(receipt.confidence, 10);
    }

    #[test]
    fn test_short_input_without_number_is_empty() {
        let receipt = parser().parse("ab");
        assert!(receipt.line_items.is_empty());
        assert_eq!(receipt.confidence, 0);
    }

    #[test]
    fn test_dotted_leader_items() {
        let receipt = parser().parse("Green Curry......120.00\nSpring Rolls....85.50");
        assert_eq!(receipt.line_items.len(), 2);
        assert_eq!(receipt.line_items[0].name, "Green Curry");
        assert_eq!(receipt.line_items[0].total_price.to_string(), "120.00");
        assert_eq!(receipt.line_items[1].name, "Spring Rolls");
        assert_eq!(receipt.line_items[1].total_price.to_string(), "85.50");
    }

    #[test]
    fn test_summary_fields_claimed_before_items() {
        let text = "Pad Thai 180.00\nSubtotal 180.00\nVAT 12.60\nTotal 192.60";
        let receipt = parser().parse(text);
        assert_eq!(receipt.line_items.len(), 1);
        assert_eq!(
            receipt.subtotal.as_ref().map(|v| v.to_string()),
            Some("180.00".to_string())
        );
        assert_eq!(
            receipt.tax_amount.as_ref().map(|v| v.to_string()),
            Some("12.60".to_string())
        );
        assert_eq!(
            receipt.total_amount.as_ref().map(|v| v.to_string()),
            Some("192.60".to_string())
        );
        // 1 item + subtotal + tax + total + reconciliation bonus
        assert_eq!(receipt.confidence, 70);
    }

    #[test]
    fn test_thai_labels_and_digits() {
        let text = "ข้าวผัดกุ้ง ๙๐.๐๐\nภาษี 6.30\nรวมทั้งสิ้น 96.30";
        let receipt = parser().parse(text);
        assert_eq!(receipt.line_items.len(), 1);
        assert_eq!(receipt.line_items[0].name, "ข้าวผัดกุ้ง");
        assert_eq!(receipt.line_items[0].total_price.to_string(), "90.00");
        assert_eq!(
            receipt.tax_amount.as_ref().map(|v| v.to_string()),
            Some("6.30".to_string())
        );
        assert_eq!(
            receipt.total_amount.as_ref().map(|v| v.to_string()),
            Some("96.30".to_string())
        );
    }

    #[test]
    fn test_first_summary_match_wins() {
        let text = "Total 100.00\nTotal 999.99";
        let receipt = parser().parse(text);
        assert_eq!(
            receipt.total_amount.as_ref().map(|v| v.to_string()),
            Some("100.00".to_string())
        );
        // The duplicate line is claimed, not turned into an item.
        assert!(receipt.line_items.is_empty());
    }

    #[test]
    fn test_subtotal_never_mistaken_for_total() {
        let receipt = parser().parse("Subtotal 100.00\nKhao Soi 100.00");
        assert_eq!(
            receipt.subtotal.as_ref().map(|v| v.to_string()),
            Some("100.00".to_string())
        );
        assert!(receipt.total_amount.is_none());
    }

    #[test]
    fn test_quantity_prefix() {
        let receipt = parser().parse("2 x Pad Thai 180.00\nTotal 180.00");
        let item = &receipt.line_items[0];
        assert_eq!(item.name, "Pad Thai");
        assert_eq!(item.quantity.to_string(), "2");
        assert_eq!(item.unit_price.to_string(), "90.00");
        assert_eq!(item.total_price.to_string(), "180.00");
    }

    #[test]
    fn test_quantity_suffix_with_multiplication_sign() {
        let receipt = parser().parse("Singha Beer × 3 270.00\nTotal 270.00");
        let item = &receipt.line_items[0];
        assert_eq!(item.name, "Singha Beer");
        assert_eq!(item.quantity.to_string(), "3");
        assert_eq!(item.unit_price.to_string(), "90.00");
    }

    #[test]
    fn test_aggressive_fallback_price_not_at_line_end() {
        let receipt = parser().parse("Mango Sticky Rice 95.00 pcs 1\nTotal 95.00");
        assert_eq!(receipt.line_items.len(), 1);
        assert_eq!(receipt.line_items[0].name, "Mango Sticky Rice");
        assert_eq!(receipt.line_items[0].total_price.to_string(), "95.00");
    }

    #[test]
    fn test_aggressive_fallback_placeholder_name() {
        let receipt = parser().parse("x 45.00 somthing\nTotal 45.00");
        assert_eq!(receipt.line_items.len(), 1);
        assert!(receipt.line_items[0].name.starts_with("Item ("));
        assert_eq!(receipt.line_items[0].total_price.to_string(), "45.00");
    }

    #[test]
    fn test_last_resort_promotes_large_integer() {
        let receipt = parser().parse("some scribble 120\nmore noise here");
        assert_eq!(receipt.line_items.len(), 1);
        assert_eq!(receipt.line_items[0].name, "some scribble");
        assert_eq!(receipt.line_items[0].total_price.to_string(), "120.00");
    }

    #[test]
    fn test_last_resort_ignores_small_integers() {
        let receipt = parser().parse("table 4\nsome scribble");
        assert!(receipt.line_items.is_empty());
        assert_eq!(receipt.confidence, 0);
    }

    #[test]
    fn test_last_resort_skips_noise_lines() {
        let text = "THE GOLDEN SPOON\nwww.goldenspoon.co.th\n02-123-4567\n01/02/2026\nThank you 555";
        let receipt = parser().parse(text);
        assert!(receipt.line_items.is_empty());
    }

    #[test]
    fn test_inferred_subtotal_reconciles_with_total() {
        let receipt = parser().parse("Pad Thai 180.00\nTotal 180.00");
        // No printed subtotal: inferred from the item sum.
        assert_eq!(
            receipt.subtotal.as_ref().map(|v| v.to_string()),
            Some("180.00".to_string())
        );
        assert_eq!(receipt.confidence, 60);
    }

    #[test]
    fn test_purely_numeric_name_rejected_in_primary_pass() {
        let receipt = parser().parse("123 180.00\nTotal 180.00");
        assert_eq!(receipt.line_items.len(), 1);
        // Falls through to the aggressive pass, which synthesizes a name.
        assert!(receipt.line_items[0].name.starts_with("Item ("));
    }

    #[test]
    fn test_currency_and_thousands_separators() {
        let receipt = parser().parse("Tom Yum ฿1,250.00\nGrand Total ฿1,250.00");
        assert_eq!(receipt.line_items[0].total_price.to_string(), "1250.00");
        assert_eq!(
            receipt.total_amount.as_ref().map(|v| v.to_string()),
            Some("1250.00".to_string())
        );
    }

    #[test]
    fn test_confidence_caps_at_item_points() {
        let text = "A dish 10.00\nB dish 20.00\nC dish 30.00\nD dish 40.00";
        let receipt = parser().parse(text);
        assert_eq!(receipt.line_items.len(), 4);
        // 60 from items (capped) + 15 inferred subtotal, no total to reconcile.
        assert_eq!(receipt.confidence, 75);
    }
}
