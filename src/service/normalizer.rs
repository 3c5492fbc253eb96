//! Canonicalize recognized receipt text before parsing.
//!
//! Thai digit glyphs become ASCII digits, currency markers are stripped and
//! decimal separators are normalized, so every later pass can assume plain
//! `123.45` number shapes. Pure and idempotent: normalizing already
//! normalized text is a no-op.

const CURRENCY_GLYPHS: &[char] = &['฿', '$', '€', '£', '¥'];
const CURRENCY_WORDS: &[&str] = &["THB", "thb", "บาท"];

/// Normalize a whole block of OCR text, preserving line structure.
pub fn normalize(text: &str) -> String {
    text.lines()
        .map(normalize_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            // Thai digits ๐..๙ (U+0E50..U+0E59)
            '\u{0E50}'..='\u{0E59}' => {
                let digit = (ch as u32) - 0x0E50 + ('0' as u32);
                out.push(char::from_u32(digit).unwrap_or('0'));
            }
            c if CURRENCY_GLYPHS.contains(&c) => {}
            '\t' => out.push(' '),
            c => out.push(c),
        }
    }

    let mut out = strip_currency_words(&out);
    out = normalize_separators(&out);

    // Collapse runs of spaces left behind by stripped markers
    while out.contains("  ") {
        out = out.replace("  ", " ");
    }
    out.trim().to_string()
}

fn strip_currency_words(line: &str) -> String {
    let mut out = line.to_string();
    for word in CURRENCY_WORDS {
        out = out.replace(word, "");
    }
    out
}

/// Commas inside numbers are ambiguous in OCR output: `1,234` is a thousands
/// separator, `12,50` is a localized decimal point. Disambiguate by the
/// length of the digit run after the comma: exactly three digits means
/// thousands (dropped), one or two means decimal (becomes `.`). Anything
/// else is left alone.
fn normalize_separators(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    for (i, &ch) in chars.iter().enumerate() {
        if ch != ',' {
            out.push(ch);
            continue;
        }
        let after_digit = i > 0 && chars[i - 1].is_ascii_digit();
        let run = chars[i + 1..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();
        match (after_digit, run) {
            (true, 3) => {}
            (true, 1) | (true, 2) => out.push('.'),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thai_digits_become_ascii() {
        assert_eq!(normalize("ข้าวผัด ๑๒๐.๕๐"), "ข้าวผัด 120.50");
    }

    #[test]
    fn test_currency_markers_stripped() {
        assert_eq!(normalize("Pad Thai ฿180.00"), "Pad Thai 180.00");
        assert_eq!(normalize("Total $12.34"), "Total 12.34");
        assert_eq!(normalize("รวม 250.00 บาท"), "รวม 250.00");
        assert_eq!(normalize("Total 95.00 THB"), "Total 95.00");
    }

    #[test]
    fn test_thousands_separator_removed() {
        assert_eq!(normalize("Grand Total 1,234.56"), "Grand Total 1234.56");
    }

    #[test]
    fn test_decimal_comma_becomes_dot() {
        assert_eq!(normalize("Kaffee 12,50"), "Kaffee 12.50");
    }

    #[test]
    fn test_non_numeric_comma_kept() {
        assert_eq!(normalize("rice, noodles 40.00"), "rice, noodles 40.00");
    }

    #[test]
    fn test_idempotent() {
        let noisy = "ข้าวผัด ฿๑,๒๓๔.๕๐ \t THB";
        let once = normalize(noisy);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_preserves_line_structure() {
        let text = "Pad Thai 180.00\nTotal 180.00";
        assert_eq!(normalize(text), text);
    }
}
