use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub parser: ParserConfig,
}

/// Empirically tuned parser thresholds. Defaults match the receipts the
/// heuristics were calibrated on; override per locale via environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Shortest item name accepted by the extraction passes, in characters.
    pub min_name_chars: usize,
    /// Bare integers above this are promoted to prices by the last-resort pass.
    pub min_integer_price: u32,
    /// Inputs shorter than this skip all passes (degenerate short-circuit).
    pub short_input_limit: usize,
    /// Tolerance for subtotal + tax vs the stated total, as a decimal string.
    pub reconcile_tolerance: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_name_chars: 2,
            min_integer_price: 5,
            short_input_limit: 5,
            reconcile_tolerance: "0.01".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            parser: ParserConfig::from_env(),
        }
    }
}

impl ParserConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_name_chars: std::env::var("RECEIPT_MIN_NAME_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_name_chars),
            min_integer_price: std::env::var("RECEIPT_MIN_INTEGER_PRICE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_integer_price),
            short_input_limit: std::env::var("RECEIPT_SHORT_INPUT_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.short_input_limit),
            reconcile_tolerance: std::env::var("RECEIPT_RECONCILE_TOLERANCE")
                .unwrap_or(defaults.reconcile_tolerance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = ParserConfig::default();
        assert_eq!(config.min_name_chars, 2);
        assert_eq!(config.min_integer_price, 5);
        assert_eq!(config.short_input_limit, 5);
        assert_eq!(config.reconcile_tolerance, "0.01");
    }
}
