//! Usage-based cost calculation
//!
//! Maps token usage and catalog pricing to a USD amount, rounded to six
//! decimal places.

use crate::core::catalog::ModelCatalogEntry;
use crate::models::request::TokenUsage;

/// Compute the USD cost of one invocation
///
/// `(input/1000) * input_price + (output/1000) * output_price`, rounded
/// to 6 decimal places. Zero usage costs exactly zero.
pub fn cost_usd(usage: TokenUsage, entry: &ModelCatalogEntry) -> f64 {
    let raw = (usage.input_tokens as f64 / 1000.0) * entry.input_price_per_1k
        + (usage.output_tokens as f64 / 1000.0) * entry.output_price_per_1k;
    (raw * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog;

    fn usage(input: u32, output: u32) -> TokenUsage {
        TokenUsage {
            input_tokens: input,
            output_tokens: output,
        }
    }

    #[test]
    fn test_zero_usage_costs_zero() {
        for entry in catalog::entries() {
            assert_eq!(cost_usd(usage(0, 0), entry), 0.0);
        }
    }

    #[test]
    fn test_known_cost() {
        // claude-sonnet: $0.003/1k in, $0.015/1k out
        let entry = catalog::resolve("claude-sonnet").unwrap();
        assert_eq!(cost_usd(usage(1000, 1000), entry), 0.018);
        assert_eq!(cost_usd(usage(500, 0), entry), 0.0015);
    }

    #[test]
    fn test_rounds_to_six_decimals() {
        let entry = catalog::resolve("claude-sonnet").unwrap();
        // 1 input token = 0.000003, 1 output token = 0.000015
        assert_eq!(cost_usd(usage(1, 1), entry), 0.000018);
    }

    #[test]
    fn test_monotonic_in_each_count() {
        let entry = catalog::resolve("llama3-70b").unwrap();
        let mut previous = 0.0;
        for input in [0u32, 10, 100, 1000, 10_000] {
            let cost = cost_usd(usage(input, 50), entry);
            assert!(cost >= previous);
            previous = cost;
        }
        let mut previous = 0.0;
        for output in [0u32, 10, 100, 1000, 10_000] {
            let cost = cost_usd(usage(50, output), entry);
            assert!(cost >= previous);
            previous = cost;
        }
    }

    #[test]
    fn test_never_negative() {
        for entry in catalog::entries() {
            assert!(cost_usd(usage(u32::MAX, u32::MAX), entry) >= 0.0);
        }
    }
}
