//! Token usage accounting and USD cost estimates.
//!
//! Prices are per 1K tokens. Model names reported by Azure carry a version
//! suffix (`gpt-4o-2024-05-13`), so lookup picks the longest known prefix.

use serde::{Deserialize, Serialize};

/// Token counts reported by one or more chat completions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Adds another usage report to this one.
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Price per 1K prompt / completion tokens in USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl ModelPricing {
    pub const FREE: ModelPricing = ModelPricing {
        prompt_per_1k: 0.0,
        completion_per_1k: 0.0,
    };

    /// Cost of `usage` at this price.
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.prompt_tokens as f64 / 1000.0) * self.prompt_per_1k
            + (usage.completion_tokens as f64 / 1000.0) * self.completion_per_1k
    }
}

const PRICES: &[(&str, ModelPricing)] = &[
    ("gpt-4o-mini", price(0.000_15, 0.000_6)),
    ("gpt-4o", price(0.002_5, 0.01)),
    ("gpt-4-turbo", price(0.01, 0.03)),
    ("gpt-4-32k", price(0.06, 0.12)),
    ("gpt-4", price(0.03, 0.06)),
    ("gpt-35-turbo-16k", price(0.003, 0.004)),
    ("gpt-35-turbo", price(0.001_5, 0.002)),
    ("gpt-3.5-turbo-16k", price(0.003, 0.004)),
    ("gpt-3.5-turbo", price(0.001_5, 0.002)),
];

const fn price(prompt_per_1k: f64, completion_per_1k: f64) -> ModelPricing {
    ModelPricing {
        prompt_per_1k,
        completion_per_1k,
    }
}

/// Looks up the built-in price for `model`; unknown models are free.
pub fn pricing_for(model: &str) -> ModelPricing {
    let name = model.trim().to_ascii_lowercase();
    PRICES
        .iter()
        .filter(|(prefix, _)| name.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, p)| *p)
        .unwrap_or(ModelPricing::FREE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(pricing_for("gpt-4o-mini-2024-07-18"), price(0.000_15, 0.000_6));
        assert_eq!(pricing_for("gpt-4o-2024-05-13"), price(0.002_5, 0.01));
        assert_eq!(pricing_for("GPT-4"), price(0.03, 0.06));
        assert_eq!(pricing_for("llama3"), ModelPricing::FREE);
    }

    #[test]
    fn cost_is_linear_in_tokens() {
        let usage = TokenUsage {
            prompt_tokens: 2000,
            completion_tokens: 500,
            total_tokens: 2500,
        };
        let cost = pricing_for("gpt-4o").cost(&usage);
        assert!((cost - (2.0 * 0.002_5 + 0.5 * 0.01)).abs() < 1e-12);
    }

    #[test]
    fn accumulate_sums_all_counters() {
        let mut total = TokenUsage::default();
        total.accumulate(&TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        total.accumulate(&TokenUsage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        });
        assert_eq!(
            total,
            TokenUsage {
                prompt_tokens: 11,
                completion_tokens: 7,
                total_tokens: 18
            }
        );
    }
}
