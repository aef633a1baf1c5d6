//! Core type definitions for persona-rates

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a survey run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u64,
    /// Number of completion tokens
    pub completion_tokens: u64,
    /// Total tokens (prompt + completion)
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Create a new token usage record
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Add another token usage to this one
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// One synthetic respondent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Profile {
    /// "Men" or "Woman"
    pub gender: String,
    /// Age in years
    pub age: u32,
    /// Number of children
    pub kids: u32,
    /// Monthly net income bracket in Euros
    pub income: String,
    /// Highest education, phrased to follow "You have"
    pub education: String,
    /// Political leaning
    pub politics: String,
}

/// One economic condition presented to the model, both values in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Inflation rate
    pub inflation: f64,
    /// Unemployment rate
    pub unemployment: f64,
}

impl Scenario {
    /// Create a new scenario
    pub fn new(inflation: f64, unemployment: f64) -> Self {
        Self {
            inflation,
            unemployment,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inflation {}%, unemployment {}%",
            format_percent(self.inflation),
            format_percent(self.unemployment)
        )
    }
}

/// Render a percentage so that whole numbers keep one decimal place (`4.0`, `2.5`).
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Role label recorded for the aggregate central-banker variant
pub const CENTRAL_BANKER_ROLE: &str = "Central Banker";

/// A persona answer: profile joined with scenario and the model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaRecord {
    /// Respondent
    pub profile: Profile,
    /// Economic condition asked about
    pub scenario: Scenario,
    /// Trimmed raw reply
    pub response: String,
    /// Rate extracted from the reply, if any
    pub interest_rate: Option<f64>,
}

/// A central-banker answer for one scenario in one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralBankRecord {
    /// 1-based repetition index
    pub iteration: u32,
    /// Always [`CENTRAL_BANKER_ROLE`] for records produced by this crate
    pub role: String,
    /// Economic condition asked about
    pub scenario: Scenario,
    /// Trimmed raw reply
    pub response: String,
    /// Rate extracted from the reply, if any
    pub interest_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(4.0), "4.0");
        assert_eq!(format_percent(12.0), "12.0");
        assert_eq!(format_percent(2.5), "2.5");
    }

    #[test]
    fn test_token_usage_add() {
        let mut usage = TokenUsage::new(10, 2);
        usage.add(TokenUsage::new(5, 1));
        assert_eq!(usage, TokenUsage::new(15, 3));
        assert_eq!(usage.total_tokens, 18);
    }

    #[test]
    fn test_scenario_display() {
        let scenario = Scenario::new(4.0, 6.0);
        assert_eq!(scenario.to_string(), "inflation 4.0%, unemployment 6.0%");
    }
}
