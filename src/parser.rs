//! Interest rate extraction from model replies

use regex::Regex;
use std::sync::LazyLock;

static BRACED_RATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([0-9]*\.?[0-9]+)\}").expect("valid rate pattern"));

/// First `{X.XX}` value in `text`, or `None` when the reply has no braced number.
///
/// The value is not range-checked.
pub fn parse_interest_rate(text: &str) -> Option<f64> {
    BRACED_RATE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
