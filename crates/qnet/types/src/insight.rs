//! Commentary returned by the completion service

use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form, non-authoritative analysis text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsightText(String);

impl InsightText {
    /// Returned in place of commentary whenever the service call fails.
    pub const FALLBACK: &'static str = "Error in analysis.";

    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn fallback() -> Self {
        Self(Self::FALLBACK.to_string())
    }

    pub fn is_fallback(&self) -> bool {
        self.0 == Self::FALLBACK
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for InsightText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_sentinel() {
        let text = InsightText::fallback();
        assert!(text.is_fallback());
        assert_eq!(text.as_str(), "Error in analysis.");
        assert!(!InsightText::new("Latency is stable.").is_fallback());
    }
}
