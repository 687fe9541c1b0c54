//! Topic patterns.
//!
//! Regex patterns use partial-match semantics: `console` matches
//! `Console.messageAdded` when compiled case-insensitively, and
//! `Runtime\.` matches anywhere in the topic. Anchor with `^`/`$` for a
//! full-string match.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

// ============================================================================
// TopicPattern
// ============================================================================

/// Pattern a subscription is matched against.
#[derive(Clone)]
pub enum TopicPattern {
    /// Plain string, matches a topic only when equal.
    Exact(String),
    /// Matches topics starting with the given prefix.
    Prefix(String),
    /// Matches every topic.
    Any,
    /// Regular expression, matches when found anywhere in the topic.
    Regex(Regex),
}

impl TopicPattern {
    /// Creates an exact-topic pattern.
    #[inline]
    #[must_use]
    pub fn exact(topic: impl Into<String>) -> Self {
        Self::Exact(topic.into())
    }

    /// Compiles a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `source` is not a valid regex.
    pub fn regex(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Self::Regex)
            .map_err(|e| Error::invalid_pattern(source, e))
    }

    /// Compiles a case-insensitive regex pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `source` is not a valid regex.
    pub fn regex_case_insensitive(source: &str) -> Result<Self> {
        RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map(Self::Regex)
            .map_err(|e| Error::invalid_pattern(source, e))
    }

    /// Pattern matching every topic.
    #[must_use]
    pub const fn any() -> Self {
        Self::Any
    }

    /// Pattern matching every topic that starts with `<domain>.`.
    #[must_use]
    pub fn domain(domain: &str) -> Self {
        Self::Prefix(format!("{domain}."))
    }

    /// Tests the pattern against a topic.
    #[inline]
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == topic,
            Self::Prefix(prefix) => topic.starts_with(prefix.as_str()),
            Self::Any => true,
            Self::Regex(re) => re.is_match(topic),
        }
    }

    /// Returns the pattern source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(s) | Self::Prefix(s) => s,
            Self::Any => ".*",
            Self::Regex(re) => re.as_str(),
        }
    }
}

impl From<Regex> for TopicPattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

impl fmt::Debug for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => f.debug_tuple("Exact").field(s).finish(),
            Self::Prefix(s) => f.debug_tuple("Prefix").field(s).finish(),
            Self::Any => f.write_str("Any"),
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
        }
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => f.write_str(s),
            Self::Prefix(s) => write!(f, "{s}*"),
            Self::Any => f.write_str("*"),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_requires_equality() {
        let p = TopicPattern::exact("Debugger.paused");
        assert!(p.matches("Debugger.paused"));
        assert!(!p.matches("Debugger.pausedAgain"));
        assert!(!p.matches("Debugger"));
    }

    #[test]
    fn test_regex_matches_anywhere() {
        let p = TopicPattern::regex("paused").expect("compile");
        assert!(p.matches("Debugger.paused"));
        assert!(p.matches("paused"));
        assert!(!p.matches("Debugger.resumed"));
    }

    #[test]
    fn test_case_insensitive_partial_match() {
        let p = TopicPattern::regex_case_insensitive("console").expect("compile");
        assert!(p.matches("Console.messageAdded"));
        assert!(p.matches("Runtime.consoleAPICalled"));
    }

    #[test]
    fn test_anchored_regex() {
        let p = TopicPattern::regex(r"^Runtime\.").expect("compile");
        assert!(p.matches("Runtime.enable"));
        assert!(!p.matches("Debugger.Runtime.x"));
    }

    #[test]
    fn test_any_matches_everything() {
        let p = TopicPattern::any();
        assert!(p.matches(""));
        assert!(p.matches("response:1"));
        assert!(p.matches("Socket.open"));
    }

    #[test]
    fn test_domain_prefix() {
        let p = TopicPattern::domain("Heap.Profiler");
        assert!(p.matches("Heap.Profiler.foo"));
        assert!(!p.matches("HeapXProfiler.foo"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = TopicPattern::regex("(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(TopicPattern::exact("a.b").to_string(), "a.b");
        assert_eq!(TopicPattern::any().to_string(), "*");
        assert_eq!(TopicPattern::regex("a+").expect("compile").to_string(), "/a+/");
    }
}
