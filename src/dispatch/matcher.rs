//! # Topic pattern matching.
//!
//! A subscription is keyed by a *topic pattern*; whether a pattern covers a
//! concrete topic is decided by a pluggable [`TopicMatcher`]. Matchers must be
//! deterministic and total: the same `(pattern, topic)` pair always yields the
//! same answer, and no input may panic.
//!
//! Two matchers ship with the crate:
//! - [`ExactMatcher`] — string equality, the default.
//! - [`GlobMatcher`] — glob patterns (`orders.*`, `sensor-??`) via `globset`.

use std::sync::Arc;

use globset::Glob;

/// Shared handle to a topic matcher.
pub type MatcherRef = Arc<dyn TopicMatcher>;

/// Decides whether a registered pattern covers a concrete topic.
pub trait TopicMatcher: Send + Sync + 'static {
    /// True when `pattern` matches `topic`. Must be deterministic and total.
    fn matches(&self, pattern: &str, topic: &str) -> bool;
}

/// Exact string equality (default).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl TopicMatcher for ExactMatcher {
    fn matches(&self, pattern: &str, topic: &str) -> bool {
        pattern == topic
    }
}

/// Glob-style matching (`*`, `?`, `[..]`).
///
/// Invalid patterns match nothing — a total matcher cannot fail, so a
/// malformed pattern simply never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobMatcher;

impl TopicMatcher for GlobMatcher {
    fn matches(&self, pattern: &str, topic: &str) -> bool {
        Glob::new(pattern)
            .map(|glob| glob.compile_matcher().is_match(topic))
            .unwrap_or(false)
    }
}
