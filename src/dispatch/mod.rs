//! # Dispatch: routing inbound events to handlers.
//!
//! - `matcher`: pluggable topic-pattern matching.
//! - `tap`: observable side channels (inbound/unhandled events).
//! - `dispatcher`: the resolution and fan-out engine.

pub mod dispatcher;
pub mod matcher;
pub mod tap;

pub use dispatcher::Dispatcher;
pub use matcher::{ExactMatcher, GlobMatcher, MatcherRef, TopicMatcher};
pub use tap::EventTap;
