use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ServiceError;

/// Topic used when no reviewer API key is configured.
pub const UNCONFIGURED_TOPIC: &str = "Technology & Future (Công nghệ & Tương lai)";
/// Topic used when topic generation fails for any other reason.
pub const FALLBACK_TOPIC: &str = "Childhood Memory (Ký ức tuổi thơ)";

/// Identity of one recording attempt: the topic it answers and how many
/// retries preceded it. Recordings and cached results are keyed by this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId {
    pub topic: String,
    pub retry: u32,
}

impl AttemptId {
    pub fn new(topic: impl Into<String>, retry: u32) -> Self {
        Self {
            topic: topic.into(),
            retry,
        }
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" (attempt {})", self.topic, self.retry + 1)
    }
}

/// Picks the fallback topic for a failed generation call.
pub fn fallback_topic(err: &ServiceError) -> &'static str {
    if err.is_not_configured() {
        UNCONFIGURED_TOPIC
    } else {
        FALLBACK_TOPIC
    }
}

/// Cleans up a generated topic line.
///
/// The model is asked for a single `English Topic (Vietnamese Translation)`
/// line but occasionally wraps it in quotes or markdown emphasis, or adds a
/// blank line. Returns `None` when nothing usable is left.
pub fn normalize_topic(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let cleaned = line
        .trim_matches(|c| c == '*' || c == '"' || c == '`')
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
