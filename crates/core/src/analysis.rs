use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// How well the ideas in a spoken answer hang together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogicStatus {
    Good,
    Confusing,
    Rambling,
}

impl LogicStatus {
    /// The label the coach uses in its feedback.
    pub fn label(&self) -> &'static str {
        match self {
            LogicStatus::Good => "Tốt",
            LogicStatus::Confusing => "Rối rắm",
            LogicStatus::Rambling => "Lan man",
        }
    }
}

impl fmt::Display for LogicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for LogicStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase();
        if norm.contains("tốt") || norm.contains("good") {
            Ok(LogicStatus::Good)
        } else if norm.contains("rối") || norm.contains("confus") {
            Ok(LogicStatus::Confusing)
        } else if norm.contains("lan man") || norm.contains("rambl") {
            Ok(LogicStatus::Rambling)
        } else {
            Err(format!("unknown logic status: {s:?}"))
        }
    }
}

impl TryFrom<String> for LogicStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogicStatus> for String {
    fn from(status: LogicStatus) -> Self {
        status.label().to_string()
    }
}

/// A phrase that sounded translated or textbook-like, with a native alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalFix {
    pub original: String,
    pub better: String,
    #[serde(default)]
    pub reason: String,
}

/// Feedback for one recording. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub transcript: String,
    pub logic_status: LogicStatus,
    pub logic_comment: String,
    pub structure_suggestion: String,
    pub natural_fixes: Vec<NaturalFix>,
    pub repeated_words: BTreeSet<String>,
}

/// Content hash of an [`AnalysisResult`] and the topic it answers; the
/// idempotency key for journal writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultId(String);

impl ResultId {
    pub fn of(topic: &str, result: &AnalysisResult) -> Self {
        let mut hasher = Sha256::new();
        // Length-prefix every field so that moving text between fields changes the hash.
        let mut field = |value: &str| {
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        };
        field(topic);
        field(&result.transcript);
        field(result.logic_status.label());
        field(&result.logic_comment);
        field(&result.structure_suggestion);
        for fix in &result.natural_fixes {
            field(&fix.original);
            field(&fix.better);
            field(&fix.reason);
        }
        field("");
        for word in &result.repeated_words {
            field(word);
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for logs.
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}
