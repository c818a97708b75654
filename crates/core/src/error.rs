use crate::topic::AttemptId;

/// Failure of an external collaborator (the reviewer service or the journal store).
///
/// Each variant is a distinct outcome the caller may want to treat differently:
/// a missing key degrades to fallbacks, an unreachable service or a bad
/// status lets the user retry, and a malformed or empty answer is reported
/// as "no result".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("service is not configured: {0}")]
    NotConfigured(String),
    #[error("service unreachable: {0}")]
    Transport(String),
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("service returned no result")]
    Empty,
}

impl ServiceError {
    pub fn is_not_configured(&self) -> bool {
        matches!(self, ServiceError::NotConfigured(_))
    }
}

/// Rejected user actions. None of these end the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no topic has been chosen yet")]
    NoTopic,
    #[error("no recording for the current attempt")]
    NoRecording,
    #[error("recording belongs to {got:?}, current attempt is {expected:?}")]
    StaleRecording { expected: AttemptId, got: AttemptId },
    #[error("the current attempt already has feedback; retry to record again")]
    AlreadyAnalyzed,
    #[error("an analysis is still in progress")]
    Busy,
    #[error("command channel closed")]
    ChannelClosed,
}
