use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::analysis::AnalysisResult;
use crate::error::ServiceError;

// The `Reviewer` trait is the contract for the remote service that proposes
// topics and reviews spoken answers. `CoachSession` depends only on this
// trait, so the session logic is tested against `MockReviewer` and the
// runtime plugs in the Gemini-backed implementation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Returns one line of the form `English Topic (Vietnamese Translation)`.
    async fn generate_topic(&self) -> Result<String, ServiceError>;

    /// Reviews a WAV recording of the user answering `topic`.
    ///
    /// Performs no retries; the caller decides whether to ask again.
    async fn analyze(&self, topic: &str, audio: &[u8]) -> Result<AnalysisResult, ServiceError>;
}
