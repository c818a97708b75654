pub mod analysis;
pub mod error;
pub mod history;
pub mod journal;
pub mod reviewer;
pub mod session_state;
pub mod topic;

use std::sync::Arc;

use analysis::AnalysisResult;
use topic::AttemptId;

/// Represents commands that the core logic (`CoachSession`) issues to the runtime.
///
/// The session never renders anything itself; the front end receives these
/// over a channel and decides how to present them.
#[derive(Debug, Clone)]
pub enum Command {
    /// A new topic is active; show it to the user.
    ShowTopic(String),
    /// A remote call is in flight; show a waiting indicator.
    Waiting(WaitReason),
    /// The result for the current attempt. Re-sent on every refresh.
    ShowFeedback(Feedback),
    /// The analysis call failed; nothing was cached.
    AnalysisFailed(String),
    /// A journal row was written for the shown result.
    JournalSaved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    GeneratingTopic,
    Analyzing,
    Saving,
}

/// A cached analysis result together with the attempt it belongs to.
#[derive(Debug, Clone)]
pub struct Feedback {
    pub attempt: AttemptId,
    pub result: Arc<AnalysisResult>,
}
