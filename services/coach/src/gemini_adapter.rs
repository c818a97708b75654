use crate::prompt_loader::Prompts;
use async_trait::async_trait;
use coach_core::analysis::{AnalysisResult, LogicStatus, NaturalFix};
use coach_core::error::ServiceError;
use coach_core::reviewer::Reviewer;
use gemini_client::{GeminiError, strip_code_fences};
use serde::Deserialize;

/// An adapter that implements the `Reviewer` trait on top of `gemini_client::Client`.
pub struct GeminiReviewer {
    client: gemini_client::Client,
    prompts: Prompts,
}

impl GeminiReviewer {
    pub fn new(client: gemini_client::Client, prompts: Prompts) -> Self {
        Self { client, prompts }
    }
}

#[async_trait]
impl Reviewer for GeminiReviewer {
    async fn generate_topic(&self) -> Result<String, ServiceError> {
        let text = self
            .client
            .generate_text(self.prompts.topic())
            .await
            .map_err(to_service_error)?;
        Ok(text.trim().to_string())
    }

    async fn analyze(&self, topic: &str, audio: &[u8]) -> Result<AnalysisResult, ServiceError> {
        let prompt = self.prompts.coach(topic);
        let text = self
            .client
            .generate_with_audio(&prompt, audio)
            .await
            .map_err(to_service_error)?;
        parse_analysis(&text)
    }
}

fn to_service_error(err: GeminiError) -> ServiceError {
    match err {
        GeminiError::MissingApiKey => {
            ServiceError::NotConfigured("GEMINI_API_KEY is not set".to_string())
        }
        GeminiError::Transport(e) => ServiceError::Transport(e.to_string()),
        GeminiError::Status { status, body } => ServiceError::Status { status, body },
        GeminiError::Decode(msg) => ServiceError::Malformed(msg),
        GeminiError::NoContent => ServiceError::Empty,
    }
}

// Shape of the JSON the coach prompt asks for.
#[derive(Debug, Deserialize)]
struct WireAnalysis {
    #[serde(default)]
    transcript: String,
    logic_analysis: WireLogic,
    #[serde(default)]
    natural_fixes: Vec<NaturalFix>,
    #[serde(default)]
    repetition: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireLogic {
    status: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    better_structure_suggestion: String,
}

/// Parses the model's reply into an [`AnalysisResult`], tolerating code fences.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, ServiceError> {
    let json = strip_code_fences(text);
    if json.is_empty() {
        return Err(ServiceError::Empty);
    }
    let wire: WireAnalysis =
        serde_json::from_str(json).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    let logic_status: LogicStatus = wire
        .logic_analysis
        .status
        .parse()
        .map_err(ServiceError::Malformed)?;

    Ok(AnalysisResult {
        transcript: wire.transcript.trim().to_string(),
        logic_status,
        logic_comment: wire.logic_analysis.comment,
        structure_suggestion: wire.logic_analysis.better_structure_suggestion,
        natural_fixes: wire.natural_fixes,
        repeated_words: wire
            .repetition
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect(),
    })
}
