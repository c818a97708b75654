use crate::config::Config;
use crate::types::{Content, GenerateContentRequest, GenerateContentResponse, Part};
use base64::{Engine as _, engine::general_purpose};
use secrecy::ExposeSecret;

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("request to Gemini failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gemini returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode Gemini response: {0}")]
    Decode(String),
    #[error("Gemini returned no text")]
    NoContent,
}

/// Thin client for the `generateContent` REST endpoint.
pub struct Client {
    http: reqwest::Client,
    config: Config,
}

impl Client {
    pub fn new(config: Config) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_api_key(&self) -> bool {
        !self.config.api_key().expose_secret().is_empty()
    }

    /// Sends a text-only prompt and returns the reply text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError> {
        self.generate_content(vec![Part::text(prompt)]).await
    }

    /// Sends a prompt followed by a WAV recording as inline data.
    pub async fn generate_with_audio(
        &self,
        prompt: &str,
        wav: &[u8],
    ) -> Result<String, GeminiError> {
        let data = general_purpose::STANDARD.encode(wav);
        tracing::debug!(
            "Attaching {} bytes of audio ({} base64 chars).",
            wav.len(),
            data.len()
        );
        self.generate_content(vec![Part::text(prompt), Part::inline_data("audio/wav", data)])
            .await
    }

    /// Posts one user turn made of `parts` and returns the text of the first
    /// part of the first candidate.
    pub async fn generate_content(&self, parts: Vec<Part>) -> Result<String, GeminiError> {
        if !self.has_api_key() {
            return Err(GeminiError::MissingApiKey);
        }

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url(),
            self.config.model()
        );
        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        tracing::info!("Calling Gemini model {}.", self.config.model());
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key().expose_secret())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the API key.
                let e = e.without_url();
                tracing::warn!("Gemini request failed: {}", e);
                GeminiError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Gemini API error ({}): {}", status, body);
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| e.without_url())?;
        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| GeminiError::Decode(e.to_string()))?;
        let text = parsed.first_text().ok_or(GeminiError::NoContent)?;
        if text.trim().is_empty() {
            return Err(GeminiError::NoContent);
        }
        Ok(text.to_string())
    }
}

/// Removes markdown code fences the model sometimes wraps JSON in, even when
/// asked not to.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches("json"),
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use secrecy::SecretString;

    fn client_for(server_url: &str, key: &str) -> Client {
        let config = Config::builder()
            .with_base_url(server_url)
            .with_api_key(SecretString::from(key.to_string()))
            .build();
        Client::new(config).unwrap()
    }

    fn reply(text: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_generate_text_returns_first_part() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{ "parts": [{ "text": "Give me a topic" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply("Digital Minimalism (Lối sống tối giản kỹ thuật số)"))
            .create_async()
            .await;

        let client = client_for(&server.url(), "test-key");
        let text = client.generate_text("Give me a topic").await.unwrap();

        assert_eq!(text, "Digital Minimalism (Lối sống tối giản kỹ thuật số)");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_audio_is_sent_as_inline_wav() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{ "parts": [
                    { "text": "Review this" },
                    { "inline_data": { "mime_type": "audio/wav", "data": "UklGRg==" } }
                ] }]
            })))
            .with_status(200)
            .with_body(reply("{}"))
            .create_async()
            .await;

        let client = client_for(&server.url(), "test-key");
        client.generate_with_audio("Review this", b"RIFF").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failure_kinds_are_distinct() {
        let mut server = Server::new_async().await;
        let client = client_for(&server.url(), "test-key");

        let status = server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;
        match client.generate_text("x").await {
            Err(GeminiError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        status.remove_async().await;

        let empty = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;
        assert!(matches!(
            client.generate_text("x").await,
            Err(GeminiError::NoContent)
        ));
        empty.remove_async().await;

        server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;
        assert!(matches!(
            client.generate_text("x").await,
            Err(GeminiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_skips_network() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let client = client_for(&server.url(), "");
        assert!(matches!(
            client.generate_text("x").await,
            Err(GeminiError::MissingApiKey)
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Nothing listens on port 9 on a test machine.
        let client = client_for("http://127.0.0.1:9", "test-key");
        assert!(matches!(
            client.generate_text("x").await,
            Err(GeminiError::Transport(_))
        ));
    }
}
