#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("invalid service account credentials: {0}")]
    Credentials(String),
    #[error("failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("request to Google failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Google API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode Google API response: {0}")]
    Decode(String),
    #[error("spreadsheet {0:?} not found or not shared with the service account")]
    SpreadsheetNotFound(String),
}
