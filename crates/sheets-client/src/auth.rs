//! OAuth2 access tokens for Google APIs.
//!
//! Service accounts authenticate by signing a short-lived JWT with their
//! private key and exchanging it at the account's `token_uri` for a bearer
//! token. The token is cached and reused until shortly before it expires.

use crate::error::SheetsError;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const DEFAULT_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of bearer tokens for the Sheets and Drive APIs.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetsError>;
}

/// A fixed token, for callers that obtain tokens elsewhere.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}

/// The fields of a service-account key file this client needs.
#[derive(Deserialize, Clone)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(json).map_err(|e| SheetsError::Credentials(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, SheetsError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SheetsError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

pub struct ServiceAccountAuth {
    http: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scopes: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(http: reqwest::Client, key: ServiceAccountKey) -> Result<Self, SheetsError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetsError::Credentials(format!("private_key: {e}")))?;
        Ok(Self {
            http,
            key,
            encoding_key,
            scopes: DEFAULT_SCOPES.join(" "),
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn signed_assertion(&self) -> Result<String, SheetsError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: self.key.client_email.clone(),
            scope: self.scopes.clone(),
            aud: self.key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        Ok(encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    async fn fetch_token(&self) -> Result<TokenResponse, SheetsError> {
        let assertion = self.signed_assertion()?;
        tracing::debug!("Requesting access token for {}.", self.key.client_email);
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Token exchange failed ({}): {}", status, body);
            return Err(SheetsError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| SheetsError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::info!(
            "Obtained access token for {} (valid for {}s).",
            self.key.client_email,
            fresh.expires_in
        );
        *cached = Some(CachedToken {
            token: fresh.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(fresh.access_token)
    }
}
