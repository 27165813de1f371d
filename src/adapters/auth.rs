use crate::config::CredentialsConfig;
use crate::core::TokenProvider;
use crate::utils::error::{Result, SheetsError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before the server-side expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// A pre-issued bearer token, e.g. from `gcloud auth print-access-token`.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// The fields of a Google service-account key file that the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Two-legged OAuth with a signed JWT assertion. The token is cached and
/// reused until shortly before it expires.
pub struct ServiceAccountAuth {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scopes: Vec<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(client: Client, key: ServiceAccountKey, scopes: Vec<String>) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            client,
            key,
            encoding_key,
            scopes,
            cached: Mutex::new(None),
        })
    }

    pub fn from_file<P: AsRef<Path>>(client: Client, path: P, scopes: Vec<String>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SheetsError::AuthError {
            message: format!("cannot read service account file '{}': {}", path.display(), e),
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&content)?;
        tracing::debug!("Loaded service account {}", key.client_email);
        Self::new(client, key, scopes)
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: self.scopes.join(" "),
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        Ok(jsonwebtoken::encode(&header, &claims, &self.encoding_key)?)
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken> {
        let assertion = self.signed_assertion(now)?;

        tracing::debug!("Requesting access token from {}", self.key.token_uri);
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::AuthError {
                message: format!("token endpoint returned {}: {}", status, body),
            });
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = Duration::try_seconds(token.expires_in.saturating_sub(EXPIRY_SKEW_SECS))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| SheetsError::AuthError {
                message: format!("token endpoint returned unusable expires_in {}", token.expires_in),
            })?;
        Ok(CachedToken {
            token: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > now) {
            return Ok(token.token.clone());
        }

        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

/// Token source picked from configuration at startup.
pub enum ConfiguredTokens {
    Static(StaticToken),
    ServiceAccount(ServiceAccountAuth),
}

impl ConfiguredTokens {
    /// An explicit access token wins over the key file.
    pub fn from_config(client: Client, credentials: &CredentialsConfig) -> Result<Self> {
        if let Some(token) = credentials.access_token() {
            tracing::info!("🔑 Using configured access token");
            return Ok(Self::Static(StaticToken::new(token)));
        }

        let key_file = credentials
            .service_account_file
            .as_deref()
            .ok_or_else(|| SheetsError::MissingConfigError {
                field: "credentials.service_account_file".to_string(),
            })?;
        let auth = ServiceAccountAuth::from_file(client, key_file, credentials.scopes.clone())?;
        tracing::info!("🔑 Using service account {}", auth.client_email());
        Ok(Self::ServiceAccount(auth))
    }
}

#[async_trait]
impl TokenProvider for ConfiguredTokens {
    async fn access_token(&self) -> Result<String> {
        match self {
            Self::Static(token) => token.access_token().await,
            Self::ServiceAccount(auth) => auth.access_token().await,
        }
    }
}
