use crate::error::Error;
use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ADMIN_SCOPES: &str =
    "https://www.googleapis.com/auth/identitytoolkit https://www.googleapis.com/auth/cloud-platform";
/// Refresh this long before the access token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Service-account credential blob
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccount {
    pub fn from_json(json: &str) -> Result<Self> {
        let account: ServiceAccount = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid service account credentials: {}", e)))?;
        Ok(account)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// OAuth access tokens for the admin endpoints, obtained with a signed
/// service-account assertion and reused until shortly before they expire.
pub struct AccessTokenSource {
    account: ServiceAccount,
    key: EncodingKey,
    client: Client,
    cached: Mutex<Option<(String, Instant)>>,
}

impl AccessTokenSource {
    pub fn new(account: ServiceAccount, client: Client) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid service account private key: {}", e)))?;

        Ok(Self {
            account,
            key,
            client,
            cached: Mutex::new(None),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.account.project_id
    }

    /// Current access token, fetching a new one when needed
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some((token, valid_until)) = cached.as_ref() {
            if Instant::now() < *valid_until {
                return Ok(token.clone());
            }
        }

        let response = self.fetch().await?;
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        *cached = Some((response.access_token.clone(), Instant::now() + lifetime));

        Ok(response.access_token)
    }

    fn assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: ADMIN_SCOPES,
            aud: &self.account.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| Error::Internal(format!("Failed to sign service account assertion: {}", e)))?;
        Ok(assertion)
    }

    async fn fetch(&self) -> Result<TokenResponse> {
        let assertion = self.assertion()?;
        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(Error::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("Token endpoint responded {}: {}", status, body)).into());
        }

        let token = response.json::<TokenResponse>().await.map_err(Error::from)?;
        Ok(token)
    }
}
