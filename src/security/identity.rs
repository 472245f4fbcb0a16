use crate::config::IdentityConfig;
use crate::error::Error;
use crate::security::service_account::{AccessTokenSource, ServiceAccount};
use anyhow::Result;
use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use log::{info, warn};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

/// Account as known to the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
}

/// Result of a password sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    pub uid: String,
    pub id_token: String,
    pub refresh_token: String,
}

/// External identity provider. Owns credentials; this service never stores passwords.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer ID token and return the owner key it was issued for
    async fn verify_id_token(&self, token: &str) -> Result<String>;

    /// Create an account and return its uid
    async fn create_account(&self, email: &str, password: &str) -> Result<String>;

    async fn find_account(&self, email: &str) -> Result<Option<Account>>;

    /// Exchange email and password for tokens
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn>;

    async fn email_verification_link(&self, email: &str) -> Result<String>;

    async fn password_reset_link(&self, email: &str) -> Result<String>;

    /// Check a reset code and apply the new password
    async fn confirm_password_reset(&self, oob_code: &str, new_password: &str) -> Result<()>;
}

/// Map a provider error code from the password grant to a caller-facing error
pub fn sign_in_error(code: &str) -> Error {
    match code {
        "EMAIL_NOT_FOUND" => Error::NotFound("Email is not registered".to_string()),
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            Error::Authentication("Wrong password".to_string())
        }
        _ => Error::Validation(format!("Login failed: {}", code)),
    }
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Provider errors read like `WEAK_PASSWORD : Password should be ...`
fn error_code(message: &str) -> &str {
    message
        .split(|c: char| c == ' ' || c == ':')
        .next()
        .unwrap_or(message)
}

/// Failure reported by the identity REST API
#[derive(Debug)]
struct ProviderFailure {
    status: reqwest::StatusCode,
    code: String,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    sub: String,
}

/// Checks ID tokens against the provider's published signing keys
pub struct TokenVerifier {
    project_id: String,
    keys_url: String,
    key_ttl: Duration,
    client: Client,
    keys: RwLock<Option<(JwkSet, Instant)>>,
}

impl TokenVerifier {
    pub fn new(project_id: &str, keys_url: &str, key_ttl: Duration, client: Client) -> Self {
        Self {
            project_id: project_id.to_string(),
            keys_url: keys_url.to_string(),
            key_ttl,
            client,
            keys: RwLock::new(None),
        }
    }

    pub async fn verify(&self, token: &str) -> Result<String> {
        let kid = decode_header(token)
            .map_err(|e| Error::InvalidToken(format!("Malformed token: {}", e)))?
            .kid
            .ok_or_else(|| Error::InvalidToken("Token has no key id".to_string()))?;

        let mut keys = self.signing_keys(false).await?;
        if keys.find(&kid).is_none() {
            // Keys rotate; one refresh before giving up.
            keys = self.signing_keys(true).await?;
        }

        verify_with_keys(token, &keys, &self.project_id)
    }

    async fn signing_keys(&self, force: bool) -> Result<JwkSet> {
        if !force {
            if let Some((keys, fetched)) = self.keys.read().await.as_ref() {
                if fetched.elapsed() < self.key_ttl {
                    return Ok(keys.clone());
                }
            }
        }

        let keys = self
            .client
            .get(&self.keys_url)
            .send()
            .await
            .map_err(Error::from)?
            .error_for_status()
            .map_err(Error::from)?
            .json::<JwkSet>()
            .await
            .map_err(Error::from)?;
        info!("Fetched {} token signing keys", keys.keys.len());

        *self.keys.write().await = Some((keys.clone(), Instant::now()));
        Ok(keys)
    }
}

/// Validate signature, expiry, audience and issuer; return the subject
pub fn verify_with_keys(token: &str, keys: &JwkSet, project_id: &str) -> Result<String> {
    let header =
        decode_header(token).map_err(|e| Error::InvalidToken(format!("Malformed token: {}", e)))?;
    let kid = header
        .kid
        .ok_or_else(|| Error::InvalidToken("Token has no key id".to_string()))?;
    let jwk = keys
        .find(&kid)
        .ok_or_else(|| Error::InvalidToken("Unknown signing key".to_string()))?;
    let key = DecodingKey::from_jwk(jwk)
        .map_err(|e| Error::InvalidToken(format!("Unusable signing key: {}", e)))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[project_id]);
    validation.set_issuer(&[format!("https://securetoken.google.com/{}", project_id)]);
    validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

    let data = decode::<TokenClaims>(token, &key, &validation)
        .map_err(|e| Error::InvalidToken(format!("Invalid token: {}", e)))?;

    if data.claims.sub.is_empty() {
        return Err(Error::InvalidToken("Token has an empty subject".to_string()).into());
    }

    Ok(data.claims.sub)
}

/// Firebase Authentication over its REST API
pub struct FirebaseIdentity {
    client: Client,
    base_url: String,
    api_key: String,
    admin: AccessTokenSource,
    verifier: TokenVerifier,
}

impl FirebaseIdentity {
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let credentials = config
            .credentials
            .as_deref()
            .ok_or_else(|| Error::Config("Identity credentials are not configured".to_string()))?;
        let account = ServiceAccount::from_json(credentials)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(3)))
            .build()
            .map_err(Error::from)?;

        let verifier = TokenVerifier::new(
            &account.project_id,
            &config.signing_keys_url,
            Duration::from_secs(config.key_cache_secs),
            client.clone(),
        );
        let admin = AccessTokenSource::new(account, client.clone())?;

        info!("Identity provider configured for project {}", admin.project_id());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            admin,
            verifier,
        })
    }

    /// Endpoint authorized with the public API key
    fn public_url(&self, method: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/v1/accounts:{}", self.base_url, method))
            .map_err(|e| Error::Config(format!("Invalid identity base URL: {}", e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Project-scoped endpoint authorized with the service account
    fn admin_url(&self, method: &str) -> Result<Url> {
        let url = Url::parse(&format!(
            "{}/v1/projects/{}/{}",
            self.base_url,
            self.admin.project_id(),
            method
        ))
        .map_err(|e| Error::Config(format!("Invalid identity base URL: {}", e)))?;
        Ok(url)
    }

    async fn admin_request(&self, method: &str) -> Result<RequestBuilder> {
        let token = self.admin.token().await?;
        Ok(self.client.post(self.admin_url(method)?).bearer_auth(token))
    }

    /// Send a request; provider-reported failures come back as `Err(ProviderFailure)`
    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<std::result::Result<T, ProviderFailure>> {
        let response = request.send().await.map_err(Error::from)?;
        let status = response.status();

        if status.is_success() {
            let body = response.json::<T>().await.map_err(Error::from)?;
            return Ok(Ok(body));
        }

        let text = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<ProviderErrorBody>(&text)
            .map(|body| error_code(&body.error.message).to_string())
            .unwrap_or_else(|_| text.clone());
        warn!("Identity provider responded {}: {}", status, code);

        Ok(Err(ProviderFailure { status, code }))
    }

    async fn oob_link(&self, request_type: &str, email: &str) -> Result<String> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct OobResponse {
            oob_link: String,
        }

        let request = self
            .admin_request("accounts:sendOobCode")
            .await?
            .json(&json!({
                "requestType": request_type,
                "email": email,
                "returnOobLink": true,
            }));

        match self.call::<OobResponse>(request).await? {
            Ok(body) => Ok(body.oob_link),
            Err(failure) => Err(upstream(failure)),
        }
    }
}

fn upstream(failure: ProviderFailure) -> anyhow::Error {
    Error::Upstream(format!("{} ({})", failure.code, failure.status)).into()
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn verify_id_token(&self, token: &str) -> Result<String> {
        self.verifier.verify(token).await
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<String> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CreateResponse {
            local_id: String,
        }

        let request = self
            .admin_request("accounts")
            .await?
            .json(&json!({ "email": email, "password": password }));

        match self.call::<CreateResponse>(request).await? {
            Ok(body) => Ok(body.local_id),
            Err(failure) if failure.code == "EMAIL_EXISTS" => {
                Err(Error::AlreadyRegistered("Email is already registered".to_string()).into())
            }
            Err(failure) => Err(upstream(failure)),
        }
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>> {
        #[derive(Deserialize)]
        struct LookupResponse {
            #[serde(default)]
            users: Vec<LookupUser>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct LookupUser {
            local_id: String,
            #[serde(default)]
            email: String,
            #[serde(default)]
            email_verified: bool,
        }

        let request = self
            .admin_request("accounts:lookup")
            .await?
            .json(&json!({ "email": [email] }));

        match self.call::<LookupResponse>(request).await? {
            Ok(body) => Ok(body.users.into_iter().next().map(|user| Account {
                uid: user.local_id,
                email: user.email,
                email_verified: user.email_verified,
            })),
            Err(failure) if failure.code == "USER_NOT_FOUND" => Ok(None),
            Err(failure) => Err(upstream(failure)),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SignInResponse {
            local_id: String,
            id_token: String,
            refresh_token: String,
        }

        let request = self.client.post(self.public_url("signInWithPassword")?).json(&json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        }));

        match self.call::<SignInResponse>(request).await? {
            Ok(body) => Ok(SignIn {
                uid: body.local_id,
                id_token: body.id_token,
                refresh_token: body.refresh_token,
            }),
            Err(failure) if failure.status.is_client_error() => Err(sign_in_error(&failure.code).into()),
            Err(failure) => Err(upstream(failure)),
        }
    }

    async fn email_verification_link(&self, email: &str) -> Result<String> {
        self.oob_link("VERIFY_EMAIL", email).await
    }

    async fn password_reset_link(&self, email: &str) -> Result<String> {
        self.oob_link("PASSWORD_RESET", email).await
    }

    async fn confirm_password_reset(&self, oob_code: &str, new_password: &str) -> Result<()> {
        let url = self.public_url("resetPassword")?;

        let verify = self.client.post(url.clone()).json(&json!({ "oobCode": oob_code }));
        if let Err(failure) = self.call::<serde_json::Value>(verify).await? {
            return Err(upstream(failure));
        }

        let confirm = self
            .client
            .post(url)
            .json(&json!({ "oobCode": oob_code, "newPassword": new_password }));
        match self.call::<serde_json::Value>(confirm).await? {
            Ok(_) => Ok(()),
            Err(failure) => Err(upstream(failure)),
        }
    }
}
