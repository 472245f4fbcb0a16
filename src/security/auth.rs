use crate::db::models::user_models::{LocalUser, SessionTokens};
use crate::db::repositories::users::UsersRepository;
use crate::error::Error;
use crate::security::identity::IdentityProvider;
use crate::services::mailer::{self, Mailer};
use anyhow::Result;
use log::{info, warn};
use sqlx::PgPool;
use std::sync::Arc;

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub uid: String,
    pub username: String,
    pub tokens: SessionTokens,
}

/// Account flows on top of the identity provider. Only the display name and
/// email are kept locally.
pub struct AuthService {
    users_repo: UsersRepository,
    identity: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn Mailer>,
    app_name: String,
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(message.to_string()).into());
    }
    Ok(value)
}

impl AuthService {
    pub fn new(
        pool: Arc<PgPool>,
        identity: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn Mailer>,
        app_name: &str,
    ) -> Self {
        Self {
            users_repo: UsersRepository::new(pool),
            identity,
            mailer,
            app_name: app_name.to_string(),
        }
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// Create the provider account and the local profile. Returns the new uid.
    pub async fn register(&self, email: &str, password: &str, username: &str) -> Result<String> {
        let username = required(username, "Username is required")?;
        let email = required(email, "Email and password are required")?;
        if password.is_empty() {
            return Err(Error::Validation("Email and password are required".to_string()).into());
        }

        let uid = self.identity.create_account(email, password).await?;
        self.users_repo.create(&uid, email, username).await?;

        info!("Registered user {} ({})", username, uid);
        Ok(uid)
    }

    /// Mail a verification link to a locally known user
    pub async fn send_verification_email(&self, email: &str) -> Result<()> {
        let email = required(email, "Email must not be empty")?;

        let user: LocalUser = self
            .users_repo
            .get_by_email(email)
            .await?
            .ok_or_else(|| Error::NotFound("Email not found".to_string()))?;

        let link = self.identity.email_verification_link(email).await?;
        let html = mailer::verification_email(&self.app_name, &user.username, &link);
        self.mailer
            .send_html(email, mailer::VERIFICATION_SUBJECT, &html)
            .await?;

        info!("Verification email sent to {}", email);
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = required(email, "Email and password are required")?;
        if password.is_empty() {
            return Err(Error::Validation("Email and password are required".to_string()).into());
        }

        let account = self
            .identity
            .find_account(email)
            .await?
            .ok_or_else(|| Error::NotFound("Email is not registered".to_string()))?;

        if !account.email_verified {
            warn!("Login refused for unverified account {}", account.uid);
            return Err(Error::Forbidden("Please verify your email first".to_string()).into());
        }

        let session = self.identity.sign_in(email, password).await?;

        let user = self
            .users_repo
            .get_by_uid(&session.uid)
            .await?
            .ok_or_else(|| Error::NotFound("User not found in local database".to_string()))?;

        info!("User logged in: {}", user.username);

        Ok(LoginOutcome {
            uid: session.uid,
            username: user.username,
            tokens: SessionTokens {
                id_token: session.id_token,
                refresh_token: session.refresh_token,
            },
        })
    }

    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let email = required(email, "Email must not be empty")?;

        let link = self.identity.password_reset_link(email).await?;
        let html = mailer::password_reset_email(&link);
        self.mailer
            .send_html(email, mailer::PASSWORD_RESET_SUBJECT, &html)
            .await?;

        info!("Password reset link sent to {}", email);
        Ok(())
    }

    pub async fn reset_password(&self, oob_code: &str, new_password: &str) -> Result<()> {
        let oob_code = required(oob_code, "Code and new password must not be empty")?;
        if new_password.is_empty() {
            return Err(
                Error::Validation("Code and new password must not be empty".to_string()).into(),
            );
        }

        self.identity
            .confirm_password_reset(oob_code, new_password)
            .await?;

        info!("Password reset confirmed");
        Ok(())
    }
}
