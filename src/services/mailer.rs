use crate::config::MailConfig;
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::info;

/// Outbound HTML mail
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

/// SMTP relay mailer authenticated with the configured account
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let from: Mailbox = config
            .sender()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid sender address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| Error::Config(format!("Invalid SMTP relay: {}", e)))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| Error::Validation(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| Error::Internal(format!("Failed to build email: {}", e)))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| Error::Upstream(format!("Failed to send email: {}", e)))?;

        info!("Email sent to {}: {:?}", to, response.code());
        Ok(())
    }
}

pub const VERIFICATION_SUBJECT: &str = "Verify your email";
pub const PASSWORD_RESET_SUBJECT: &str = "Reset your password";

/// Body of the account verification mail
pub fn verification_email(app_name: &str, username: &str, link: &str) -> String {
    format!(
        r#"<p>Hello {username},</p>
<p>Thank you for registering with {app}!</p>
<p>To finish signing up, please click the link below to verify your email address:</p>
<p><a href="{link}">Verify Email</a></p>
<p>If you did not sign up, you can ignore this email.</p>
<p>Best regards,<br>The {app} team</p>"#,
        username = escape_html(username),
        app = escape_html(app_name),
        link = escape_html(link),
    )
}

/// Body of the password reset mail
pub fn password_reset_email(link: &str) -> String {
    format!(
        r#"<p>Hello,</p>
<p>Please click the link below to reset your password:</p>
<p><a href="{link}">Reset Password</a></p>
<p>If you did not request a password reset, you can ignore this email.</p>"#,
        link = escape_html(link),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
