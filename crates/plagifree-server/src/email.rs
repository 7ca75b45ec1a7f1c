use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use plagifree_core::config::SmtpConfig;
use plagifree_core::{Mailer, PlagiError, PlagiResult};

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> PlagiResult<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| PlagiError::InternalError(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();
        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    async fn deliver(&self, to: &str, subject: &str, html: &str) -> PlagiResult<()> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| PlagiError::InternalError(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| PlagiError::InvalidRequest(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| PlagiError::InternalError(format!("Failed to build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| PlagiError::Upstream(format!("Failed to send email: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> bool {
        match self.deliver(to, subject, html).await {
            Ok(()) => {
                tracing::info!(to, subject, "email sent");
                true
            }
            Err(e) => {
                tracing::warn!(to, subject, error = %e, "email delivery failed");
                false
            }
        }
    }
}

/// Used when no SMTP relay is configured: the message is logged, not sent.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> bool {
        tracing::info!(to, subject, body = html, "email not sent: no SMTP relay configured");
        true
    }
}

pub fn verification_email(public_url: &str, token: &str) -> (String, String) {
    let link = format!("{}/verify-email?token={token}", public_url.trim_end_matches('/'));
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #4F46E5;">Welcome to PlagiFree AI!</h2>
  <p>Please confirm your email address to finish setting up your account.</p>
  <p style="margin: 30px 0;">
    <a href="{link}" style="background-color: #4F46E5; color: white; padding: 12px 30px; text-decoration: none; border-radius: 25px;">Verify Email Address</a>
  </p>
  <p style="color: #666; font-size: 14px;">If you did not sign up, ignore this message.</p>
  <p style="color: #666; font-size: 12px;">The link expires in 24 hours.</p>
</div>"#
    );
    ("Verify your email - PlagiFree AI".to_string(), html)
}

pub fn owner_setup_email(public_url: &str) -> (String, String) {
    let link = format!("{}/admin/setup", public_url.trim_end_matches('/'));
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #4F46E5;">Finish your payout setup</h2>
  <p>Your account is the administrator of this PlagiFree installation. Add your payout details so credit purchases can be accepted.</p>
  <p style="margin: 30px 0;">
    <a href="{link}" style="background-color: #4F46E5; color: white; padding: 12px 30px; text-decoration: none; border-radius: 25px;">Open payout settings</a>
  </p>
</div>"#
    );
    ("Complete Your Payment Setup - PlagiFree AI".to_string(), html)
}
