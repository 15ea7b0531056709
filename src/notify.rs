use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound channel for one-time codes. The SMTP implementation is the
/// only production channel; tests plug a no-op.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_one_time_code(&self, to_email: &str, code: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    from: String,
}

impl SmtpNotifier {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(cfg.user.clone(), cfg.password.clone());
        let mailer = SmtpTransport::starttls_relay(&cfg.host)?
            .credentials(creds)
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();
        Ok(Self {
            mailer,
            from: cfg.user.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_one_time_code(&self, to_email: &str, code: &str) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(to_email.parse()?)
            .subject("One-time password")
            .header(ContentType::TEXT_HTML)
            .body(format!(
                "This is an OTP to activate your account: <h1>{}</h1>",
                code
            ))?;

        // The sync transport blocks, so hand it off the async runtime.
        let mailer = self.mailer.clone();
        let sent = tokio::task::spawn_blocking(move || mailer.send(&email)).await?;
        sent?;

        info!(to = %to_email, "one-time code dispatched");
        Ok(())
    }
}
