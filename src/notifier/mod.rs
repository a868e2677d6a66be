pub mod email;
pub mod telegram;
pub mod transport;
pub mod whatsapp;

use tracing::error;

use crate::config::ChannelCredentials;
use crate::error::{AppError, Result};
use crate::models::{Channel, DeliveryReport, DeliveryResult};
use transport::{HttpTransport, MailTransport, ReqwestTransport, SmtpMailer};

pub const TEST_MESSAGE: &str = "🧪 *Test Message*\n\n\
This is a test notification from your Tech News Digest system!\n\n\
If you're seeing this, it works! 🎉";

pub const TEST_EMAIL_HTML: &str = "<html><body><h1>Test Email</h1>\
<p>This is a test notification from your Tech News Digest system!</p>\
<p>If you're seeing this, it works! 🎉</p></body></html>";

#[derive(Debug, Clone)]
pub struct EmailPayload {
    pub subject: String,
    pub html: String,
}

/// What to send on each channel. A missing payload skips the channel.
#[derive(Debug, Clone, Default)]
pub struct Payloads {
    pub whatsapp: Option<String>,
    pub email: Option<EmailPayload>,
    pub telegram: Option<String>,
}

pub struct Notifier {
    credentials: ChannelCredentials,
    http: Box<dyn HttpTransport>,
    mailer: Box<dyn MailTransport>,
}

impl Notifier {
    pub fn new(credentials: ChannelCredentials) -> Result<Self> {
        Ok(Self::with_transports(
            credentials,
            Box::new(ReqwestTransport::new()?),
            Box::new(SmtpMailer::default()),
        ))
    }

    pub fn with_transports(
        credentials: ChannelCredentials,
        http: Box<dyn HttpTransport>,
        mailer: Box<dyn MailTransport>,
    ) -> Self {
        Self {
            credentials,
            http,
            mailer,
        }
    }

    pub fn deliver_whatsapp(&self, message: &str) -> Result<()> {
        let credentials = self.credentials.whatsapp.as_ref().ok_or_else(|| {
            AppError::ConfigError("CallMeBot credentials not found. WhatsApp disabled.".into())
        })?;
        whatsapp::send(self.http.as_ref(), credentials, message)
    }

    pub fn deliver_email(&self, subject: &str, html: &str) -> Result<()> {
        let credentials = self.credentials.email.as_ref().ok_or_else(|| {
            AppError::ConfigError("Gmail credentials not found. Email disabled.".into())
        })?;
        email::send(self.mailer.as_ref(), credentials, subject, html)
    }

    pub fn deliver_telegram(&self, message: &str) -> Result<()> {
        let credentials = self.credentials.telegram.as_ref().ok_or_else(|| {
            AppError::ConfigError("Telegram credentials not found. Telegram disabled.".into())
        })?;
        telegram::send(self.http.as_ref(), credentials, message)
    }

    pub fn send_whatsapp(&self, message: &str) -> bool {
        Self::logged(Channel::WhatsApp, self.deliver_whatsapp(message)).success
    }

    pub fn send_email(&self, subject: &str, html: &str) -> bool {
        Self::logged(Channel::Email, self.deliver_email(subject, html)).success
    }

    pub fn send_telegram(&self, message: &str) -> bool {
        Self::logged(Channel::Telegram, self.deliver_telegram(message)).success
    }

    /// Attempts every channel that has both a payload and credentials.
    /// Channels never affect one another and failures are not retried.
    pub fn send_all(&self, payloads: &Payloads) -> DeliveryReport {
        let results = Channel::ALL
            .iter()
            .map(|&channel| {
                let outcome = match channel {
                    Channel::WhatsApp => payloads.whatsapp.as_deref().map(|m| self.deliver_whatsapp(m)),
                    Channel::Email => payloads
                        .email
                        .as_ref()
                        .map(|p| self.deliver_email(&p.subject, &p.html)),
                    Channel::Telegram => payloads.telegram.as_deref().map(|m| self.deliver_telegram(m)),
                };

                match outcome {
                    Some(result) => Self::logged(channel, result),
                    None => DeliveryResult::failed(channel, "no payload"),
                }
            })
            .collect();

        DeliveryReport { results }
    }

    /// Sends a fixed test message through every channel.
    pub fn send_test(&self) -> DeliveryReport {
        self.send_all(&Payloads {
            whatsapp: Some(TEST_MESSAGE.to_string()),
            email: Some(EmailPayload {
                subject: "Test - Tech News Digest".to_string(),
                html: TEST_EMAIL_HTML.to_string(),
            }),
            telegram: Some(TEST_MESSAGE.to_string()),
        })
    }

    fn logged(channel: Channel, result: Result<()>) -> DeliveryResult {
        match result {
            Ok(()) => DeliveryResult::delivered(channel),
            Err(e) => {
                error!(channel = %channel, "Error sending {} notification: {}", channel, e);
                DeliveryResult::failed(channel, e.to_string())
            }
        }
    }
}
