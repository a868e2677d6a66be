use std::time::Duration;

use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use reqwest::blocking::Client;
use url::Url;

use crate::config::EmailCredentials;
use crate::error::Result;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const SMTP_HOST: &str = "smtp.gmail.com";
pub const SMTP_PORT: u16 = 465;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Blocking HTTP calls made by the chat channels.
pub trait HttpTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse>;
    fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<HttpResponse>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse> {
        let response = self.client.get(url.clone()).send()?;
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        Ok(HttpResponse { status, body })
    }

    fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<HttpResponse> {
        let response = self.client.post(url).json(payload).send()?;
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        Ok(HttpResponse { status, body })
    }
}

/// Submits one fully built email.
pub trait MailTransport {
    fn send(&self, credentials: &EmailCredentials, message: &Message) -> Result<()>;
}

/// Implicit-TLS SMTP relay. Every call opens, authenticates, sends and closes
/// its own connection.
pub struct SmtpMailer {
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for SmtpMailer {
    fn default() -> Self {
        Self::new(SMTP_HOST, SMTP_PORT)
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, credentials: &EmailCredentials, message: &Message) -> Result<()> {
        let mailer = SmtpTransport::relay(&self.host)?
            .port(self.port)
            .credentials(Credentials::new(
                credentials.user.clone(),
                credentials.app_password.clone(),
            ))
            .timeout(Some(REQUEST_TIMEOUT))
            .build();

        mailer.send(message)?;
        Ok(())
    }
}
