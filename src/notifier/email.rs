use lettre::Message;
use lettre::message::{MultiPart, SinglePart};
use tracing::info;

use super::transport::MailTransport;
use crate::config::EmailCredentials;
use crate::error::Result;

/// Builds a multipart/alternative message with a single HTML part.
pub fn build_message(credentials: &EmailCredentials, subject: &str, html: &str) -> Result<Message> {
    let message = Message::builder()
        .from(credentials.user.parse()?)
        .to(credentials.recipient.parse()?)
        .subject(subject)
        .multipart(MultiPart::alternative().singlepart(SinglePart::html(html.to_string())))?;
    Ok(message)
}

pub fn send(
    mailer: &dyn MailTransport,
    credentials: &EmailCredentials,
    subject: &str,
    html: &str,
) -> Result<()> {
    let message = build_message(credentials, subject, html)?;
    mailer.send(credentials, &message)?;
    info!("✓ Email sent via Gmail");
    Ok(())
}
