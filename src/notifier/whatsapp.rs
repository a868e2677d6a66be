use tracing::info;
use url::Url;

use super::transport::HttpTransport;
use crate::config::WhatsAppCredentials;
use crate::error::{AppError, Result};

const CALLMEBOT_ENDPOINT: &str = "https://api.callmebot.com/whatsapp.php";

/// CallMeBot rejects messages near 3000 characters.
pub const MAX_MESSAGE_CHARS: usize = 2900;
pub const TRUNCATION_NOTICE: &str = "...\n\n[Message truncated - check email for full digest]";

pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_MESSAGE_CHARS {
        return message.to_string();
    }

    let mut truncated: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
    truncated.push_str(TRUNCATION_NOTICE);
    truncated
}

pub fn request_url(credentials: &WhatsAppCredentials, message: &str) -> Result<Url> {
    Ok(Url::parse_with_params(
        CALLMEBOT_ENDPOINT,
        &[
            ("phone", credentials.phone.as_str()),
            ("text", message),
            ("apikey", credentials.api_key.as_str()),
        ],
    )?)
}

pub fn send(http: &dyn HttpTransport, credentials: &WhatsAppCredentials, message: &str) -> Result<()> {
    let message = truncate_message(message);
    let url = request_url(credentials, &message)?;

    let response = http.get(&url)?;
    if !response.is_ok() {
        return Err(AppError::DeliveryError(format!(
            "CallMeBot error: {} - {}",
            response.status, response.body
        )));
    }

    info!("✓ WhatsApp message sent via CallMeBot");
    Ok(())
}
