use serde_json::json;
use tracing::info;

use super::transport::HttpTransport;
use crate::config::TelegramCredentials;
use crate::error::{AppError, Result};

/// Telegram allows 4096 characters per message.
pub const MAX_CHUNK_CHARS: usize = 4000;

/// Splits a message into consecutive chunks of at most `limit` characters.
/// Chunks ignore word boundaries.
pub fn split_chunks(message: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = message.chars().collect();
    if chars.len() <= limit {
        return vec![message.to_string()];
    }

    chars.chunks(limit).map(|chunk| chunk.iter().collect()).collect()
}

fn endpoint(bot_token: &str) -> String {
    format!("https://api.telegram.org/bot{}/sendMessage", bot_token)
}

/// Posts the message chunk by chunk. The first rejected chunk stops the
/// delivery; chunks already sent stay sent.
pub fn send(http: &dyn HttpTransport, credentials: &TelegramCredentials, message: &str) -> Result<()> {
    let url = endpoint(&credentials.bot_token);
    let chunks = split_chunks(message, MAX_CHUNK_CHARS);
    let total = chunks.len();

    for (i, chunk) in chunks.into_iter().enumerate() {
        let payload = json!({
            "chat_id": credentials.chat_id,
            "text": chunk,
            "parse_mode": "Markdown",
            "disable_web_page_preview": false
        });

        let response = http.post_json(&url, &payload)?;
        if !response.is_ok() {
            return Err(AppError::DeliveryError(format!(
                "Telegram error on chunk {}/{}: {} - {}",
                i + 1,
                total,
                response.status,
                response.body
            )));
        }
    }

    info!("✓ Telegram message sent");
    Ok(())
}
