use std::fmt;

use serde::{Deserialize, Serialize};

/// One normalized news item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
}

/// The persisted raw result of one scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: String,
    pub articles: Vec<Article>,
    pub count: usize,
}

impl Snapshot {
    pub fn new(date: impl Into<String>, articles: Vec<Article>) -> Self {
        let count = articles.len();
        Self {
            date: date.into(),
            articles,
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    WhatsApp,
    Email,
    Telegram,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::WhatsApp, Channel::Email, Channel::Telegram];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::WhatsApp => "whatsapp",
            Channel::Email => "email",
            Channel::Telegram => "telegram",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub channel: Channel,
    pub success: bool,
    /// Why the delivery did not happen, if it failed.
    pub detail: Option<String>,
}

impl DeliveryResult {
    pub fn delivered(channel: Channel) -> Self {
        Self {
            channel,
            success: true,
            detail: None,
        }
    }

    pub fn failed(channel: Channel, detail: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            detail: Some(detail.into()),
        }
    }
}

/// Outcomes of one run across all channels, in [`Channel::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub results: Vec<DeliveryResult>,
}

impl DeliveryReport {
    pub fn succeeded(&self, channel: Channel) -> bool {
        self.results
            .iter()
            .any(|result| result.channel == channel && result.success)
    }
}
