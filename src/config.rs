use std::env;
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::scraper::RecencyPolicy;

pub const DEFAULT_SNAPSHOT_PATH: &str = "data/articles.json";
pub const DEFAULT_LOG_PATH: &str = "logs/tech_news_digest.log";
pub const DEFAULT_DIGEST_SIZE: usize = 10;
pub const DEFAULT_MIN_SCORE: i32 = 1;

const PRIORITY_KEYWORDS: &[&str] = &[
    "breakthrough", "launch", "release", "new model", "gpt", "claude",
    "gemini", "llm", "ai model", "open source", "announcement",
    "research", "study", "mit", "stanford", "deepmind", "openai",
    "anthropic", "meta ai", "google ai", "microsoft", "nvidia",
    "transformer", "neural", "machine learning", "deep learning",
    "robotics", "autonomous", "self-driving", "quantum",
];

const EXCLUDE_KEYWORDS: &[&str] = &["sponsored", "advertisement", "ad:", "promoted"];

const FEED_SOURCES: &[(&str, &str)] = &[
    ("techcrunch_ai", "https://techcrunch.com/category/artificial-intelligence/feed/"),
    ("mit_news", "https://news.mit.edu/topic/mitartificial-intelligence2-rss.xml"),
    ("arxiv_ai", "http://export.arxiv.org/rss/cs.AI"),
    ("venturebeat_ai", "https://venturebeat.com/category/ai/feed/"),
    ("theverge_ai", "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml"),
    ("openai_blog", "https://openai.com/blog/rss/"),
];

/// One configured RSS/Atom source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

pub fn default_sources() -> Vec<FeedSource> {
    FEED_SOURCES
        .iter()
        .map(|(name, url)| FeedSource::new(*name, *url))
        .collect()
}

/// Keyword lists used for relevance scoring. Stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    pub priority: Vec<String>,
    pub exclude: Vec<String>,
}

impl KeywordSet {
    pub fn new<P, E>(priority: P, exclude: E) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            priority: priority.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
            exclude: exclude.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::new(PRIORITY_KEYWORDS, EXCLUDE_KEYWORDS)
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub max_entries_per_feed: usize,
    pub summary_chars: usize,
    pub recency: RecencyPolicy,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            max_entries_per_feed: 10,
            summary_chars: 300,
            recency: RecencyPolicy::disabled(),
        }
    }
}

#[derive(Clone)]
pub struct WhatsAppCredentials {
    pub phone: String,
    pub api_key: String,
}

#[derive(Clone)]
pub struct EmailCredentials {
    pub user: String,
    pub app_password: String,
    pub recipient: String,
}

#[derive(Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

/// Per-channel credentials. A missing group disables only that channel.
#[derive(Clone, Default)]
pub struct ChannelCredentials {
    pub whatsapp: Option<WhatsAppCredentials>,
    pub email: Option<EmailCredentials>,
    pub telegram: Option<TelegramCredentials>,
}

#[derive(Clone)]
pub struct Config {
    pub sources: Vec<FeedSource>,
    pub keywords: KeywordSet,
    pub scrape: ScrapeSettings,
    pub snapshot_path: PathBuf,
    pub log_path: PathBuf,
    pub digest_size: usize,
    pub min_score: i32,
    pub channels: ChannelCredentials,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let whatsapp = match (var("CALLMEBOT_PHONE"), var("CALLMEBOT_APIKEY")) {
            (Some(phone), Some(api_key)) => Some(WhatsAppCredentials { phone, api_key }),
            _ => None,
        };

        let email = match (var("GMAIL_USER"), var("GMAIL_APP_PASSWORD"), var("EMAIL_TO")) {
            (Some(user), Some(app_password), Some(recipient)) => Some(EmailCredentials {
                user,
                app_password,
                recipient,
            }),
            _ => None,
        };

        let telegram = match (var("TELEGRAM_BOT_TOKEN"), var("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramCredentials { bot_token, chat_id }),
            _ => None,
        };

        let mut scrape = ScrapeSettings::default();
        if let Some(hours) = var("DIGEST_MAX_AGE_HOURS") {
            let hours = hours
                .trim()
                .parse::<i64>()
                .map_err(|e| AppError::ConfigError(format!("Invalid DIGEST_MAX_AGE_HOURS: {}", e)))?;
            scrape.recency = RecencyPolicy::max_age(chrono::Duration::hours(hours));
        }

        let snapshot_path = var("DIGEST_SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH));
        let log_path = var("DIGEST_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));

        Ok(Config {
            sources: default_sources(),
            keywords: KeywordSet::default(),
            scrape,
            snapshot_path,
            log_path,
            digest_size: DEFAULT_DIGEST_SIZE,
            min_score: DEFAULT_MIN_SCORE,
            channels: ChannelCredentials {
                whatsapp,
                email,
                telegram,
            },
        })
    }
}
