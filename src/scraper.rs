use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use feed_rs::model::Entry;
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::Html;
use tracing::{debug, error, info};
use url::Url;

use crate::config::{FeedSource, ScrapeSettings};
use crate::error::Result;
use crate::models::{Article, Snapshot};

pub const UNKNOWN_PUBLISHED: &str = "Unknown";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// Shared client so every feed reuses connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build HTTP client")
});

/// Retrieves the raw body of a feed.
pub trait FeedFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFeedFetcher;

impl FeedFetcher for HttpFeedFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = CLIENT.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Drops entries older than a maximum age. Disabled unless configured;
/// entries without a timestamp always pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecencyPolicy {
    max_age: Option<chrono::Duration>,
}

impl RecencyPolicy {
    pub fn disabled() -> Self {
        Self { max_age: None }
    }

    pub fn max_age(max_age: chrono::Duration) -> Self {
        Self {
            max_age: Some(max_age),
        }
    }

    pub fn admits(&self, published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match (self.max_age, published) {
            (Some(max_age), Some(published)) => published >= now - max_age,
            _ => true,
        }
    }
}

/// The fields of a feed entry the digest cares about.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        // The alternate link (or one without rel) is the article itself
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone());

        RawEntry {
            title: entry.title.map(|t| t.content),
            link,
            summary: entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body)),
            published: entry.published.or(entry.updated),
        }
    }
}

impl RawEntry {
    /// `base` resolves relative links; links that cannot be resolved are
    /// kept as written.
    pub fn into_article(self, source: &str, base: Option<&Url>, summary_chars: usize) -> Article {
        let link = self
            .link
            .map(|link| resolve_link(&link, base))
            .unwrap_or_default();

        Article {
            title: self.title.unwrap_or_else(|| "No title".to_string()),
            link,
            summary: clean_html(self.summary.as_deref().unwrap_or(""), summary_chars),
            published: self
                .published
                .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| UNKNOWN_PUBLISHED.to_string()),
            source: source.to_string(),
            score: None,
        }
    }
}

fn resolve_link(link: &str, base: Option<&Url>) -> String {
    if link.is_empty() || Url::parse(link).is_ok() {
        return link.to_string();
    }

    match base.map(|base| base.join(link)) {
        Some(Ok(resolved)) => resolved.to_string(),
        _ => link.to_string(),
    }
}

pub struct Scraper {
    sources: Vec<FeedSource>,
    settings: ScrapeSettings,
    fetcher: Box<dyn FeedFetcher>,
}

impl Scraper {
    pub fn new(sources: Vec<FeedSource>, settings: ScrapeSettings) -> Self {
        Self::with_fetcher(sources, settings, Box::new(HttpFeedFetcher))
    }

    pub fn with_fetcher(
        sources: Vec<FeedSource>,
        settings: ScrapeSettings,
        fetcher: Box<dyn FeedFetcher>,
    ) -> Self {
        Self {
            sources,
            settings,
            fetcher,
        }
    }

    /// Scrapes every configured source. Failing feeds are logged and
    /// skipped, so the result may be empty but never an error.
    pub fn fetch_all(&self) -> Vec<Article> {
        let mut all_articles = Vec::new();

        for source in &self.sources {
            info!("Scraping {}...", source.name);
            match self.scrape_feed(source) {
                Ok(articles) => {
                    info!("Scraped {} articles from {}", articles.len(), source.name);
                    all_articles.extend(articles);
                }
                Err(e) => error!(source = %source.name, "Error scraping {}: {}", source.name, e),
            }
        }

        let unique = dedup_by_title(all_articles);
        info!("Total unique articles scraped: {}", unique.len());
        unique
    }

    fn scrape_feed(&self, source: &FeedSource) -> Result<Vec<Article>> {
        let body = self.fetcher.fetch(&source.url)?;
        let feed = feed_rs::parser::parse(&body[..])?;
        let base = Url::parse(&source.url).ok();
        let now = Utc::now();

        let mut articles = Vec::new();
        for entry in feed.entries.into_iter().take(self.settings.max_entries_per_feed) {
            let raw = RawEntry::from(entry);
            if !self.settings.recency.admits(raw.published, now) {
                debug!("Skipping stale entry from {}", source.name);
                continue;
            }

            articles.push(raw.into_article(&source.name, base.as_ref(), self.settings.summary_chars));
        }

        Ok(articles)
    }

    /// Writes the snapshot, logging instead of failing.
    pub fn persist(&self, articles: &[Article], path: &Path) {
        match save_snapshot(path, articles) {
            Ok(()) => info!("Saved {} articles to {}", articles.len(), path.display()),
            Err(e) => error!("Error saving articles: {}", e),
        }
    }
}

/// Strips markup and keeps at most `max_chars` characters of text.
pub fn clean_html(html: &str, max_chars: usize) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.chars().take(max_chars).collect()
}

/// Keeps the first article for every case-insensitive title.
pub fn dedup_by_title(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(article.title.to_lowercase()))
        .collect()
}

pub fn save_snapshot(path: &Path, articles: &[Article]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let snapshot = Snapshot::new(
        Local::now().format(TIMESTAMP_FORMAT).to_string(),
        articles.to_vec(),
    );
    let json = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;

    struct StaticFetcher {
        bodies: HashMap<String, String>,
    }

    impl FeedFetcher for StaticFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.bodies
                .get(url)
                .map(|body| body.clone().into_bytes())
                .ok_or_else(|| AppError::FetchError(format!("connection refused: {}", url)))
        }
    }

    fn rss(items: &[(&str, &str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(title, link, description)| {
                format!(
                    "<item><title>{}</title><link>{}</link><description><![CDATA[{}]]></description>\
                     <pubDate>Tue, 14 Oct 2025 08:30:00 GMT</pubDate></item>",
                    title, link, description
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test</title><link>https://example.com</link><description>Test feed</description>{}</channel></rss>"#,
            items
        )
    }

    fn atom(entries: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?><feed xmlns="http://www.w3.org/2005/Atom"><title>Test</title><id>urn:test</id><updated>2025-10-14T08:30:00Z</updated>{}</feed>"#,
            entries
        )
    }

    fn single_feed(body: String) -> Scraper {
        scraper_with(vec![("test_feed", "https://feeds.test/feed.xml", body)])
    }

    fn scraper_with(feeds: Vec<(&str, &str, String)>) -> Scraper {
        let sources = feeds
            .iter()
            .map(|(name, url, _)| FeedSource::new(*name, *url))
            .collect();
        let bodies = feeds
            .into_iter()
            .map(|(_, url, body)| (url.to_string(), body))
            .collect();
        Scraper::with_fetcher(
            sources,
            ScrapeSettings::default(),
            Box::new(StaticFetcher { bodies }),
        )
    }

    #[test]
    fn parses_rss_entries_into_articles() {
        let scraper = scraper_with(vec![(
            "techcrunch_ai",
            "https://feeds.test/tc",
            rss(&[(
                "OpenAI ships a model",
                "https://example.com/a",
                "<p>Big <b>news</b> today</p>",
            )]),
        )]);

        let articles = scraper.fetch_all();
        assert_eq!(articles.len(), 1);
        let article = &articles[0];
        assert_eq!(article.title, "OpenAI ships a model");
        assert_eq!(article.link, "https://example.com/a");
        assert_eq!(article.summary, "Big news today");
        assert_eq!(article.published, "2025-10-14 08:30");
        assert_eq!(article.source, "techcrunch_ai");
        assert_eq!(article.score, None);
    }

    #[test]
    fn takes_at_most_ten_entries_per_feed() {
        let titles: Vec<String> = (0..15).map(|i| format!("Story {}", i)).collect();
        let items: Vec<(&str, &str, &str)> = titles
            .iter()
            .map(|t| (t.as_str(), "https://example.com/x", "body"))
            .collect();
        let scraper = scraper_with(vec![("mit_news", "https://feeds.test/mit", rss(&items))]);

        let articles = scraper.fetch_all();
        assert_eq!(articles.len(), 10);
        assert_eq!(articles[0].title, "Story 0");
        assert_eq!(articles[9].title, "Story 9");
    }

    #[test]
    fn failing_feeds_do_not_abort_the_scrape() {
        let mut scraper = scraper_with(vec![
            ("broken_xml", "https://feeds.test/broken", "this is not xml".to_string()),
            (
                "working",
                "https://feeds.test/ok",
                rss(&[("Still here", "https://example.com/ok", "fine")]),
            ),
        ]);
        scraper
            .sources
            .insert(0, FeedSource::new("offline", "https://feeds.test/offline"));

        let articles = scraper.fetch_all();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "working");
    }

    #[test]
    fn all_feeds_failing_yields_empty_list() {
        let scraper = Scraper::with_fetcher(
            vec![FeedSource::new("offline", "https://feeds.test/offline")],
            ScrapeSettings::default(),
            Box::new(StaticFetcher {
                bodies: HashMap::new(),
            }),
        );
        assert!(scraper.fetch_all().is_empty());
    }

    #[test]
    fn duplicate_titles_across_sources_keep_the_first() {
        let scraper = scraper_with(vec![
            (
                "first",
                "https://feeds.test/1",
                rss(&[
                    ("GPT-5 Released", "https://one.example/a", "a"),
                    ("Unrelated", "https://one.example/b", "b"),
                ]),
            ),
            (
                "second",
                "https://feeds.test/2",
                rss(&[("gpt-5 released", "https://two.example/a", "c")]),
            ),
        ]);

        let articles = scraper.fetch_all();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "GPT-5 Released");
        assert_eq!(articles[0].source, "first");
        assert_eq!(articles[1].title, "Unrelated");
    }

    #[test]
    fn raw_entry_defaults_missing_fields() {
        let article = RawEntry::default().into_article("arxiv_ai", None, 300);
        assert_eq!(article.title, "No title");
        assert_eq!(article.link, "");
        assert_eq!(article.summary, "");
        assert_eq!(article.published, UNKNOWN_PUBLISHED);
    }

    #[test]
    fn relative_links_resolve_against_the_feed_url() {
        let scraper = single_feed(rss(&[("GPT news", "/blog/gpt", "relative link")]));

        let articles = scraper.fetch_all();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "GPT news");
        assert_eq!(articles[0].link, "https://feeds.test/blog/gpt");
    }

    #[test]
    fn unresolvable_links_are_kept_as_written() {
        let raw = RawEntry {
            title: Some("Odd link".into()),
            link: Some("not a url".into()),
            ..Default::default()
        };
        let article = raw.into_article("arxiv_ai", None, 300);
        assert_eq!(article.title, "Odd link");
        assert_eq!(article.link, "not a url");
    }

    #[test]
    fn atom_content_fills_in_for_missing_summary() {
        let scraper = single_feed(atom(
            r#"<entry><title>Neural nets</title><id>urn:1</id><updated>2025-10-14T08:30:00Z</updated>
               <link href="https://example.com/nn"/>
               <content type="html">&lt;p&gt;OpenAI research on neural nets&lt;/p&gt;</content></entry>"#,
        ));

        let articles = scraper.fetch_all();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].summary, "OpenAI research on neural nets");
    }

    #[test]
    fn atom_alternate_link_wins_over_other_relations() {
        let scraper = single_feed(atom(
            r#"<entry><title>Linked</title><id>urn:2</id><updated>2025-10-14T08:30:00Z</updated>
               <link rel="replies" href="https://example.com/comments"/>
               <link rel="alternate" href="https://example.com/post"/></entry>"#,
        ));

        let articles = scraper.fetch_all();
        assert_eq!(articles[0].link, "https://example.com/post");
    }

    #[test]
    fn atom_updated_stands_in_for_published() {
        let scraper = single_feed(atom(
            r#"<entry><title>Only updated</title><id>urn:3</id><updated>2025-10-13T17:05:00Z</updated>
               <link href="https://example.com/u"/></entry>"#,
        ));

        let articles = scraper.fetch_all();
        assert_eq!(articles[0].published, "2025-10-13 17:05");
    }

    #[test]
    fn rss_item_without_date_is_unknown() {
        let body = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title><link>https://example.com</link><description>d</description>
            <item><title>Undated</title><link>https://example.com/undated</link></item></channel></rss>"#;
        let scraper = single_feed(body.to_string());

        let articles = scraper.fetch_all();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].published, UNKNOWN_PUBLISHED);
    }

    #[test]
    fn recency_cutoff_drops_stale_entries_during_scrape() {
        let recent = Utc::now().to_rfc2822();
        let body = format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title><link>https://example.com</link><description>d</description>
            <item><title>Ancient</title><link>https://example.com/old</link><pubDate>Sat, 01 Jan 2000 00:00:00 GMT</pubDate></item>
            <item><title>Fresh</title><link>https://example.com/new</link><pubDate>{}</pubDate></item></channel></rss>"#,
            recent
        );
        let scraper = Scraper::with_fetcher(
            vec![FeedSource::new("test_feed", "https://feeds.test/feed.xml")],
            ScrapeSettings {
                recency: RecencyPolicy::max_age(chrono::Duration::hours(24)),
                ..Default::default()
            },
            Box::new(StaticFetcher {
                bodies: HashMap::from([("https://feeds.test/feed.xml".to_string(), body)]),
            }),
        );

        let articles = scraper.fetch_all();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Fresh");
    }

    #[test]
    fn clean_html_strips_tags_and_caps_length() {
        assert_eq!(clean_html("<div>a &amp; <i>b</i></div>", 300), "a & b");

        let long = format!("<p>{}</p>", "é".repeat(400));
        let cleaned = clean_html(&long, 300);
        assert_eq!(cleaned.chars().count(), 300);
    }

    #[test]
    fn recency_policy_is_inert_unless_enabled() {
        let now = Utc::now();
        let old = Some(now - chrono::Duration::days(3));

        assert!(RecencyPolicy::disabled().admits(old, now));

        let policy = RecencyPolicy::max_age(chrono::Duration::hours(24));
        assert!(!policy.admits(old, now));
        assert!(policy.admits(Some(now - chrono::Duration::hours(2)), now));
        assert!(policy.admits(None, now));
    }

    #[test]
    fn snapshot_round_trip_preserves_articles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("articles.json");
        let articles = vec![
            Article {
                title: "Ünïcode título".into(),
                link: "https://example.com/1".into(),
                summary: "résumé".into(),
                published: "2025-10-14 08:30".into(),
                source: "mit_news".into(),
                score: None,
            },
            Article {
                title: "Second".into(),
                link: String::new(),
                summary: String::new(),
                published: UNKNOWN_PUBLISHED.into(),
                source: "arxiv_ai".into(),
                score: None,
            },
        ];

        save_snapshot(&path, &articles).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Ünïcode título"));
        assert!(raw.contains("\n  \"articles\""));
        assert!(!raw.contains("\"score\""));

        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.articles, articles);
    }
}
