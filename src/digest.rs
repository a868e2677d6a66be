use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::models::{Channel, DeliveryReport};
use crate::notifier::{EmailPayload, Notifier, Payloads};
use crate::processor::Processor;
use crate::render::{email_subject, render_email, render_plain_digest};
use crate::scraper::Scraper;

const BANNER: &str = "==================================================";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No feed produced any article.
    NoArticles,
    /// Articles were scraped but none reached the minimum score.
    NothingRelevant,
    Delivered(DeliveryReport),
    Failed(String),
}

/// Runs the scrape, rank, render and deliver pipeline.
pub struct Digest {
    config: Config,
    scraper: Scraper,
    processor: Processor,
    notifier: Notifier,
}

impl Digest {
    pub fn new(config: Config) -> Result<Self> {
        let scraper = Scraper::new(config.sources.clone(), config.scrape.clone());
        let processor = Processor::new(config.keywords.clone());
        let notifier = Notifier::new(config.channels.clone())?;
        Ok(Self::from_parts(config, scraper, processor, notifier))
    }

    pub fn from_parts(
        config: Config,
        scraper: Scraper,
        processor: Processor,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            scraper,
            processor,
            notifier,
        }
    }

    /// One complete run. Never fails; every problem ends up in the log and
    /// in the returned outcome.
    pub fn run_once(&self) -> RunOutcome {
        info!("{}", BANNER);
        info!("Starting daily tech news digest");
        info!("Time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        info!("{}", BANNER);

        let today = Local::now().date_naive();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_for(today)))
            .unwrap_or_else(|payload| RunOutcome::Failed(panic_message(payload.as_ref())));

        match &outcome {
            RunOutcome::Delivered(report) => {
                log_report(report);
                info!("{}", BANNER);
                info!("Daily digest completed successfully");
                info!("{}", BANNER);
            }
            RunOutcome::Failed(message) => error!("Error in daily digest: {}", message),
            RunOutcome::NoArticles | RunOutcome::NothingRelevant => {}
        }

        outcome
    }

    fn run_for(&self, today: NaiveDate) -> RunOutcome {
        info!("Step 1: Scraping news sources...");
        let articles = self.scraper.fetch_all();
        if articles.is_empty() {
            warn!("No articles found. Exiting.");
            return RunOutcome::NoArticles;
        }

        self.scraper.persist(&articles, &self.config.snapshot_path);

        info!("Step 2: Processing and filtering articles...");
        let top = self
            .processor
            .filter_and_rank(articles, self.config.min_score, self.config.digest_size);
        if top.is_empty() {
            warn!("No articles passed filtering. Exiting.");
            return RunOutcome::NothingRelevant;
        }
        info!("Selected {} top articles", top.len());

        info!("Step 3: Formatting content...");
        let plain = render_plain_digest(&top, today);
        let payloads = Payloads {
            whatsapp: Some(plain.clone()),
            email: Some(EmailPayload {
                subject: email_subject(today),
                html: render_email(&top, today),
            }),
            telegram: Some(plain),
        };

        info!("Step 4: Sending notifications...");
        RunOutcome::Delivered(self.notifier.send_all(&payloads))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn log_report(report: &DeliveryReport) {
    for result in &report.results {
        let name = channel_title(result.channel);
        if result.success {
            info!("✓ {} notification sent successfully", name);
        } else {
            warn!("✗ {} notification failed or not configured", name);
        }
    }
}

fn channel_title(channel: Channel) -> &'static str {
    match channel {
        Channel::WhatsApp => "WhatsApp",
        Channel::Email => "Email",
        Channel::Telegram => "Telegram",
    }
}
