use std::path::Path;

use tracing::{error, info};

use crate::config::{DEFAULT_MIN_SCORE, KeywordSet};
use crate::error::AppError;
use crate::models::Article;
use crate::scraper::load_snapshot;

pub const DEFAULT_MAX_ARTICLES: usize = 15;

const TITLE_WEIGHT: i32 = 3;
const SUMMARY_WEIGHT: i32 = 1;
const EXCLUSION_PENALTY: i32 = 10;

/// Scores and ranks articles against a keyword set.
pub struct Processor {
    keywords: KeywordSet,
}

impl Processor {
    pub fn new(keywords: KeywordSet) -> Self {
        Self { keywords }
    }

    /// Relevance of one article. Keywords match as lowercase substrings; a
    /// priority keyword counts in the title and the summary independently,
    /// an exclusion keyword is penalised once.
    pub fn score(&self, article: &Article) -> i32 {
        let title = article.title.to_lowercase();
        let summary = article.summary.to_lowercase();

        let mut score = 0;
        for keyword in &self.keywords.priority {
            if title.contains(keyword.as_str()) {
                score += TITLE_WEIGHT;
            }
            if summary.contains(keyword.as_str()) {
                score += SUMMARY_WEIGHT;
            }
        }

        for keyword in &self.keywords.exclude {
            if title.contains(keyword.as_str()) || summary.contains(keyword.as_str()) {
                score -= EXCLUSION_PENALTY;
            }
        }

        score
    }

    /// Attaches scores, keeps articles scoring at least `min_score`, and
    /// returns the best `max_articles` in descending score order. Ties keep
    /// their input order.
    pub fn filter_and_rank(
        &self,
        articles: Vec<Article>,
        min_score: i32,
        max_articles: usize,
    ) -> Vec<Article> {
        let mut ranked: Vec<Article> = articles
            .into_iter()
            .map(|mut article| {
                article.score = Some(self.score(&article));
                article
            })
            .filter(|article| article.score.unwrap_or_default() >= min_score)
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(max_articles);
        ranked
    }

    /// Ranks the articles of a previously written snapshot with the default
    /// limits. Unreadable snapshots yield an empty list.
    pub fn process_snapshot(&self, path: &Path) -> Vec<Article> {
        match load_snapshot(path) {
            Ok(snapshot) => {
                let total = snapshot.articles.len();
                let processed =
                    self.filter_and_rank(snapshot.articles, DEFAULT_MIN_SCORE, DEFAULT_MAX_ARTICLES);
                info!("Processed {} articles from {} total", processed.len(), total);
                processed
            }
            Err(AppError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                error!("Articles file not found: {}", path.display());
                Vec::new()
            }
            Err(e) => {
                error!("Error processing articles: {}", e);
                Vec::new()
            }
        }
    }
}
