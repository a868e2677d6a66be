pub mod config;
pub mod digest;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod processor;
pub mod render;
pub mod schedule;
pub mod scraper;

pub use digest::{Digest, RunOutcome};
