use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::{error, info};

use tech_digest::{
    config::{Config, DEFAULT_SNAPSHOT_PATH},
    logging::init_logging,
    notifier::Notifier,
    processor::Processor,
    render::{render_email, render_plain_digest},
    schedule::{DailySchedule, DEFAULT_RUN_TIME, POLL_INTERVAL},
    Digest,
};

const PREVIEW_ARTICLES: usize = 3;

/// Daily AI & tech news digest: scrape, rank and deliver.
#[derive(Parser)]
#[command(name = "tech-digest", version)]
struct Cli {
    /// Run the digest once and exit (default)
    #[arg(long, conflicts_with_all = ["schedule", "process", "test_notify"])]
    once: bool,

    /// Run now, then daily at TIME
    #[arg(long, value_name = "TIME", num_args = 0..=1, default_missing_value = DEFAULT_RUN_TIME)]
    schedule: Option<String>,

    /// Rank an existing snapshot and print both digest formats
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_SNAPSHOT_PATH,
          conflicts_with_all = ["schedule", "test_notify"])]
    process: Option<PathBuf>,

    /// Send a test message through every configured channel
    #[arg(long, conflicts_with = "schedule")]
    test_notify: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config decides where the log file goes, so it loads before logging
    let config = Config::load();
    init_logging(config.as_ref().ok().map(|c| c.log_path.as_path()));

    match config.map_err(Into::into).and_then(|config| run(cli, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = cli.process {
        let processor = Processor::new(config.keywords.clone());
        let articles = processor.process_snapshot(&path);
        if !articles.is_empty() {
            let preview = &articles[..articles.len().min(PREVIEW_ARTICLES)];
            let today = Local::now().date_naive();
            println!("\n=== EMAIL FORMAT ===");
            println!("{}", render_email(preview, today));
            println!("\n=== WHATSAPP FORMAT ===");
            println!("{}", render_plain_digest(preview, today));
        }
        return Ok(());
    }

    if cli.test_notify {
        let notifier = Notifier::new(config.channels.clone())?;
        for result in notifier.send_test().results {
            info!(channel = %result.channel, success = result.success, "Test notification");
        }
        return Ok(());
    }

    if let Some(time) = cli.schedule {
        let schedule: DailySchedule = time.parse()?;
        info!("Running in scheduled mode at {}", schedule);
        let digest = Digest::new(config)?;
        schedule.run_forever(POLL_INTERVAL, || {
            digest.run_once();
        });
    }

    if cli.once {
        info!("Running in single-run mode");
    } else {
        info!("No arguments provided. Running once.");
    }
    Digest::new(config)?.run_once();
    Ok(())
}
