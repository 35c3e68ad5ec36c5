//! Command-line entry point for the advisory post pipeline.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use advisory_post::api::OpenAiChat;
use advisory_post::cli::Cli;
use advisory_post::config::Config;
use advisory_post::delivery::smtp::SmtpMailer;
use advisory_post::delivery::{DeliveryManager, DeliveryOutcome};
use advisory_post::pipeline::{self, RunOutcome};
use advisory_post::scrapers::moneycontrol::MoneycontrolScraper;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!(error = %e, "Failed to load .env; continuing with process environment"),
    }

    let args = Cli::parse();
    let config = Config::from_cli(&args)?;
    debug!(
        source = %config.source.url,
        model = %config.llm.model,
        smtp_host = %config.mail.host,
        max_retries = config.delivery.max_retries,
        "Configuration loaded"
    );

    let source = MoneycontrolScraper::new(config.source.clone())?;
    let api = OpenAiChat::new(config.llm.clone())?;
    let delivery = DeliveryManager::new(
        SmtpMailer::new(config.mail.clone()),
        &config.mail,
        &config.delivery,
    );

    let outcome = pipeline::run(&source, &api, &delivery).await;
    report(&outcome, &config);

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}

/// Print the console summary for a finished run.
fn report(outcome: &RunOutcome, config: &Config) {
    match outcome {
        RunOutcome::NoContext(e) => {
            println!("Error scraping market context: {e}");
        }
        RunOutcome::NoPost { error, .. } => {
            println!("Error generating post: {error}");
        }
        RunOutcome::Delivered { delivery, .. } => match delivery {
            DeliveryOutcome::Sent { attempts } => {
                println!("✓ Email sent successfully (attempt {attempts})");
            }
            DeliveryOutcome::Persisted {
                path,
                subject,
                attempts,
                error,
            } => {
                println!("\n❌ All {attempts} attempts failed: {error}");
                println!(
                    "Post saved to '{}' folder as {}.",
                    config.delivery.failed_posts_dir.display(),
                    path.display()
                );
                println!("Subject: {subject}");
                println!("You can manually send it later using the saved subject and content.");
            }
            DeliveryOutcome::Lost {
                attempts,
                error,
                persist_error,
            } => {
                println!("\n❌ All {attempts} attempts failed: {error}");
                println!("Failed to save error log: {persist_error}");
                println!("Copy the post printed above to send it manually.");
            }
        },
    }
}
