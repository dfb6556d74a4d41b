use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scrape_jobs::{
    stats, FnSink, JobLifecycle, JobSnapshot, JobStats, Platform, QuickScrape, ScrapeConfig,
};
use scrapy_client::ScrapyClient;

#[derive(Parser)]
#[command(name = "scrape-jobs", about = "Launch and monitor social-media scrape jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape a single URL and wait for the results.
    Quick {
        platform: Platform,
        url: String,
        /// Project to file the job under (defaults to SCRAPY_PROJECT_ID).
        #[arg(long)]
        project_id: Option<i64>,
        #[arg(long)]
        posts: Option<u32>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        max_duration_secs: Option<u64>,
        /// Print the outcome as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
    /// Summarize a project's jobs.
    Stats {
        #[arg(long)]
        project_id: Option<i64>,
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// Cancel a job.
    Cancel { job_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("scrape_jobs=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = ScrapeConfig::from_env()?;
    config.log_redacted();

    let client = Arc::new(ScrapyClient::with_timeout(
        &config.api_url,
        config.api_token.as_deref(),
        config.http_timeout,
    ));

    match cli.command {
        Command::Quick {
            platform,
            url,
            project_id,
            posts,
            start_date,
            end_date,
            interval_ms,
            max_duration_secs,
            json,
        } => {
            let project_id = project_id
                .or(config.project_id)
                .context("--project-id or SCRAPY_PROJECT_ID is required")?;

            let mut quick = QuickScrape::new(platform, url).between(start_date, end_date);
            if let Some(n) = posts {
                quick = quick.posts(n);
            }
            let request = quick.into_request(project_id);

            let mut poll = config.poll_config();
            if let Some(ms) = interval_ms {
                poll = poll.with_interval(Duration::from_millis(ms));
            }
            if let Some(secs) = max_duration_secs {
                poll = poll.with_max_duration(Duration::from_secs(secs));
            }

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling job");
                    on_ctrl_c.cancel();
                }
            });

            let progress = FnSink(|s: &JobSnapshot| {
                info!(
                    job_id = s.job_id(),
                    status = %s.status(),
                    percent = s.progress_percentage(),
                    processed = s.job.processed_urls,
                    total = s.job.total_urls,
                    "Progress"
                );
            });

            let lifecycle = JobLifecycle::new(client);
            let outcome = lifecycle
                .run_job_with(&request, poll, &progress, cancel)
                .await?;

            if json {
                let out = serde_json::json!({
                    "snapshot": outcome.snapshot,
                    "results": outcome.results,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Job {}: {}", outcome.job_id(), outcome.status());
                if let Some(log) = outcome.snapshot.job.error_log.as_deref() {
                    println!("  error: {log}");
                }
                for result in outcome.results.iter().flatten() {
                    if result.success {
                        println!("  ok     {}", result.source_url);
                    } else {
                        println!(
                            "  FAILED {}: {}",
                            result.source_url,
                            result.error_message.as_deref().unwrap_or("no error message")
                        );
                    }
                }
            }

            if !outcome.succeeded() {
                bail!("job {} ended {}", outcome.job_id(), outcome.status());
            }
        }
        Command::Stats {
            project_id,
            platform,
        } => {
            let project_id = project_id
                .or(config.project_id)
                .context("--project-id or SCRAPY_PROJECT_ID is required")?;

            let jobs = client.list_jobs(project_id, platform).await?;
            println!("{}", JobStats::from_jobs(&jobs));
            for share in stats::platform_distribution(&jobs) {
                println!("  {:<10} {:>4} ({}%)", share.label, share.count, share.percent);
            }
            if let Some(job) = stats::most_recent_with_data(&jobs) {
                println!("Most recent job with data: {} ({})", job.id, job.name);
            }
        }
        Command::Cancel { job_id } => {
            JobLifecycle::new(client).cancel(job_id).await?;
            println!("Job {job_id} cancelled");
        }
    }

    Ok(())
}
