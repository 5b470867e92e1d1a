//! Crosspost: scheduled multi-platform post publisher.
//!
//! Subcommands:
//! - `daemon`: run the scheduler worker and reconciliation sweep
//! - `preview-split`: show how content splits per platform

use chrono::Duration;
use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crosspost::daemon::{self, DaemonConfig};
use crosspost_model::Platform;
use crosspost_scheduler::SweepConfig;
use crosspost_splitter::{measure, split};

#[derive(Parser)]
#[command(name = "crosspost")]
#[command(about = "Scheduled multi-platform post publisher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler daemon (worker loop + reconciliation sweep)
    Daemon {
        /// Seconds between sweep ticks (expiry check cadence)
        #[arg(long, env = "CROSSPOST_SWEEP_TICK_SECS", default_value = "60")]
        sweep_tick_secs: u64,

        /// Seconds between retention passes (failed jobs, old history)
        #[arg(long, env = "CROSSPOST_RETENTION_INTERVAL_SECS", default_value = "3600")]
        retention_interval_secs: u64,

        /// Minutes a scheduled post may overshoot before being force-failed
        #[arg(long, env = "CROSSPOST_EXPIRY_GRACE_MINUTES", default_value = "30")]
        expiry_grace_minutes: i64,

        /// Hours failed jobs are retained in the queue's failed set
        #[arg(long, env = "CROSSPOST_FAILED_JOB_RETENTION_HOURS", default_value = "24")]
        failed_job_retention_hours: i64,

        /// Days published posts are retained
        #[arg(long, env = "CROSSPOST_POST_RETENTION_DAYS", default_value = "90")]
        post_retention_days: i64,

        /// Days publish-log rows are retained
        #[arg(long, env = "CROSSPOST_LOG_RETENTION_DAYS", default_value = "30")]
        log_retention_days: i64,
    },

    /// Show how content splits for each platform
    PreviewSplit {
        /// The text to split
        text: String,

        /// Platforms to preview (defaults to all)
        #[arg(long, value_delimiter = ',')]
        platforms: Vec<Platform>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "crosspost=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon {
            sweep_tick_secs,
            retention_interval_secs,
            expiry_grace_minutes,
            failed_job_retention_hours,
            post_retention_days,
            log_retention_days,
        } => {
            let config = DaemonConfig {
                sweep_tick: std::time::Duration::from_secs(sweep_tick_secs),
                sweep: SweepConfig {
                    expiry_grace: Duration::minutes(expiry_grace_minutes),
                    failed_job_retention: Duration::hours(failed_job_retention_hours),
                    published_post_retention: Duration::days(post_retention_days),
                    publish_log_retention: Duration::days(log_retention_days),
                    retention_interval: std::time::Duration::from_secs(retention_interval_secs),
                },
            };
            daemon::run(config).await
        }

        Commands::PreviewSplit { text, platforms } => {
            let platforms = if platforms.is_empty() {
                Platform::ALL.to_vec()
            } else {
                platforms
            };

            for platform in platforms {
                let result = split(&text, platform);
                println!(
                    "{} (limit {}, measured {}):",
                    platform,
                    platform.max_post_len(),
                    measure(&text, platform)
                );
                if !result.needs_splitting {
                    println!("  fits in one post");
                    continue;
                }
                for (i, chunk) in result.chunks.iter().enumerate() {
                    println!(
                        "  [{}] ({} units) {}",
                        i + 1,
                        measure(chunk, platform),
                        chunk
                    );
                }
            }
            Ok(())
        }
    }
}
