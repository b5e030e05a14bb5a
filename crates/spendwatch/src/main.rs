use tokio::runtime::Runtime;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spendwatch::billing::source_from_billing;
use spendwatch::cli::{Cli, Commands};
use spendwatch::config::{Config, WEBHOOK_ENV};
use spendwatch::orchestrator::Job;
use spendwatch::sink::SlackNotifier;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Logs go to stderr; stdout carries the invocation result.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rt = Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Run { date, dry_run } => {
                let settings = Config::load(cli.config.clone())?
                    .resolve(std::env::var(WEBHOOK_ENV).ok())?;

                let source = source_from_billing(&settings.billing).await?;
                let notifier = SlackNotifier::new(&settings.webhook_url, settings.timeout)?;
                let job = Job::new(source.as_ref(), &notifier);

                if dry_run {
                    let today = date.unwrap_or_else(|| chrono::Local::now().date_naive());
                    println!("{}", job.preview_for(today).await?);
                    return Ok(());
                }

                let result = match date {
                    Some(today) => job.run_for(today).await?,
                    None => job.run().await?,
                };
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Commands::Version { json } => {
                if json {
                    let info = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "commit": option_env!("GIT_SHA").unwrap_or("unknown"),
                        "build_date": option_env!("BUILD_DATE").unwrap_or("unknown"),
                    });
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    println!(
                        "spendwatch {} (commit: {}, built: {})",
                        env!("CARGO_PKG_VERSION"),
                        option_env!("GIT_SHA").unwrap_or("unknown"),
                        option_env!("BUILD_DATE").unwrap_or("unknown"),
                    );
                }
            }
        }
        Ok(())
    })
}
