use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytfetch::cli::Cli;
use ytfetch::config::Config;
use ytfetch::fetcher::YtDlpFetcher;
use ytfetch::pipeline::DownloadPipeline;
use ytfetch::{output, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "ytfetch=debug"
    } else {
        "ytfetch=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().await?;

    // Check for required external dependencies (non-fatal in Docker)
    let missing_deps = utils::check_dependencies(&config.downloader.yt_dlp_path).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| config.app.output_dir.clone());
    let skip_existing = config.app.skip_existing && !cli.force;

    tracing::info!("Starting fetch for URL: {}", cli.url);

    let fetcher = YtDlpFetcher::new(&config.downloader);
    let pipeline = DownloadPipeline::new(config, Box::new(fetcher), !cli.quiet);
    let report = pipeline.run(&cli.url, &output_dir, skip_existing).await;

    if report.error.is_none() {
        output::print_summary(&report);
    }

    Ok(())
}
