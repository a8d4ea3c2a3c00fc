//! Twitter Media Backup - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use twitter_media_backup::{
    api::{OAuth1Credentials, TwitterApi},
    cli::Args,
    config::{validate_config, Config},
    download::{CursorStore, HttpDownloader, Poller, PollerSettings},
    error::{exit_codes, Phase, PhaseExt, Result},
    export::{Destinations, Exporter, GooglePhotosExporter, GooglePhotosSettings, LocalExporter},
    output::{
        print_banner, print_config_summary, print_error, print_info, print_relay_stats,
        print_success, print_warning,
    },
    relay::{self, RelayStats},
};

/// How a run ended without error.
enum Outcome {
    Completed,
    Aborted,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(Outcome::Completed) => ExitCode::from(exit_codes::SUCCESS as u8),
        Ok(Outcome::Aborted) => ExitCode::from(exit_codes::ABORT as u8),
        Err(e) => {
            print_error(&format!("{} failed: {}", e.phase(), e));
            ExitCode::from(e.phase().exit_code() as u8)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn run() -> Result<Outcome> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.clone();
    let config_found = config_path.exists();
    let mut config = if config_found {
        Config::load(&config_path).during(Phase::Config)?
    } else {
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Set up logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();
    if !config_found {
        print_warning(&format!(
            "Configuration file not found: {}",
            config_path.display()
        ));
        print_info("Using default configuration with CLI arguments");
    }

    // Validate configuration
    validate_config(&config)?;
    print_config_summary(&config);

    // Initialize API client
    let api = Arc::new(TwitterApi::new(OAuth1Credentials::from(&config.twitter))?);
    let downloader = Arc::new(
        HttpDownloader::new(api.http_client()).with_progress(config.poller.show_progress),
    );

    // Destinations are registered local first, then cloud.
    let destinations = tokio::select! {
        destinations = build_destinations(&config) => destinations?,
        _ = shutdown_signal() => {
            print_warning("Interrupted before polling started");
            return Ok(Outcome::Aborted);
        }
    };
    print_info(&format!(
        "Exporting to: {}",
        destinations.kinds().join(", ")
    ));

    let settings = PollerSettings {
        interval: config.poll_interval(),
        seed: config.poller.since_id.into(),
        screen_name: config.twitter.screen_name.clone(),
        cursor_store: config.poller.cursor_file.clone().map(CursorStore::new),
    };
    let poller = Poller::new(api, downloader, settings).await?;
    print_info(&format!(
        "Watching @{} for tweets newer than {}",
        poller.screen_name(),
        poller.cursor()
    ));

    let stream = poller.start();
    let mut stats = RelayStats::new(stream.cursor());
    let result = relay::run(stream, &destinations, &mut stats, shutdown_signal()).await;

    print_relay_stats(&stats);
    result?;

    print_success("Stopped cleanly");
    Ok(Outcome::Completed)
}

async fn build_destinations(config: &Config) -> Result<Destinations> {
    let mut exporters: Vec<Box<dyn Exporter>> = Vec::new();

    if config.local.enabled {
        let local = LocalExporter::new(&config.local.root_path).during(Phase::Export)?;
        exporters.push(Box::new(local));
    }

    if config.gphotos.enabled {
        print_info("Connecting to Google Photos...");
        let settings = GooglePhotosSettings::from_config(config)?;
        exporters.push(Box::new(GooglePhotosExporter::connect(settings).await?));
    }

    Destinations::new(exporters)
}
