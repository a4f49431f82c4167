//! meta-publish: one-shot Facebook Page / Instagram publisher
//!
//! Usage:
//!   meta-publish                  - Publish using environment / meta-publish.toml
//!   meta-publish --config <path>  - Publish using the given TOML file
//!   meta-publish --help           - Show help

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use mp_core::PublishConfig;
use mp_publish::{Outcome, PublishWorkflow};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Publish once, optionally from an explicit config file
    Publish(Option<PathBuf>),
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let mode = match parse_args(std::env::args().skip(1)) {
        Ok(mode) => mode,
        Err(message) => {
            eprintln!("meta-publish: {}", message);
            eprintln!("Run `meta-publish --help` for usage.");
            return ExitCode::from(2);
        }
    };

    let config_path = match mode {
        RunMode::Help => {
            print_help();
            return ExitCode::SUCCESS;
        }
        RunMode::Version => {
            println!("meta-publish {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        RunMode::Publish(path) => path,
    };

    init_logging();

    match publish(config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, `info` unless `RUST_LOG` says otherwise
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn publish(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = PublishConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    tracing::info!("Starting meta-publish for page {}", config.page_id);
    tracing::info!(
        "Text post: {}, image: {}, IG override: {}",
        config.text_post,
        config.has_image(),
        config.ig_user_id.is_some()
    );

    let report = PublishWorkflow::from_config(config)?.run().await?;

    match report.outcome {
        Outcome::Completed => tracing::info!("Publish complete"),
        Outcome::SkippedImage => tracing::info!("Publish complete (no image)"),
        Outcome::SkippedInstagram => tracing::info!("Publish complete (no Instagram account)"),
    }

    Ok(())
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> Result<RunMode, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => match args.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => return Err(format!("{} requires a path", arg)),
            },
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    Ok(RunMode::Publish(config_path))
}

/// Print help message
fn print_help() {
    println!("meta-publish - publish a post to a Facebook Page and its Instagram account");
    println!();
    println!("Usage:");
    println!("  meta-publish                   Publish using the environment or ./meta-publish.toml");
    println!("  meta-publish --config <path>   Publish using the given TOML file");
    println!("  meta-publish --help            Show this help message");
    println!("  meta-publish --version         Show version");
    println!();
    println!("Environment Variables:");
    println!("  FB_PAGE_ID           Facebook Page id (required)");
    println!("  META_SYSTEM_TOKEN    System user token (required)");
    println!("  POST_MESSAGE         Post text and caption");
    println!("  IMAGE_URL            Public image URL; empty skips photo and Instagram");
    println!("  IG_USER_ID           Instagram business account id (default: looked up)");
    println!("  FB_TEXT_POST         Publish the text post (default: true)");
    println!("  GRAPH_API_URL        Graph API base URL (default: https://graph.facebook.com)");
    println!("  GRAPH_API_VERSION    Graph API version (default: v25.0)");
    println!("  GRAPH_TIMEOUT_SECS   Request timeout in seconds (default: 30)");
    println!("  RUST_LOG             Log filter (default: info)");
}
