use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sentimind::config::{load_config, resolve_config_path, EXAMPLE_CONFIG};
use sentimind::llm::LlmProvider;
use sentimind::sample::SAMPLE_REVIEWS;
use sentimind::{run_report, Sentimind};
use tracing::{debug, info};

/// Sentimind - customer review sentiment dashboard, rendered to files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File with raw reviews to analyze (default: built-in sample reviews)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for generated files (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Path to config file (overrides SENTIMIND_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<String>,

    /// Follow-up question for the data assistant; may be repeated
    #[arg(short, long)]
    ask: Vec<String>,

    /// Keyword map width override
    #[arg(long)]
    width: Option<f64>,

    /// Keyword map height override
    #[arg(long)]
    height: Option<f64>,

    /// Minimum gap between keyword bubbles
    #[arg(long)]
    padding: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting sentimind");

    let args = Args::parse();

    let cfg_path = resolve_config_path(args.config.as_deref())?;
    debug!("Using config file: {}", cfg_path.display());

    // Friendlier error if missing
    if !cfg_path.exists() {
        return Err(anyhow::anyhow!(
            "sentimind config not found at {}\n\
             Use --config to specify a config file, or set SENTIMIND_CONFIG environment variable.\n\
             Example config.yaml:\n{}",
            cfg_path.display(),
            EXAMPLE_CONFIG
        ));
    }
    let mut cfg = load_config(&cfg_path)?;

    if let Some(width) = args.width {
        cfg.canvas.width = width;
    }
    if let Some(height) = args.height {
        cfg.canvas.height = height;
    }
    if let Some(padding) = args.padding {
        cfg.canvas.padding = padding;
    }
    debug!(
        "Canvas - width={}, height={}, padding={}",
        cfg.canvas.width, cfg.canvas.height, cfg.canvas.padding
    );

    let reviews = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read reviews from {}", path.display()))?,
        None => {
            info!("No --input given, analyzing the built-in sample reviews");
            SAMPLE_REVIEWS.to_string()
        }
    };

    let provider = LlmProvider::new(&cfg.provider)?;
    info!(
        "Provider ready - model={}, api_base={}",
        cfg.provider.model, cfg.provider.api_base
    );
    let app = Sentimind::new(Arc::new(provider), cfg.canvas);

    let run_dir = run_report(&app, &reviews, &args.output_dir, &args.ask).await?;
    println!("{}", run_dir.display());
    Ok(())
}
