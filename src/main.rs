use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use traffic_lens::api::{self, AnalyzerFactory, Sessions};
use traffic_lens::backend::{Backend, HttpBackend};
use traffic_lens::config::{BackendVariant, Config};
use traffic_lens::pipeline::{Analyzer, IgnoreReason, SubmitOutcome};
use traffic_lens::report;

/// Most domains accepted by one `batch` run
const MAX_BATCH_DOMAINS: usize = 10;

#[derive(Parser)]
#[command(name = "traffic-lens")]
#[command(about = "Web traffic analyzer backed by an analytics proxy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the analyzer page
    Serve,
    /// Analyze a single domain and print the metrics
    Analyze {
        /// Domain to analyze (e.g. example.com)
        domain: String,
    },
    /// Analyze up to 10 domains one after another
    Batch {
        /// Domains to analyze
        #[arg(required = true)]
        domains: Vec<String>,
    },
    /// Show the analytics backend's health report
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config.backend.base_url)?);
    match config.backend.variant {
        BackendVariant::Analyze => info!("Using analyze endpoint at {}", config.backend.base_url),
        BackendVariant::Plausible => info!(
            "Using plausible proxy at {} (origin: {})",
            config.backend.base_url, config.backend.page_origin
        ),
    }

    match cli.command {
        Commands::Serve => serve(config, backend).await,
        Commands::Analyze { domain } => {
            let analyzer = analyzer_with_probe(&config, backend).await;
            if !print_outcome(&domain, analyzer.submit(&domain).await) {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Batch { domains } => {
            if domains.len() > MAX_BATCH_DOMAINS {
                bail!("batch accepts 1-{MAX_BATCH_DOMAINS} domains, got {}", domains.len());
            }

            let analyzer = analyzer_with_probe(&config, backend).await;
            let mut failures = 0;
            for domain in &domains {
                if !print_outcome(domain, analyzer.submit(domain).await) {
                    failures += 1;
                }
            }

            if failures > 0 {
                warn!("{} of {} domains could not be analyzed", failures, domains.len());
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Health => {
            let health = backend
                .health()
                .await
                .context("failed to fetch backend health")?;
            print!("{}", report::render_health(&health));
            Ok(())
        }
    }
}

async fn analyzer_with_probe(config: &Config, backend: Arc<dyn Backend>) -> Analyzer {
    let analyzer = Analyzer::from_config(config, backend);
    if config.readiness.gate {
        analyzer.probe_readiness().await;
    }
    analyzer
}

/// Print one outcome; returns false when the domain was not analyzed.
fn print_outcome(domain: &str, outcome: SubmitOutcome) -> bool {
    match outcome {
        SubmitOutcome::Succeeded(view) => {
            println!("{}", report::render_view(&view));
            true
        }
        SubmitOutcome::Failed(message) => {
            eprintln!("✗ {domain}: {message}");
            false
        }
        SubmitOutcome::Ignored(IgnoreReason::EmptyDomain) => {
            eprintln!("✗ empty domain, nothing to analyze");
            false
        }
        SubmitOutcome::Ignored(IgnoreReason::NotReady) => {
            eprintln!("✗ {domain}: the analytics backend has no upstream API key configured");
            false
        }
        SubmitOutcome::Ignored(IgnoreReason::InFlight) => {
            eprintln!("✗ {domain}: another analysis is still running");
            false
        }
    }
}

async fn serve(config: Config, backend: Arc<dyn Backend>) -> Result<()> {
    if !config.readiness.gate {
        info!("Readiness gate disabled, analyze action is always available");
    }

    let factory: AnalyzerFactory = {
        let config = config.clone();
        Arc::new(move || Analyzer::from_config(&config, Arc::clone(&backend)))
    };
    let sessions = Arc::new(Sessions::new(factory, &config.session));
    info!(
        "Keeping up to {} page sessions, {}s idle timeout",
        config.session.max_sessions, config.session.idle_timeout_secs
    );

    if let Some(ref static_dir) = config.frontend.static_dir {
        info!("🎨 Serving assets from directory: {}", static_dir);
    } else {
        info!("🎨 Serving embedded assets");
    }

    let router = api::create_router(sessions, config.frontend.clone());

    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Analyzer listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
