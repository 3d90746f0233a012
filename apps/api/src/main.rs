mod analysis;
mod config;
mod db;
mod encoding;
mod errors;
mod llm_client;
mod models;
mod persistence;
mod rate_limit;
mod routes;
mod session;
mod state;
mod validation;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::orchestrator::Orchestrator;
use crate::analysis::remote::RemoteAnalyzer;
use crate::analysis::Analyzer;
use crate::config::Config;
use crate::db::create_pool;
use crate::encoding::is_pdf_path;
use crate::llm_client::LlmClient;
use crate::persistence::{PostgresS3Sink, SubmissionSink};
use crate::rate_limit::redis_store::RedisRateLimiter;
use crate::rate_limit::{spawn_sweeper, RateLimiter, SlidingWindowLimiter};
use crate::routes::build_router;
use crate::session::{AnalysisSession, Phase, ANALYSIS_FAILED_MESSAGE};
use crate::state::AppState;

const PDF_ONLY_MESSAGE: &str = "Por favor, subí solo archivos PDF para asegurar un buen análisis.";

#[derive(Parser)]
#[command(name = "cv-analyzer", version, about = "AI-assisted CV review service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Analyze local PDFs one after another and print each result as JSON.
    Analyze {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Send the file through a running server instead of calling Gemini directly.
        #[arg(long, env = "ANALYZER_BACKEND_URL")]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Analyze { paths, endpoint } => {
            analyze_files(&config, &paths, endpoint.or(config.backend_url.clone())).await
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting CV Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(
        config.gemini_api_key.clone(),
        Duration::from_secs(config.gemini_timeout_secs),
    )?;
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; analysis requests will fail with a configuration error");
    } else {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    }
    let analyzer: Arc<dyn Analyzer> = Arc::new(Orchestrator::new(Arc::new(llm)));

    let window = Duration::from_secs(config.rate_limit_window_secs);
    let rate_limiter: Arc<dyn RateLimiter> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Rate limiter: Redis sliding window");
            Arc::new(RedisRateLimiter::new(
                client,
                config.rate_limit_max_requests,
                window,
            ))
        }
        None => {
            let limiter = Arc::new(SlidingWindowLimiter::new(
                config.rate_limit_max_requests,
                window,
            ));
            spawn_sweeper(limiter.clone(), limiter.window());
            info!("Rate limiter: in-memory sliding window");
            limiter
        }
    };
    info!(
        "Rate limit: {} requests per {}s per client",
        config.rate_limit_max_requests, config.rate_limit_window_secs
    );

    let sink = build_sink(&config).await?;

    let state = AppState {
        analyzer,
        rate_limiter,
        sink,
        allowed_origins: Arc::new(config.allowed_origins()),
    };

    // Origin checks are advisory only, so CORS stays permissive.
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Client-side flow: each file is read, encoded and analyzed once through the
/// configured binding.
async fn analyze_files(config: &Config, paths: &[PathBuf], endpoint: Option<String>) -> Result<()> {
    let timeout = Duration::from_secs(config.gemini_timeout_secs);
    let analyzer: Box<dyn Analyzer> = match endpoint {
        Some(url) => {
            let remote = RemoteAnalyzer::new(&url, timeout)?;
            info!("Analyzing via {}", remote.endpoint());
            Box::new(remote)
        }
        None => {
            let llm = LlmClient::new(config.gemini_api_key.clone(), timeout)?;
            info!("Analyzing with {}", llm_client::MODEL);
            Box::new(Orchestrator::new(Arc::new(llm)))
        }
    };

    let failed = analyze_batch(paths, analyzer.as_ref()).await?;
    if failed > 0 {
        bail!("{failed} of {} file(s) could not be analyzed", paths.len());
    }
    Ok(())
}

/// Analyzes each path in turn through one session, printing results to stdout
/// and failures to stderr. Returns how many files failed.
async fn analyze_batch(paths: &[PathBuf], analyzer: &dyn Analyzer) -> Result<usize> {
    let mut session = AnalysisSession::new();
    let mut failed = 0usize;

    for path in paths {
        if !session.accepts_selection() {
            session.reset();
        }

        if !is_pdf_path(path) {
            eprintln!("{}: {PDF_ONLY_MESSAGE}", path.display());
            failed += 1;
            continue;
        }

        match session.submit(path, analyzer).await? {
            Phase::Success => {
                if let Some(result) = session.result() {
                    println!("{}", serde_json::to_string_pretty(result)?);
                }
            }
            _ => {
                let message = session.error().unwrap_or(ANALYSIS_FAILED_MESSAGE);
                eprintln!("{}: {message}", path.display());
                failed += 1;
            }
        }
    }

    Ok(failed)
}

async fn build_sink(config: &Config) -> Result<Option<Arc<dyn SubmissionSink>>> {
    let Some((database_url, bucket)) = config.persistence_targets() else {
        info!("Submission log disabled (DATABASE_URL and S3_BUCKET not both set)");
        return Ok(None);
    };

    let pool = create_pool(database_url).await?;
    let s3 = build_s3_client(config).await;
    info!("Submission log enabled (bucket: {bucket})");

    Ok(Some(Arc::new(PostgresS3Sink::new(pool, s3, bucket.to_string()))))
}

/// Constructs an S3 client for MinIO (custom endpoint) or AWS.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()));

    if let (Some(key_id), Some(secret)) = (&config.aws_access_key_id, &config.aws_secret_access_key) {
        loader = loader.credentials_provider(Credentials::new(
            key_id,
            secret,
            None,
            None,
            "cv-analyzer-static",
        ));
    }
    if let Some(endpoint) = &config.s3_endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    let s3_config = loader.load().await;
    aws_sdk_s3::Client::new(&s3_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::analysis::testing::{sample_response, write_sample_pdf, FakeModel};

    #[tokio::test]
    async fn test_batch_continues_past_unreadable_file() {
        let model = Arc::new(FakeModel::replying(sample_response()));
        let analyzer = Orchestrator::new(model.clone());
        let paths = vec![PathBuf::from("/nonexistent/cv.pdf"), write_sample_pdf().await];

        let failed = analyze_batch(&paths, &analyzer).await.unwrap();

        assert_eq!(failed, 1);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_refuses_non_pdf_without_model_call() {
        let model = Arc::new(FakeModel::replying(sample_response()));
        let analyzer = Orchestrator::new(model.clone());
        let paths = vec![PathBuf::from("notes.txt"), write_sample_pdf().await];

        let failed = analyze_batch(&paths, &analyzer).await.unwrap();

        assert_eq!(failed, 1);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_counts_analysis_failures() {
        let model = Arc::new(FakeModel::failing(503));
        let analyzer = Orchestrator::new(model.clone());
        let paths = vec![write_sample_pdf().await, write_sample_pdf().await];

        let failed = analyze_batch(&paths, &analyzer).await.unwrap();

        assert_eq!(failed, 2);
        assert_eq!(model.calls(), 2);
    }
}
