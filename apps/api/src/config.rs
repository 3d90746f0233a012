use anyhow::{Context, Result};

/// Origins always accepted by the soft origin check: the local front-end dev
/// servers and the production front-end. Others come from `DEPLOYMENT_URL` and
/// `ALLOWED_ORIGINS`.
const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "https://adhoc-cv-improver.vercel.app",
];

/// Application configuration loaded from environment variables.
/// Every integration is optional; the server starts with only defaults and
/// reports a configuration error per request if the Gemini key is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_timeout_secs: u64,
    /// Public host name of the deployment, without scheme (e.g. `cv.example.com`).
    pub deployment_url: Option<String>,
    /// Extra origins from `ALLOWED_ORIGINS` (comma separated).
    pub extra_origins: Vec<String>,
    pub redis_url: Option<String>,
    pub database_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    pub aws_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    /// Endpoint used by the `analyze` subcommand to call through a running server.
    pub backend_url: Option<String>,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_timeout_secs: 120,
            deployment_url: None,
            extra_origins: Vec::new(),
            redis_url: None,
            database_url: None,
            s3_bucket: None,
            s3_endpoint: None,
            aws_region: "us-east-1".to_string(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            backend_url: None,
            rate_limit_max_requests: 5,
            rate_limit_window_secs: 60,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_timeout_secs: parsed_env("GEMINI_TIMEOUT_SECS", defaults.gemini_timeout_secs)?,
            deployment_url: optional_env("DEPLOYMENT_URL"),
            extra_origins: optional_env("ALLOWED_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            redis_url: optional_env("REDIS_URL"),
            database_url: optional_env("DATABASE_URL"),
            s3_bucket: optional_env("S3_BUCKET"),
            s3_endpoint: optional_env("S3_ENDPOINT"),
            aws_region: optional_env("AWS_REGION").unwrap_or(defaults.aws_region),
            aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
            backend_url: optional_env("ANALYZER_BACKEND_URL"),
            rate_limit_max_requests: parsed_env(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            )?,
            rate_limit_window_secs: parsed_env(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )?,
            port: parsed_env("PORT", defaults.port)?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }

    /// Origins accepted by the soft origin check on the analysis endpoint.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect();
        if let Some(host) = &self.deployment_url {
            origins.push(format!("https://{}", host.trim_end_matches('/')));
        }
        origins.extend(self.extra_origins.iter().cloned());
        origins
    }

    /// `(database_url, bucket)` when the submission log is enabled; it needs both.
    pub fn persistence_targets(&self) -> Option<(&str, &str)> {
        match (&self.database_url, &self.s3_bucket) {
            (Some(db), Some(bucket)) => Some((db.as_str(), bucket.as_str())),
            _ => None,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
