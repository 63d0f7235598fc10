use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_URL_CHECK_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PAGE_SIZE: i64 = 25;

/// Controls the statement URL liveness check.
///
/// Built once from the environment and handed to the statement store and the
/// link-check worker, so nothing below `main` reads process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheckPolicy {
    pub enabled: bool,
    /// Applied to each of the HTTPS and HTTP attempts.
    pub timeout: Duration,
}

impl LinkCheckPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for LinkCheckPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(DEFAULT_URL_CHECK_TIMEOUT_SECS),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
    pub allowed_origins: Vec<String>,
    pub page_size: i64,

    // Sessions
    pub session_secret: Option<String>,

    // Statement URL checks
    pub link_check: LinkCheckPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let timeout_secs = std::env::var("URL_CHECK_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_URL_CHECK_TIMEOUT_SECS.to_string())
            .parse()
            .unwrap_or(DEFAULT_URL_CHECK_TIMEOUT_SECS);

        let link_check = if url_checks_disabled(
            std::env::var("NO_VERIFY_STATEMENT_URLS")
                .or_else(|_| std::env::var("no_verify_statement_urls"))
                .ok()
                .as_deref(),
        ) {
            LinkCheckPolicy::disabled()
        } else {
            LinkCheckPolicy::default()
        }
        .with_timeout(Duration::from_secs(timeout_secs));

        let config = Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            web_host: std::env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: std::env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("WEB_PORT must be a number")?,
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
            page_size: std::env::var("PAGE_SIZE")
                .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
                .parse()
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .max(1),
            session_secret: std::env::var("SESSION_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            link_check,
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  DATABASE_URL: {}", preview(&self.database_url));
        tracing::info!(
            "  SESSION_SECRET: {}",
            self.session_secret
                .as_deref()
                .map(preview)
                .unwrap_or_else(|| "<not set>".to_string())
        );
        tracing::info!(
            enabled = self.link_check.enabled,
            timeout_secs = self.link_check.timeout.as_secs(),
            "  statement URL checks"
        );
    }
}

/// First few characters of a secret, for logs.
fn preview(val: &str) -> String {
    let head: String = val.chars().take(5).collect();
    format!("{}...({} chars)", head, val.chars().count())
}

/// Any value other than empty, `0` or `false` turns the checks off.
fn url_checks_disabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") | Some("0") => false,
        Some(v) => !v.eq_ignore_ascii_case("false"),
    }
}
