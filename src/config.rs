//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides.
//! The file path defaults to `config.yaml` but can be specified via `-f` flag or
//! the `PRECON_CONFIG` environment variable. Variables prefixed with `PRECON_`
//! override YAML values; nested fields use double underscores, e.g.
//! `PRECON_RETRY__MAX_ATTEMPTS=5` sets `retry.max_attempts`.

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ReportError, Result};

/// CLI arguments for the report generator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PRECON_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Username for the report gate
    #[arg(long, env = "PRECON_USERNAME")]
    pub username: String,

    /// Password for the report gate
    #[arg(long, env = "PRECON_PASSWORD")]
    pub password: String,

    /// Image files to assess, in report order
    #[arg(required = true)]
    pub images: Vec<PathBuf>,
}

/// Main application configuration.
///
/// Unknown top-level keys are tolerated because the CLI's own `PRECON_USERNAME`,
/// `PRECON_PASSWORD` and `PRECON_CONFIG` variables share the env prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Upstream model API settings
    pub api: ApiConfig,
    /// Per-token pricing used for cost estimation
    pub pricing: PricingConfig,
    /// Backoff schedule for rate-limited calls
    pub retry: RetryConfig,
    /// Report layout and artifact output settings
    pub report: ReportConfig,
    /// Credentials for the report gate
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            pricing: PricingConfig::default(),
            retry: RetryConfig::default(),
            report: ReportConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Upstream chat-completions endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the OpenAI-compatible endpoint (e.g., "https://api.openai.com")
    pub endpoint: String,
    /// API key sent as a bearer token. Required.
    pub api_key: Option<String>,
    /// Vision-capable model to submit images to
    pub model: String,
    /// Cap on generated caption length, in tokens
    pub max_output_tokens: u32,
    /// Timeout for each individual request attempt
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            max_output_tokens: 200,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Per-1K-token rates, in currency units. Stored as decimals to preserve precision,
/// the same way tariffs are modelled elsewhere in the stack.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    /// Price per 1000 input tokens
    pub input_per_1k: Decimal,
    /// Price per 1000 output tokens
    pub output_per_1k: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            // 0.005 in / 0.015 out per 1K tokens
            input_per_1k: Decimal::new(5, 3),
            output_per_1k: Decimal::new(15, 3),
        }
    }
}

/// Backoff schedule applied to rate-limited assessment calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first) before giving up
    pub max_attempts: u32,
    /// Delay before the first retry; doubled (by `backoff_multiplier`) on each subsequent retry
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Factor by which the delay grows after each rate-limited attempt
    pub backoff_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
            backoff_multiplier: 2,
        }
    }
}

/// Layout constants and artifact output settings for the rendered document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Directory the finished artifact is written into
    pub output_dir: PathBuf,
    /// Path to the logo image repeated in the header of every page
    pub logo_path: PathBuf,
    /// Entries per page; a hard page break is inserted after each full page
    pub entries_per_page: usize,
    /// Rendered photo width, in millimetres
    pub image_width_mm: u32,
    /// Rendered photo height, in millimetres
    pub image_height_mm: u32,
    /// Header logo edge length, in millimetres
    pub logo_size_mm: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            logo_path: PathBuf::from("assets/logo.png"),
            entries_per_page: 2,
            // Photos render at 15cm x 7.5cm, logo at 2cm x 2cm
            image_width_mm: 150,
            image_height_mm: 75,
            logo_size_mm: 20,
        }
    }
}

/// Credentials for the report gate.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Load configuration from the YAML file and `PRECON_` environment overrides.
    pub fn load(args: &Args) -> Result<Self> {
        let config: Self = Self::figment(args)
            .extract()
            .map_err(|e| ReportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("PRECON_").split("__"))
    }

    /// Validate the configuration for consistency and required fields.
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ReportError::Config(
                "api.api_key is not set. Set it in the config file or via PRECON_API__API_KEY."
                    .to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ReportError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.backoff_multiplier == 0 {
            return Err(ReportError::Config(
                "retry.backoff_multiplier must be at least 1".to_string(),
            ));
        }
        if self.report.entries_per_page == 0 {
            return Err(ReportError::Config(
                "report.entries_per_page must be at least 1".to_string(),
            ));
        }
        if self.auth.username.is_none() || self.auth.password.is_none() {
            return Err(ReportError::Config(
                "auth.username and auth.password must be configured".to_string(),
            ));
        }
        Ok(())
    }
}
