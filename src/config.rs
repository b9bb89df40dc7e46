//! Run configuration
//!
//! [`ArchiveConfig`] is assembled once at process start, from command line
//! arguments that fall back to environment variables (and a `.env` file
//! loaded by the binary), then handed to each component's constructor.

use crate::fetcher::Credentials;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Default archive root
pub const DEFAULT_ARCHIVE_PATH: &str = "./Instagram_Archive";

/// Default private API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://i.instagram.com/api/v1";

/// Configuration for one archiver process
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Account username
    pub username: String,
    /// Account password
    pub password: String,
    /// Application id sent with every API request
    pub app_id: String,
    /// Key used to sign the login payload
    pub app_secret: String,
    /// Root directory for media and metadata
    pub archive_base_path: PathBuf,
    /// Download media files; metadata is written either way
    pub store_locally: bool,
    /// Hours between runs in watch mode
    pub automation_interval_hours: u64,
    /// Transport-level retries per remote call
    pub max_retries: u32,
    /// Overall timeout for one HTTP request
    pub request_timeout: Duration,
    /// Request budget per rolling hour
    pub max_requests_per_hour: u32,
    /// Minimum gap between consecutive paced requests
    pub delay_between_requests: Duration,
    /// Private API base URL
    pub api_base_url: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            app_id: String::new(),
            app_secret: String::new(),
            archive_base_path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
            store_locally: true,
            automation_interval_hours: 24,
            max_retries: 3,
            request_timeout: Duration::from_secs(30),
            max_requests_per_hour: 200,
            delay_between_requests: Duration::from_secs(2),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl ArchiveConfig {
    /// Validate non-credential settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests_per_hour == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_requests_per_hour",
                reason: "must be positive".to_string(),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout",
                reason: "must be positive".to_string(),
            });
        }

        if self.automation_interval_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "automation_interval_hours",
                reason: "must be positive".to_string(),
            });
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: format!("expected an http(s) URL, got {:?}", self.api_base_url),
            });
        }

        Ok(())
    }

    /// Validate the settings needed to log in
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingValue("INSTAGRAM_USERNAME"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingValue("INSTAGRAM_PASSWORD"));
        }
        Ok(())
    }

    /// Login credentials
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Interval between runs in watch mode
    pub fn automation_interval(&self) -> Duration {
        Duration::from_secs(self.automation_interval_hours.saturating_mul(3600))
    }
}

/// Configuration arguments, each backed by an environment variable
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Account username
    #[arg(long, global = true, env = "INSTAGRAM_USERNAME", default_value = "")]
    pub username: String,

    /// Account password
    #[arg(long, global = true, env = "INSTAGRAM_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Application id
    #[arg(long, global = true, env = "INSTAGRAM_APP_ID", default_value = "")]
    pub app_id: String,

    /// Application secret used to sign the login payload
    #[arg(long, global = true, env = "INSTAGRAM_APP_SECRET", default_value = "", hide_env_values = true)]
    pub app_secret: String,

    /// Root directory for media and metadata
    #[arg(long, global = true, env = "ARCHIVE_BASE_PATH", default_value = DEFAULT_ARCHIVE_PATH)]
    pub archive_base_path: PathBuf,

    /// Download media files (true/false)
    #[arg(
        long,
        global = true,
        env = "STORE_LOCALLY",
        default_value = "true",
        value_parser = clap::builder::BoolishValueParser::new(),
        action = clap::ArgAction::Set
    )]
    pub store_locally: bool,

    /// Hours between runs in watch mode
    #[arg(long, global = true, env = "AUTOMATION_INTERVAL_HOURS", default_value_t = 24)]
    pub automation_interval_hours: u64,

    /// Retries per remote call
    #[arg(long, global = true, env = "MAX_RETRIES", default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_retries: u32,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Request budget per rolling hour
    #[arg(long, global = true, env = "MAX_REQUESTS_PER_HOUR", default_value_t = 200)]
    pub max_requests_per_hour: u32,

    /// Minimum seconds between paced requests (fractional allowed)
    #[arg(long, global = true, env = "DELAY_BETWEEN_REQUESTS", default_value_t = 2.0)]
    pub delay_between_requests: f64,

    /// Private API base URL
    #[arg(long, global = true, env = "API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,
}

impl ConfigArgs {
    /// Build and validate the run configuration
    pub fn into_config(self) -> Result<ArchiveConfig, ConfigError> {
        let delay_between_requests = Duration::try_from_secs_f64(self.delay_between_requests)
            .map_err(|e| ConfigError::InvalidValue {
                field: "delay_between_requests",
                reason: e.to_string(),
            })?;

        let config = ArchiveConfig {
            username: self.username,
            password: self.password,
            app_id: self.app_id,
            app_secret: self.app_secret,
            archive_base_path: self.archive_base_path,
            store_locally: self.store_locally,
            automation_interval_hours: self.automation_interval_hours,
            max_retries: self.max_retries,
            request_timeout: Duration::from_secs(self.request_timeout),
            max_requests_per_hour: self.max_requests_per_hour,
            delay_between_requests,
            api_base_url: self.api_base_url.trim_end_matches('/').to_string(),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required setting not provided
    #[error("missing required setting {0}")]
    MissingValue(&'static str),

    /// Setting present but unusable
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Setting name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
