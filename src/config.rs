use crate::error::{Result, TlqError};
use std::time::Duration;

pub const ENV_HOST: &str = "TLQ_HOST";
pub const ENV_PORT: &str = "TLQ_PORT";
pub const ENV_TIMEOUT: &str = "TLQ_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "TLQ_MAX_RETRIES";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 1337;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Resolved client settings.
///
/// `retry_delay` is the backoff unit: attempt `n` waits `retry_delay * 2^n`
/// before the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Config {
    /// Resolves a configuration from `TLQ_*` environment variables and defaults.
    pub fn from_env() -> Result<Self> {
        ConfigBuilder::new().build()
    }

    /// `http://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// The per-attempt timeout in milliseconds, saturating at `u64::MAX`.
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Checks that the host is non-empty, the port is non-zero and the
    /// timeout is positive.
    ///
    /// # Errors
    ///
    /// [`TlqError::Validation`] naming the first field out of range.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(TlqError::Validation("Host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(TlqError::Validation(
                "Port must be between 1 and 65535".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(TlqError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Builder for [`Config`].
///
/// Each of host, port, timeout and max retries resolves independently:
/// a value set on the builder wins, then the matching `TLQ_*` environment
/// variable, then the default.
///
/// ```
/// use tlq_client::ConfigBuilder;
/// use std::time::Duration;
///
/// let config = ConfigBuilder::new()
///     .host("queue.example.com")
///     .port(8080)
///     .timeout(Duration::from_secs(5))
///     .build_with(|_| None)
///     .unwrap();
///
/// assert_eq!(config.base_url(), "http://queue.example.com:8080");
/// assert_eq!(config.max_retries, 3);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_delay: Duration,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            host: None,
            port: None,
            timeout: None,
            max_retries: None,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Some(Duration::from_millis(ms));
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.retry_delay = Duration::from_millis(ms);
        self
    }

    /// Resolves against the process environment.
    ///
    /// # Errors
    ///
    /// [`TlqError::Validation`] if an environment value does not parse, or if
    /// the resolved host is empty, the port is 0 or the timeout is not positive.
    pub fn build(self) -> Result<Config> {
        self.build_with(|key| std::env::var(key).ok())
    }

    /// Resolves against `lookup` instead of the process environment.
    pub fn build_with<F>(self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match self.host {
            Some(host) => host,
            None => lookup(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
        };

        let port = match self.port {
            Some(port) => port,
            None => parse_env(&lookup, ENV_PORT)?.unwrap_or(DEFAULT_PORT),
        };

        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => match parse_env::<f64, _>(&lookup, ENV_TIMEOUT)? {
                Some(secs) => Duration::try_from_secs_f64(secs).map_err(|_| {
                    TlqError::Validation(format!("Invalid value for {}: {}", ENV_TIMEOUT, secs))
                })?,
                None => DEFAULT_TIMEOUT,
            },
        };

        let max_retries = match self.max_retries {
            Some(retries) => retries,
            None => parse_env(&lookup, ENV_MAX_RETRIES)?.unwrap_or(DEFAULT_MAX_RETRIES),
        };

        let config = Config {
            host,
            port,
            timeout,
            max_retries,
            retry_delay: self.retry_delay,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TlqError::Validation(format!("Invalid value for {}: {}", key, raw))),
        None => Ok(None),
    }
}
