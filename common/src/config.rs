use std::path::PathBuf;
use std::time::Duration;

/// Errors reading the dashboard configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a number of milliseconds, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

/// Runtime settings of the dashboard, read from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    /// Base URL of the REST backend. `None` runs the simulated plant.
    pub backend_url: Option<String>,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    /// Where webcam captures are written.
    pub capture_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            http_timeout: Self::DEFAULT_HTTP_TIMEOUT,
            capture_dir: default_capture_dir(),
        }
    }
}

impl DashboardConfig {
    pub const BACKEND_URL: &'static str = "SCADA_BACKEND_URL";
    pub const POLL_INTERVAL: &'static str = "SCADA_POLL_INTERVAL_MS";
    pub const HTTP_TIMEOUT: &'static str = "SCADA_HTTP_TIMEOUT_MS";
    pub const CAPTURE_DIR: &'static str = "SCADA_CAPTURE_DIR";

    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_millis(3000);

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let backend_url = value(Self::BACKEND_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let poll_interval = match value(Self::POLL_INTERVAL) {
            Some(raw) => parse_millis(Self::POLL_INTERVAL, &raw)?,
            None => Self::DEFAULT_POLL_INTERVAL,
        };

        let http_timeout = match value(Self::HTTP_TIMEOUT) {
            Some(raw) => parse_millis(Self::HTTP_TIMEOUT, &raw)?,
            None => Self::DEFAULT_HTTP_TIMEOUT,
        };

        let capture_dir = value(Self::CAPTURE_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_capture_dir);

        Ok(Self {
            backend_url,
            poll_interval,
            http_timeout,
            capture_dir,
        })
    }
}

fn parse_millis(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: raw.to_string(),
    })?;
    if millis == 0 {
        return Err(ConfigError::Zero { name });
    }
    Ok(Duration::from_millis(millis))
}

fn default_capture_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "scada", "scada-dashboard")
        .map(|dirs| dirs.data_dir().join("captures"))
        .unwrap_or_else(|| PathBuf::from("captures"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| vars.get(name).map(|value| value.to_string())
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend_url, None);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert!(config.capture_dir.ends_with("captures"));
    }

    #[test]
    fn test_default_capture_dir_is_per_user() {
        // Independent of the http feature.
        let expected = directories::ProjectDirs::from("org", "scada", "scada-dashboard")
            .map(|dirs| dirs.data_dir().join("captures"))
            .unwrap_or_else(|| PathBuf::from("captures"));
        assert_eq!(DashboardConfig::default().capture_dir, expected);
    }

    #[test]
    fn test_values() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("SCADA_BACKEND_URL", "http://192.168.0.10:5000/"),
            ("SCADA_POLL_INTERVAL_MS", "250"),
            ("SCADA_HTTP_TIMEOUT_MS", " 1500 "),
            ("SCADA_CAPTURE_DIR", "/tmp/shots"),
        ]))
        .unwrap();

        assert_eq!(
            config.backend_url.as_deref(),
            Some("http://192.168.0.10:5000")
        );
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.http_timeout, Duration::from_millis(1500));
        assert_eq!(config.capture_dir, PathBuf::from("/tmp/shots"));
    }

    #[test]
    fn test_blank_url_means_simulation() {
        let config = DashboardConfig::from_lookup(lookup(&[("SCADA_BACKEND_URL", "  ")])).unwrap();
        assert_eq!(config.backend_url, None);
    }

    #[test]
    fn test_invalid_numbers() {
        let result = DashboardConfig::from_lookup(lookup(&[("SCADA_POLL_INTERVAL_MS", "fast")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber { name: "SCADA_POLL_INTERVAL_MS", .. })
        ));

        let result = DashboardConfig::from_lookup(lookup(&[("SCADA_HTTP_TIMEOUT_MS", "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::Zero { name: "SCADA_HTTP_TIMEOUT_MS" })
        ));
    }
}
