use crate::humanize::HumanDuration;
use crate::notifier::{DEFAULT_IMAGE_URL_TEMPLATE, HttpSettings};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dispatch behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Scheme applied to targets written without `scheme://`
    #[serde(default = "default_scheme")]
    pub default_scheme: String,
    /// Delay between consecutive sends of one fan-out
    #[serde(default = "default_throttle")]
    pub throttle: HumanDuration,
    /// Exit non-zero unless every target was delivered
    #[serde(default)]
    pub strict: bool,
    /// Targets used when none are given on the command line
    #[serde(default)]
    pub targets: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_scheme: default_scheme(),
            throttle: default_throttle(),
            strict: false,
            targets: Vec::new(),
        }
    }
}

fn default_scheme() -> String {
    "unknown".to_string()
}

fn default_throttle() -> HumanDuration {
    HumanDuration::from_millis(5500)
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: self.connect_timeout.as_duration(),
            request_timeout: self.request_timeout.as_duration(),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_millis(10_000)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_millis(30_000)
}

fn default_user_agent() -> String {
    format!("NotifyBox/{}", env!("CARGO_PKG_VERSION"))
}

/// Image hints attached to notifications
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImagesConfig {
    #[serde(default)]
    pub include: bool,
    /// Shared override image, `http(s)://` or `file://`
    #[serde(default, rename = "override")]
    pub override_image: Option<String>,
    #[serde(default = "default_url_template")]
    pub url_template: String,
    #[serde(default)]
    pub path_template: Option<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            include: false,
            override_image: None,
            url_template: default_url_template(),
            path_template: None,
        }
    }
}

fn default_url_template() -> String {
    DEFAULT_IMAGE_URL_TEMPLATE.to_string()
}

/// Log output
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.dispatch.default_scheme, "unknown");
        assert_eq!(config.dispatch.throttle.as_duration(), Duration::from_millis(5500));
        assert!(!config.dispatch.strict);
        assert_eq!(config.http.request_timeout.as_duration(), Duration::from_secs(30));
        assert_eq!(config.http.user_agent, "NotifyBox/0.1.0");
        assert!(config.images.url_template.contains("{TYPE}"));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_http_settings_conversion() {
        let settings = HttpConfig::default().settings();
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: Config = toml::from_str(
            r#"
[dispatch]
throttle = "250ms"
targets = ["json://localhost"]

[images]
include = true
override = "https://cdn.example/icon.png"
            "#,
        )
        .unwrap();

        assert_eq!(config.dispatch.throttle.as_duration(), Duration::from_millis(250));
        assert_eq!(config.dispatch.default_scheme, "unknown");
        assert_eq!(config.dispatch.targets, vec!["json://localhost"]);
        assert_eq!(
            config.images.override_image.as_deref(),
            Some("https://cdn.example/icon.png")
        );
    }
}
