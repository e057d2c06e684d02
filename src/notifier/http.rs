//! HTTP transport shared by the bundled backends

use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, warn};

use super::NotifyError;

/// Reasons for common non-success statuses
pub const HTTP_ERROR_REASONS: &[(u16, &str)] = &[
    (400, "Bad Request - Unsupported Parameters."),
    (401, "Verification Failed."),
    (404, "Page not found."),
    (405, "Method not allowed."),
    (500, "Internal server error."),
    (503, "Servers are overloaded."),
];

/// Look up a status reason, backend overrides first
pub fn status_reason(status: u16, overrides: &[(u16, &str)]) -> String {
    overrides
        .iter()
        .chain(HTTP_ERROR_REASONS)
        .find(|(code, _)| *code == status)
        .map(|(_, reason)| reason.to_string())
        .or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown".to_string())
}

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: "NotifyBox/0.1.0".to_string(),
        }
    }
}

/// HTTP transport for one notifier
pub struct HttpTransport {
    client: Client,
    service: &'static str,
    overrides: &'static [(u16, &'static str)],
}

impl HttpTransport {
    /// Create a transport; `verify = false` disables certificate checks
    pub fn new(
        settings: &HttpSettings,
        service: &'static str,
        verify: bool,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(&settings.user_agent)
            .danger_accept_invalid_certs(!verify)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            service,
            overrides: &[],
        })
    }

    /// Backend-specific status reasons that take precedence over the shared table
    pub fn with_status_overrides(mut self, overrides: &'static [(u16, &'static str)]) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send a prepared request and read the body of a successful response
    pub async fn execute(&self, request: RequestBuilder) -> Result<Bytes, NotifyError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NotifyError::Transport(format!("{} request timed out", self.service))
            } else {
                NotifyError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let reason = status_reason(status.as_u16(), self.overrides);
            warn!(
                service = self.service,
                status = status.as_u16(),
                reason = %reason,
                "Backend rejected notification"
            );
            return Err(NotifyError::Backend {
                status: status.as_u16(),
                reason,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| NotifyError::Transport(format!("Failed to read body: {}", e)))?;

        debug!(service = self.service, size = bytes.len(), "Backend accepted notification");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_settings_defaults() {
        let settings = HttpSettings::default();
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.user_agent, "NotifyBox/0.1.0");
    }

    #[test]
    fn test_status_reason_table() {
        assert_eq!(status_reason(503, &[]), "Servers are overloaded.");
        assert_eq!(
            status_reason(401, &[(401, "Unauthorized - Invalid Token.")]),
            "Unauthorized - Invalid Token."
        );
        assert_eq!(status_reason(418, &[]), "I'm a teapot");
        assert_eq!(status_reason(599, &[]), "Unknown");
    }
}
