use super::models::Config;
use crate::notifier::ImageOverride;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

const MAX_THROTTLE: Duration = Duration::from_secs(300);

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9][a-z0-9+._-]*$").expect("static scheme pattern"));

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("dispatch.default_scheme must not be empty")]
    EmptyDefaultScheme,

    #[error("dispatch.default_scheme '{0}' is not a valid scheme")]
    InvalidDefaultScheme(String),

    #[error("http.request_timeout must be positive")]
    ZeroRequestTimeout,

    #[error("dispatch.throttle ({actual}) exceeds limit of 5m")]
    ThrottleTooLong { actual: String },

    #[error("images.{field} is missing the {placeholder} placeholder")]
    TemplateMissingPlaceholder {
        field: &'static str,
        placeholder: &'static str,
    },

    #[error("images.override is invalid: {0}")]
    InvalidImageOverride(String),
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_dispatch(config)?;
    validate_http(config)?;
    validate_images(config)?;
    Ok(())
}

fn validate_dispatch(config: &Config) -> Result<(), ValidationError> {
    let scheme = config.dispatch.default_scheme.trim();
    if scheme.is_empty() {
        return Err(ValidationError::EmptyDefaultScheme);
    }
    if !SCHEME_RE.is_match(scheme) {
        return Err(ValidationError::InvalidDefaultScheme(scheme.to_string()));
    }

    if config.dispatch.throttle.as_duration() > MAX_THROTTLE {
        return Err(ValidationError::ThrottleTooLong {
            actual: config.dispatch.throttle.to_human_readable(),
        });
    }

    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    if config.http.request_timeout.is_zero() {
        return Err(ValidationError::ZeroRequestTimeout);
    }
    Ok(())
}

fn validate_images(config: &Config) -> Result<(), ValidationError> {
    check_template("url_template", &config.images.url_template)?;
    if let Some(path_template) = &config.images.path_template {
        check_template("path_template", path_template)?;
    }

    if let Some(image) = &config.images.override_image {
        ImageOverride::parse(image).map_err(|e| ValidationError::InvalidImageOverride(e.to_string()))?;
    }

    Ok(())
}

fn check_template(field: &'static str, template: &str) -> Result<(), ValidationError> {
    for placeholder in ["{TYPE}", "{XY}"] {
        if !template.contains(placeholder) {
            return Err(ValidationError::TemplateMissingPlaceholder { field, placeholder });
        }
    }
    Ok(())
}
