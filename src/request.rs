//! Notification request shared by the dispatcher and every backend

use bon::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyType {
    #[default]
    Info,
    Success,
    Warning,
    Failure,
}

impl NotifyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyType::Info => "info",
            NotifyType::Success => "success",
            NotifyType::Warning => "warning",
            NotifyType::Failure => "failure",
        }
    }
}

impl FromStr for NotifyType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(NotifyType::Info),
            "success" => Ok(NotifyType::Success),
            "warning" => Ok(NotifyType::Warning),
            "failure" => Ok(NotifyType::Failure),
            other => Err(UnknownVariant {
                kind: "notification type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for NotifyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Text,
    Html,
    Markdown,
}

impl BodyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyFormat::Text => "text",
            BodyFormat::Html => "html",
            BodyFormat::Markdown => "markdown",
        }
    }
}

impl FromStr for BodyFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(BodyFormat::Text),
            "html" => Ok(BodyFormat::Html),
            "markdown" | "md" => Ok(BodyFormat::Markdown),
            other => Err(UnknownVariant {
                kind: "body format",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification to deliver to every target of a batch
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct NotificationRequest {
    #[builder(into)]
    pub title: String,
    #[builder(into)]
    pub body: String,
    #[builder(default)]
    #[serde(default)]
    pub notify_type: NotifyType,
    #[builder(default)]
    #[serde(default)]
    pub body_format: BodyFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let request = NotificationRequest::builder().title("T").body("B").build();
        assert_eq!(request.notify_type, NotifyType::Info);
        assert_eq!(request.body_format, BodyFormat::Text);
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!("SUCCESS".parse::<NotifyType>().unwrap(), NotifyType::Success);
        assert_eq!("md".parse::<BodyFormat>().unwrap(), BodyFormat::Markdown);
        let err = "loud".parse::<NotifyType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown notification type 'loud'");
    }

    #[test]
    fn test_deserialize_request() {
        let request: NotificationRequest =
            serde_json::from_str(r#"{"title":"T","body":"B","notify_type":"failure"}"#).unwrap();
        assert_eq!(request.notify_type, NotifyType::Failure);
        assert_eq!(request.body_format, BodyFormat::Text);
    }
}
