//! Image hint resolution for notification types

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::request::NotifyType;

pub const DEFAULT_IMAGE_URL_TEMPLATE: &str =
    "https://nzbget.lead2gold.org/notify/nzbget-notify-{TYPE}-{XY}.png";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unsupported image override '{0}': expected http(s):// or file://")]
    UnsupportedScheme(String),

    #[error("image override file not found: {0}")]
    MissingFile(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageSize {
    #[serde(rename = "72x72")]
    Xy72,
    #[serde(rename = "128x128")]
    Xy128,
    #[serde(rename = "256x256")]
    Xy256,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Xy72 => "72x72",
            ImageSize::Xy128 => "128x128",
            ImageSize::Xy256 => "256x256",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared image override supplied once per batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOverride {
    Url(String),
    Path(PathBuf),
}

impl ImageOverride {
    /// Parse and validate an override; a `file://` target must exist
    pub fn parse(value: &str) -> Result<Self, ImageError> {
        let value = value.trim();
        let lowered = value.to_lowercase();

        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            return Ok(ImageOverride::Url(value.to_string()));
        }

        if lowered.starts_with("file://") {
            let path = PathBuf::from(&value["file://".len()..]);
            if !path.is_file() {
                return Err(ImageError::MissingFile(path));
            }
            return Ok(ImageOverride::Path(path));
        }

        Err(ImageError::UnsupportedScheme(value.to_string()))
    }
}

/// Image chosen for one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub url: Option<String>,
    pub path: Option<PathBuf>,
}

impl ImageRef {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Resolves the image hint for `(notify_type, size)`
///
/// The URL and the raw path resolve independently. An override replaces
/// only its own channel and the other keeps its themed default.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    include: bool,
    override_image: Option<ImageOverride>,
    url_template: String,
    path_template: Option<String>,
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self {
            include: false,
            override_image: None,
            url_template: DEFAULT_IMAGE_URL_TEMPLATE.to_string(),
            path_template: None,
        }
    }
}

impl ImageResolver {
    pub fn new(include: bool) -> Self {
        Self {
            include,
            ..Self::default()
        }
    }

    pub fn with_override(mut self, image: Option<ImageOverride>) -> Self {
        self.override_image = image;
        self
    }

    pub fn with_templates(mut self, url_template: impl Into<String>, path_template: Option<String>) -> Self {
        self.url_template = url_template.into();
        self.path_template = path_template;
        self
    }

    pub fn resolve(&self, notify_type: NotifyType, size: Option<ImageSize>) -> Option<ImageRef> {
        if !self.include {
            return None;
        }

        let url = match &self.override_image {
            Some(ImageOverride::Url(url)) => Some(url.clone()),
            _ => size.map(|size| render_template(&self.url_template, notify_type, size)),
        };
        let path = match &self.override_image {
            Some(ImageOverride::Path(path)) => Some(path.clone()),
            _ => match (self.path_template.as_deref(), size) {
                (Some(template), Some(size)) => Some(PathBuf::from(render_template(template, notify_type, size))),
                _ => None,
            },
        };

        if url.is_none() && path.is_none() {
            return None;
        }
        Some(ImageRef { url, path })
    }
}

fn render_template(template: &str, notify_type: NotifyType, size: ImageSize) -> String {
    template
        .replace("{TYPE}", notify_type.as_str())
        .replace("{XY}", size.as_str())
}
