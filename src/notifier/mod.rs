//! Notifier contract and the cross-cutting behavior every backend gets
//!
//! Backends only implement [`Notifier::send`] for one prepared [`Message`].
//! Truncation, format conversion, image resolution and the fan-out throttle are
//! applied uniformly by [`notify`].

mod fanout;
pub mod format;
mod http;
mod images;

pub use fanout::{FanoutReport, SendFailure, Throttle, notify, prepare_message};
pub use http::{HTTP_ERROR_REASONS, HttpSettings, HttpTransport, status_reason};
pub use images::{
    DEFAULT_IMAGE_URL_TEMPLATE, ImageError, ImageOverride, ImageRef, ImageResolver, ImageSize,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::registry::{Recipient, ValidationError};
use crate::request::{BodyFormat, NotifyType};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned {status}: {reason}")]
    Backend { status: u16, reason: String },

    #[error("cancelled before delivery")]
    Cancelled,
}

impl NotifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotifyError::Validation(_) => ErrorKind::Validation,
            NotifyError::Transport(_) => ErrorKind::Transport,
            NotifyError::Backend { .. } => ErrorKind::Backend,
            NotifyError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Limits and formats a backend declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierProfile {
    pub title_maxlen: usize,
    pub body_maxlen: usize,
    pub format: BodyFormat,
    pub image_size: Option<ImageSize>,
    /// Some backends only display the first few lines
    pub body_max_lines: Option<usize>,
}

impl Default for NotifierProfile {
    fn default() -> Self {
        Self {
            title_maxlen: 100,
            body_maxlen: 512,
            format: BodyFormat::Text,
            image_size: None,
            body_max_lines: None,
        }
    }
}

/// Message after truncation, conversion and image resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
    pub notify_type: NotifyType,
    pub format: BodyFormat,
    pub image: Option<ImageRef>,
}

impl Message {
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().and_then(ImageRef::url)
    }
}

/// A constructed backend instance for one target
#[async_trait]
pub trait Notifier: Send + Sync {
    fn profile(&self) -> NotifierProfile;

    /// Fan-out recipients; empty means one send without a recipient
    fn recipients(&self) -> &[Recipient] {
        &[]
    }

    /// Perform one outbound call
    async fn send(&self, message: &Message, recipient: Option<&Recipient>) -> Result<(), NotifyError>;
}
