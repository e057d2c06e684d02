use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::request::NotificationRequest;

use super::format::{prepare_body, truncate};
use super::images::ImageResolver;
use super::{Message, Notifier, NotifierProfile, NotifyError};

/// Cancellable delay between consecutive sends of one fan-out
#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
    token: CancellationToken,
}

impl Throttle {
    pub fn new(delay: Duration, token: CancellationToken) -> Self {
        Self { delay, token }
    }

    pub async fn wait(&self) -> Result<(), NotifyError> {
        if self.delay.is_zero() {
            return Ok(());
        }

        debug!(delay_ms = self.delay.as_millis() as u64, "Throttling");

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(NotifyError::Cancelled),
            _ = tokio::time::sleep(self.delay) => Ok(()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendFailure {
    pub recipient: Option<String>,
    pub kind: ErrorKind,
    pub error: String,
}

/// Outcome of delivering one message to every recipient of a target
#[derive(Debug, Default, Serialize)]
pub struct FanoutReport {
    pub attempted: usize,
    pub sent: usize,
    pub failures: Vec<SendFailure>,
    /// Recipients left unsent after cancellation
    pub skipped: usize,
    pub cancelled: bool,
}

impl FanoutReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled && self.sent > 0
    }

    /// Kind of the first failure, or `Cancelled` when the fan-out was cut short
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failures
            .first()
            .map(|f| f.kind)
            .or(self.cancelled.then_some(ErrorKind::Cancelled))
    }

    pub fn summary(&self) -> String {
        let mut summary = format!("sent {}/{}", self.sent, self.attempted + self.skipped);

        if let Some(first) = self.failures.first() {
            summary.push_str(&format!("; {}", first.error));
            if self.failures.len() > 1 {
                summary.push_str(&format!(" (+{} more)", self.failures.len() - 1));
            }
        }
        if self.cancelled {
            summary.push_str(&format!("; cancelled with {} unsent", self.skipped));
        }

        summary
    }
}

/// Build the message a backend receives for `request`
pub fn prepare_message(
    request: &NotificationRequest,
    profile: &NotifierProfile,
    images: &ImageResolver,
) -> Message {
    Message {
        title: truncate(request.title.trim(), profile.title_maxlen),
        body: prepare_body(
            &request.body,
            request.body_format,
            profile.format,
            profile.body_maxlen,
            profile.body_max_lines,
        ),
        notify_type: request.notify_type,
        format: profile.format,
        image: images.resolve(request.notify_type, profile.image_size),
    }
}

/// Deliver `request` through `notifier` to each of its recipients in order.
///
/// The throttle runs between consecutive sends and never after the last one.
/// A failed send does not stop the remaining recipients; cancellation does.
pub async fn notify(
    notifier: &dyn Notifier,
    request: &NotificationRequest,
    images: &ImageResolver,
    throttle: &Throttle,
) -> FanoutReport {
    let message = prepare_message(request, &notifier.profile(), images);
    let recipients: Vec<_> = if notifier.recipients().is_empty() {
        vec![None]
    } else {
        notifier.recipients().iter().map(Some).collect()
    };

    let mut report = FanoutReport::default();
    let total = recipients.len();

    for (index, recipient) in recipients.into_iter().enumerate() {
        if index > 0 {
            if let Err(e) = throttle.wait().await {
                debug!(error = %e, "Fan-out interrupted during throttle");
                report.cancelled = true;
                report.skipped = total - index;
                break;
            }
        }

        report.attempted += 1;
        match notifier.send(&message, recipient).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                let label = recipient.map(ToString::to_string);
                warn!(recipient = ?label, error = %e, "Send failed");
                report.failures.push(SendFailure {
                    recipient: label,
                    kind: e.kind(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Recipient;
    use crate::request::{BodyFormat, NotifyType};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    struct Recorder {
        recipients: Vec<Recipient>,
        sends: Arc<Mutex<Vec<(Option<String>, Instant)>>>,
        fail_on: Option<&'static str>,
        profile: NotifierProfile,
    }

    impl Recorder {
        fn new(recipients: &[&str]) -> Self {
            Self {
                recipients: recipients.iter().map(|r| Recipient::classify(r)).collect(),
                sends: Arc::new(Mutex::new(Vec::new())),
                fail_on: None,
                profile: NotifierProfile::default(),
            }
        }
    }

    #[async_trait]
    impl Notifier for Recorder {
        fn profile(&self) -> NotifierProfile {
            self.profile
        }

        fn recipients(&self) -> &[Recipient] {
            &self.recipients
        }

        async fn send(&self, _message: &Message, recipient: Option<&Recipient>) -> Result<(), NotifyError> {
            let label = recipient.map(ToString::to_string);
            self.sends.lock().unwrap().push((label.clone(), Instant::now()));
            if label.as_deref() == self.fail_on {
                return Err(NotifyError::Backend {
                    status: 500,
                    reason: "Internal server error.".to_string(),
                });
            }
            Ok(())
        }
    }

    fn request() -> NotificationRequest {
        NotificationRequest::builder()
            .title("Job done")
            .body("All **good**")
            .notify_type(NotifyType::Success)
            .body_format(BodyFormat::Markdown)
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_between_recipients_only() {
        let notifier = Recorder::new(&["a", "b", "c"]);
        let throttle = Throttle::new(Duration::from_millis(5500), CancellationToken::new());
        let start = Instant::now();

        let report = notify(&notifier, &request(), &ImageResolver::default(), &throttle).await;

        assert!(report.is_success());
        assert_eq!(report.sent, 3);
        // Two gaps for three sends, nothing after the last
        assert_eq!(start.elapsed(), Duration::from_millis(11_000));

        let sends = notifier.sends.lock().unwrap();
        assert_eq!(sends[1].1 - sends[0].1, Duration::from_millis(5500));
        assert_eq!(sends[2].1 - sends[1].1, Duration::from_millis(5500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_send_without_recipients() {
        let notifier = Recorder::new(&[]);
        let throttle = Throttle::new(Duration::from_secs(5), CancellationToken::new());
        let start = Instant::now();

        let report = notify(&notifier, &request(), &ImageResolver::default(), &throttle).await;

        assert_eq!(report.attempted, 1);
        assert_eq!(notifier.sends.lock().unwrap()[0].0, None);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_fanout() {
        let mut notifier = Recorder::new(&["a", "b", "c"]);
        notifier.fail_on = Some("b");
        let throttle = Throttle::new(Duration::from_secs(1), CancellationToken::new());

        let report = notify(&notifier, &request(), &ImageResolver::default(), &throttle).await;

        assert!(!report.is_success());
        assert_eq!(report.sent, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.error_kind(), Some(ErrorKind::Backend));
        assert_eq!(report.summary(), "sent 2/3; backend returned 500: Internal server error.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_throttle() {
        let notifier = Recorder::new(&["a", "b", "c"]);
        let token = CancellationToken::new();
        let throttle = Throttle::new(Duration::from_secs(60), token.clone());

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });

        let report = notify(&notifier, &request(), &ImageResolver::default(), &throttle).await;
        cancel.await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.sent, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.error_kind(), Some(ErrorKind::Cancelled));
    }

    #[test]
    fn test_prepare_message_applies_profile() {
        let profile = NotifierProfile {
            title_maxlen: 3,
            body_maxlen: 100,
            format: BodyFormat::Html,
            image_size: None,
            body_max_lines: None,
        };
        let message = prepare_message(&request(), &profile, &ImageResolver::new(true));

        assert_eq!(message.title, "Job");
        assert_eq!(message.body, "<p>All <strong>good</strong></p>");
        assert_eq!(message.format, BodyFormat::Html);
        assert_eq!(message.image, None);
    }
}
