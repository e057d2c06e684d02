use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::error::ErrorKind;

/// Where a target stopped in `decompose -> route -> extract -> deliver`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    Pending,
    Parsed,
    ParseFailed,
    Routed,
    RoutingFailed,
    Validated,
    ValidationFailed,
    Delivered,
    DeliveryFailed,
}

impl TargetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetState::Pending => "pending",
            TargetState::Parsed => "parsed",
            TargetState::ParseFailed => "parse_failed",
            TargetState::Routed => "routed",
            TargetState::RoutingFailed => "routing_failed",
            TargetState::Validated => "validated",
            TargetState::ValidationFailed => "validation_failed",
            TargetState::Delivered => "delivered",
            TargetState::DeliveryFailed => "delivery_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TargetState::ParseFailed
                | TargetState::RoutingFailed
                | TargetState::ValidationFailed
                | TargetState::DeliveryFailed
        )
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one target
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    /// Target exactly as supplied
    pub target: String,
    pub state: TargetState,
    pub error: Option<ErrorKind>,
    pub message: String,
    pub backend: Option<String>,
    /// Canonical form with the password masked
    pub canonical: Option<String>,
    pub recipients: Vec<String>,
    pub attempts: usize,
    pub attempted_at: DateTime<Utc>,
}

impl DeliveryResult {
    pub fn pending(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            state: TargetState::Pending,
            error: None,
            message: String::new(),
            backend: None,
            canonical: None,
            recipients: Vec::new(),
            attempts: 0,
            attempted_at: Utc::now(),
        }
    }

    pub(crate) fn advance(&mut self, state: TargetState) {
        self.state = state;
    }

    pub(crate) fn fail(mut self, state: TargetState, kind: ErrorKind, message: impl Into<String>) -> Self {
        self.state = state;
        self.error = Some(kind);
        self.message = message.into();
        self
    }

    pub fn is_delivered(&self) -> bool {
        self.state == TargetState::Delivered
    }
}

/// Every result of one dispatch call, in target order
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub results: Vec<DeliveryResult>,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            results: Vec::new(),
            cancelled: false,
        }
    }

    pub fn results(&self) -> &[DeliveryResult] {
        &self.results
    }

    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|r| r.is_delivered()).count()
    }

    /// True only when at least one target ran and every target was delivered
    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && !self.results.is_empty() && self.results.iter().all(DeliveryResult::is_delivered)
    }

    /// Batch-level flag kept for callers that expect the historical contract:
    /// a completed dispatch reports success regardless of individual outcomes.
    pub fn legacy_success(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered(target: &str) -> DeliveryResult {
        let mut result = DeliveryResult::pending(target);
        result.advance(TargetState::Delivered);
        result
    }

    #[test]
    fn test_all_succeeded_requires_every_target() {
        let mut report = BatchReport::new(Uuid::now_v7());
        assert!(!report.all_succeeded());
        assert!(report.legacy_success());

        report.results.push(delivered("json://a"));
        assert!(report.all_succeeded());

        report.results.push(DeliveryResult::pending("bogus://x").fail(
            TargetState::RoutingFailed,
            ErrorKind::UnsupportedScheme,
            "unsupported scheme: bogus",
        ));
        assert!(!report.all_succeeded());
        assert!(report.legacy_success());
        assert_eq!(report.delivered(), 1);
    }

    #[test]
    fn test_cancelled_batch_is_not_success() {
        let mut report = BatchReport::new(Uuid::now_v7());
        report.results.push(delivered("json://a"));
        report.cancelled = true;
        assert!(!report.all_succeeded());
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let result = DeliveryResult::pending("x").fail(TargetState::ParseFailed, ErrorKind::Parse, "no host");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["state"], "parse_failed");
        assert_eq!(value["error"], "parse");
        assert!(TargetState::ParseFailed.is_failure());
        assert!(!TargetState::Validated.is_failure());
    }
}
