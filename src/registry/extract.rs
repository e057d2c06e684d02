//! Argument mapping from a decomposed target onto backend fields

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

use crate::humanize::parse_bool;
use crate::target::TargetUrl;

use super::types::{
    ArgumentSet, FieldRule, FieldSource, NotifierDescriptor, Recipient, RecipientPolicy, Requirement,
};

static SEGMENT_DELIM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n,\\/]+").expect("static delimiter pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Split a path or delimited list into non-empty segments
pub fn split_segments(value: &str) -> Vec<String> {
    SEGMENT_DELIM_RE
        .split(value)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `scheme` is the secure `…s` variant of the descriptor's scheme
pub fn is_secure_variant(descriptor: &NotifierDescriptor, scheme: &str) -> bool {
    descriptor.secure_variant
        && scheme.len() == descriptor.scheme.len() + 1
        && scheme.starts_with(descriptor.scheme)
        && scheme.ends_with('s')
}

/// Extract backend arguments for a target resolved to `descriptor`.
///
/// Every missing required field is reported at once.
pub fn extract(descriptor: &NotifierDescriptor, target: &TargetUrl) -> Result<ArgumentSet, ValidationError> {
    let segments = split_segments(&target.path);

    let mut fields = BTreeMap::new();
    let mut missing = Vec::new();

    for rule in &descriptor.fields {
        match read_field(rule, target, &segments) {
            Some(value) => {
                fields.insert(rule.name, value);
            }
            None => match rule.requirement {
                Requirement::Required => missing.push(rule.name.to_string()),
                Requirement::Optional { default: Some(default) } => {
                    fields.insert(rule.name, default.to_string());
                }
                Requirement::Optional { default: None } => {}
            },
        }
    }

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let recipients = match &descriptor.recipients {
        Some(policy) => collect_recipients(policy, target, &segments),
        None => Vec::new(),
    };

    let verify = target
        .query
        .get("verify")
        .map(|v| parse_bool(v, true))
        .unwrap_or(true);

    Ok(ArgumentSet {
        scheme: target.scheme.clone(),
        backend: descriptor.backend,
        secure: is_secure_variant(descriptor, &target.scheme),
        verify,
        host: target.host.clone(),
        port: target.port,
        user: target.user.clone(),
        password: target.password.clone(),
        path: target.path.clone(),
        fields,
        recipients,
        query: target.query.clone(),
    })
}

fn collect_recipients(policy: &RecipientPolicy, target: &TargetUrl, segments: &[String]) -> Vec<Recipient> {
    let mut entries: Vec<String> = segments.iter().skip(policy.skip).cloned().collect();

    if let Some(key) = policy.query_key {
        if let Some(list) = target.query.get(key) {
            entries.extend(split_segments(list));
        }
    }
    // The user part trails every path and query recipient
    if policy.include_user {
        if let Some(user) = target.user.as_deref().filter(|u| !u.is_empty()) {
            entries.push(user.to_string());
        }
    }

    entries
        .into_iter()
        .map(|entry| {
            if policy.classify {
                Recipient::classify(&entry)
            } else {
                Recipient::Device(entry)
            }
        })
        .collect()
}

fn read_field(rule: &FieldRule, target: &TargetUrl, segments: &[String]) -> Option<String> {
    if let Some(alias) = rule.query_alias {
        if let Some(value) = target.query.get(alias).filter(|v| !v.is_empty()) {
            return Some(value.to_string());
        }
    }

    let value = match &rule.source {
        FieldSource::Host => Some(target.host.clone()),
        FieldSource::User => target.user.clone(),
        FieldSource::Password => target.password.clone(),
        FieldSource::Segment(index) => segments.get(*index).cloned(),
        FieldSource::HostWithSegment { index, separator } => segments
            .get(*index)
            .map(|segment| format!("{}{}{}", target.host, separator, segment)),
        FieldSource::Query(key) => target.query.get(key).map(str::to_string),
    };

    value.filter(|v| !v.is_empty())
}
