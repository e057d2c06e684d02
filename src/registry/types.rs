use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::target::{QueryMap, SecondaryPattern};

use super::extract::ValidationError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$",
    )
    .expect("static email pattern")
});

/// Where a backend field is read from in a decomposed target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    Host,
    User,
    Password,
    /// Nth path segment after splitting
    Segment(usize),
    /// Host joined to a path segment, e.g. a token split across both
    HostWithSegment { index: usize, separator: char },
    Query(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional { default: Option<&'static str> },
}

/// Maps one named backend field onto the generic target shape
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub source: FieldSource,
    /// Query key that overrides `source` when present and non-empty
    pub query_alias: Option<&'static str>,
    pub requirement: Requirement,
}

impl FieldRule {
    pub fn required(name: &'static str, source: FieldSource) -> Self {
        Self {
            name,
            source,
            query_alias: None,
            requirement: Requirement::Required,
        }
    }

    pub fn optional(name: &'static str, source: FieldSource) -> Self {
        Self {
            name,
            source,
            query_alias: None,
            requirement: Requirement::Optional { default: None },
        }
    }

    pub fn with_default(mut self, default: &'static str) -> Self {
        self.requirement = Requirement::Optional {
            default: Some(default),
        };
        self
    }

    pub fn or_query(mut self, key: &'static str) -> Self {
        self.query_alias = Some(key);
        self
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }
}

/// How the path segments left over after field extraction become recipients
#[derive(Debug, Clone, Default)]
pub struct RecipientPolicy {
    /// Leading segments consumed by field rules
    pub skip: usize,
    /// Treat the URL user as the first recipient
    pub include_user: bool,
    /// Extra query key holding a delimited recipient list
    pub query_key: Option<&'static str>,
    /// Split into channel / email / device; otherwise every entry is a device
    pub classify: bool,
}

/// Registry entry describing one scheme
#[derive(Debug, Clone)]
pub struct NotifierDescriptor {
    pub scheme: &'static str,
    pub backend: &'static str,
    /// Whether `{scheme}s` resolves here with secure transport
    pub secure_variant: bool,
    pub fields: Vec<FieldRule>,
    /// `None` when the path carries no recipients
    pub recipients: Option<RecipientPolicy>,
    pub rescue: Option<SecondaryPattern>,
}

impl NotifierDescriptor {
    pub fn new(scheme: &'static str, backend: &'static str) -> Self {
        Self {
            scheme,
            backend,
            secure_variant: false,
            fields: Vec::new(),
            recipients: None,
            rescue: None,
        }
    }

    pub fn secure_variant(mut self) -> Self {
        self.secure_variant = true;
        self
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    pub fn recipients(mut self, policy: RecipientPolicy) -> Self {
        self.recipients = Some(policy);
        self
    }

    pub fn rescue(mut self, pattern: SecondaryPattern) -> Self {
        self.rescue = Some(pattern);
        self
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.is_required()).map(|f| f.name)
    }

    pub fn optional_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| !f.is_required()).map(|f| f.name)
    }
}

/// One fan-out destination under a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Recipient {
    /// Segment beginning with `#`, stored without the marker
    Channel(String),
    Email(String),
    Device(String),
}

impl Recipient {
    pub fn classify(segment: &str) -> Self {
        if let Some(channel) = segment.strip_prefix('#') {
            Recipient::Channel(channel.to_string())
        } else if EMAIL_RE.is_match(segment) {
            Recipient::Email(segment.to_string())
        } else {
            Recipient::Device(segment.to_string())
        }
    }

    /// Bare identifier without the channel marker
    pub fn id(&self) -> &str {
        match self {
            Recipient::Channel(v) | Recipient::Email(v) | Recipient::Device(v) => v,
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Channel(v) => write!(f, "#{}", v),
            Recipient::Email(v) | Recipient::Device(v) => f.write_str(v),
        }
    }
}

/// Backend arguments extracted from a target
#[derive(Debug, Clone)]
pub struct ArgumentSet {
    pub scheme: String,
    pub backend: &'static str,
    pub secure: bool,
    /// TLS certificate verification, from `verify=`
    pub verify: bool,
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub path: String,
    pub fields: BTreeMap<&'static str, String>,
    pub recipients: Vec<Recipient>,
    pub query: QueryMap,
}

impl ArgumentSet {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn require(&self, name: &'static str) -> Result<&str, ValidationError> {
        self.field(name)
            .ok_or_else(|| ValidationError::MissingFields(vec![name.to_string()]))
    }

    /// Parse an optional field, reporting a malformed value as invalid
    pub fn parse_field<T: std::str::FromStr>(
        &self,
        name: &'static str,
    ) -> Result<Option<T>, ValidationError> {
        match self.field(name) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| ValidationError::invalid(name, format!("'{}' is not valid", raw))),
            None => Ok(None),
        }
    }

    pub fn recipient_labels(&self) -> Vec<String> {
        self.recipients.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_segments() {
        assert_eq!(
            Recipient::classify("#teamroom"),
            Recipient::Channel("teamroom".to_string())
        );
        assert_eq!(
            Recipient::classify("a@b.com"),
            Recipient::Email("a@b.com".to_string())
        );
        assert_eq!(
            Recipient::classify("device123"),
            Recipient::Device("device123".to_string())
        );
        assert_eq!(
            Recipient::classify("@teamchannel"),
            Recipient::Device("@teamchannel".to_string())
        );
        assert_eq!(
            Recipient::classify("First.Last+tag@Mail.Example.org"),
            Recipient::Email("First.Last+tag@Mail.Example.org".to_string())
        );
    }

    #[test]
    fn test_recipient_display_keeps_marker() {
        assert_eq!(Recipient::classify("#room").to_string(), "#room");
        assert_eq!(Recipient::classify("#room").id(), "room");
    }

    #[test]
    fn test_descriptor_field_lists() {
        let descriptor = NotifierDescriptor::new("demo", "demo")
            .field(FieldRule::required("token", FieldSource::Host))
            .field(FieldRule::optional("priority", FieldSource::Query("priority")).with_default("0"));

        assert_eq!(descriptor.required_fields().collect::<Vec<_>>(), vec!["token"]);
        assert_eq!(descriptor.optional_fields().collect::<Vec<_>>(), vec!["priority"]);
    }
}
