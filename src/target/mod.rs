//! Target URL decomposition
//!
//! Turns one raw, often non-standard, `scheme://…` string into a structured
//! [`TargetUrl`]. The grammar accepted here is deliberately forgiving:
//!
//! ```text
//! scheme://[user[:password]@]host[:port][/path][?key=value&...]
//! ```
//!
//! Strings without a `scheme:` prefix fall back to a bare `host[/path]` form
//! and receive the caller-supplied default scheme. Scheme-specific repairs for
//! strings that break the authority grammar live in [`rescue`] and are only
//! consulted by [`Decomposer`] after the primary parse fails.

mod query;
mod rescue;

pub use query::QueryMap;
pub use rescue::SecondaryPattern;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

static FULL_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^([a-z0-9][a-z0-9+._-]*):[/\\]+([^?]*)(?:\?(.*))?$")
        .expect("static url pattern")
});

static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([^?]*)(?:\?(.*))?$").expect("static bare pattern"));

const USERINFO_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

const PATH_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("target is empty")]
    Empty,

    #[error("no scheme given and no default scheme configured")]
    MissingScheme,

    #[error("no host could be isolated in '{0}'")]
    MissingHost(String),

    #[error("invalid port '{port}' in '{raw}'")]
    InvalidPort { raw: String, port: String },
}

/// A decomposed notification target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetUrl {
    pub scheme: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    /// Percent-decoded path including its leading separator, or empty
    pub path: String,
    pub query: QueryMap,
    pub raw: String,
    pub canonical: String,
}

impl TargetUrl {
    /// Reassemble the validated parts into a normalized URL string.
    ///
    /// Decomposing the result again yields identical structured fields.
    pub fn to_canonical(&self) -> String {
        let mut out = format!("{}://", self.scheme);

        if self.user.is_some() || self.password.is_some() {
            if let Some(user) = &self.user {
                out.extend(utf8_percent_encode(user, USERINFO_ENCODE));
            }
            if let Some(password) = &self.password {
                out.push(':');
                out.extend(utf8_percent_encode(password, USERINFO_ENCODE));
            }
            out.push('@');
        }

        out.push_str(&self.host);

        if let Some(port) = self.port {
            out.push_str(&format!(":{}", port));
        }

        out.extend(utf8_percent_encode(&self.path, PATH_ENCODE));

        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query.to_query_string());
        }

        out
    }

    /// Canonical form with the password (and any `pass=` query value) masked, for logs
    pub fn redacted(&self) -> String {
        if self.password.is_none() && !self.query.contains_key("pass") {
            return self.canonical.clone();
        }

        let mut masked = self.clone();
        if masked.password.is_some() {
            masked.password = Some("****".to_string());
        }
        if masked.query.contains_key("pass") {
            masked.query.insert("pass", "****");
        }
        masked.to_canonical()
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Decompose one raw target string.
///
/// `default_scheme` is applied when the string carries no `scheme:` prefix.
pub fn decompose(raw: &str, default_scheme: &str) -> Result<TargetUrl, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let (scheme, remainder, query) = match FULL_URL_RE.captures(trimmed) {
        Some(caps) => (
            caps[1].to_lowercase(),
            caps.get(2).map_or("", |m| m.as_str()),
            caps.get(3).map(|m| m.as_str()),
        ),
        None => {
            let caps = BARE_URL_RE
                .captures(trimmed)
                .ok_or_else(|| ParseError::MissingHost(raw.to_string()))?;
            let default_scheme = default_scheme.trim().to_lowercase();
            if default_scheme.is_empty() {
                return Err(ParseError::MissingScheme);
            }
            (
                default_scheme,
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map(|m| m.as_str()),
            )
        }
    };

    let (authority, raw_path) = match remainder.find(['/', '\\']) {
        Some(pos) => remainder.split_at(pos),
        None => (remainder, ""),
    };

    let (userinfo, hostport) = match authority.rsplit_once('@') {
        Some((userinfo, hostport)) => (Some(userinfo), hostport),
        None => (None, authority),
    };

    let (mut user, mut password) = match userinfo {
        Some(info) => match info.split_once(':') {
            Some((user, password)) => (non_empty(decode(user)), non_empty(decode(password))),
            None => (non_empty(decode(info)), None),
        },
        None => (None, None),
    };

    let (host, port_token) = split_host_port(raw, hostport.trim())?;
    if host.is_empty() {
        return Err(ParseError::MissingHost(raw.to_string()));
    }
    let port = parse_port(raw, port_token)?;

    let query = query.map(QueryMap::parse).unwrap_or_default();

    if user.is_none() {
        user = query.get("user").filter(|v| !v.is_empty()).map(str::to_string);
    }
    if password.is_none() {
        password = query.get("pass").filter(|v| !v.is_empty()).map(str::to_string);
    }

    let mut target = TargetUrl {
        scheme,
        user,
        password,
        host: host.to_string(),
        port,
        path: decode(raw_path),
        query,
        raw: raw.to_string(),
        canonical: String::new(),
    };
    target.canonical = target.to_canonical();

    Ok(target)
}

/// Decomposer bound to a default scheme and the registry's secondary patterns
#[derive(Debug, Clone)]
pub struct Decomposer<'a> {
    default_scheme: String,
    patterns: Vec<&'a SecondaryPattern>,
}

impl<'a> Decomposer<'a> {
    pub fn new(default_scheme: impl Into<String>) -> Self {
        Self {
            default_scheme: default_scheme.into(),
            patterns: Vec::new(),
        }
    }

    pub fn with_patterns(mut self, patterns: impl IntoIterator<Item = &'a SecondaryPattern>) -> Self {
        self.patterns.extend(patterns);
        self
    }

    /// Decompose `raw`, retrying once through a matching secondary pattern
    /// when the primary parse fails.
    pub fn decompose(&self, raw: &str) -> Result<TargetUrl, ParseError> {
        let primary = match decompose(raw, &self.default_scheme) {
            Ok(target) => return Ok(target),
            Err(e) => e,
        };

        let Some(scheme) = rescue::leading_scheme(raw) else {
            return Err(primary);
        };

        let rewritten = self
            .patterns
            .iter()
            .filter(|p| p.applies_to(&scheme))
            .find_map(|p| p.rewrite(raw));

        match rewritten {
            Some(rewritten) => {
                debug!(scheme = %scheme, error = %primary, "Retrying target through secondary pattern");
                let mut target = decompose(&rewritten, &self.default_scheme)?;
                target.raw = raw.to_string();
                Ok(target)
            }
            None => Err(primary),
        }
    }
}

fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Split `host[:port]`, keeping bracketed IPv6 literals intact
fn split_host_port<'a>(raw: &str, hostport: &'a str) -> Result<(&'a str, Option<&'a str>), ParseError> {
    if hostport.starts_with('[') {
        if let Some(end) = hostport.find(']') {
            let (host, rest) = hostport.split_at(end + 1);
            if rest.is_empty() {
                return Ok((host, None));
            }
            return match rest.strip_prefix(':') {
                Some(port) => Ok((host, Some(port))),
                None => Err(ParseError::InvalidPort {
                    raw: raw.to_string(),
                    port: rest.to_string(),
                }),
            };
        }
    }

    Ok(match hostport.split_once(':') {
        Some((host, port)) => (host.trim(), Some(port)),
        None => (hostport, None),
    })
}

fn parse_port(raw: &str, token: Option<&str>) -> Result<Option<u16>, ParseError> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let invalid = || ParseError::InvalidPort {
        raw: raw.to_string(),
        port: token.to_string(),
    };

    if !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    match token.parse::<u32>().map_err(|_| invalid())? {
        0 => Ok(None),
        port => u16::try_from(port).map(Some).map_err(|_| invalid()),
    }
}
