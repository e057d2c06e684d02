//! Telegram bot notifications
//!
//! Bot tokens look like `123456789:AAH...`, which puts a colon exactly where a
//! port would sit in `tgram://123456789:AAH.../chat`. The secondary pattern
//! below turns that colon into a path separator when, and only when, the
//! primary decomposition fails.

use async_trait::async_trait;
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

use crate::notifier::format::escape_html;
use crate::notifier::{HttpSettings, HttpTransport, Message, Notifier, NotifierProfile, NotifyError};
use crate::registry::{
    ArgumentSet, Backend, FieldRule, FieldSource, NotifierDescriptor, Recipient, RecipientPolicy,
    ValidationError,
};
use crate::request::BodyFormat;
use crate::target::SecondaryPattern;

const TELEGRAM_BOT_URL: &str = "https://api.telegram.org/bot";

static TOKEN_RESCUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<protocol>tgram://)(bot)?(?P<prefix>[a-z0-9_-]+(:[a-z0-9_-]+)?@)?(?P<btoken_a>[0-9]+):+(?P<remaining>.*)$",
    )
    .expect("static telegram rescue pattern")
});

static BOT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(bot)?(?P<key>[0-9]+:[a-z0-9_-]{32,34})$").expect("static bot token pattern")
});

static CHAT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(@*(?P<idno>-?[0-9]{1,14})|@*(?P<name>[a-z_-][a-z0-9_-]*))$")
        .expect("static chat id pattern")
});

fn rewrite_token(caps: &Captures<'_>) -> String {
    format!(
        "{}{}{}/{}",
        &caps["protocol"],
        caps.name("prefix").map_or("", |m| m.as_str()),
        &caps["btoken_a"],
        &caps["remaining"],
    )
}

/// Rewrites `tgram://[bot][chat@]123:TOKEN/...` into `tgram://[chat@]123/TOKEN/...`
pub static TELEGRAM_TOKEN_PATTERN: SecondaryPattern =
    SecondaryPattern::new("tgram", &TOKEN_RESCUE_RE, rewrite_token);

/// Telegram: `tgram://bot_token/chat_id[/chat_id...]` or `tgram://chat_id@bot_token`
pub struct TelegramBackend {
    descriptor: NotifierDescriptor,
}

impl TelegramBackend {
    pub fn new() -> Self {
        Self {
            descriptor: NotifierDescriptor::new("tgram", "telegram")
                .field(FieldRule::required(
                    "bot_token",
                    FieldSource::HostWithSegment {
                        index: 0,
                        separator: ':',
                    },
                ))
                .field(FieldRule::optional("format", FieldSource::Query("format")))
                .recipients(RecipientPolicy {
                    skip: 1,
                    include_user: true,
                    query_key: Some("to"),
                    classify: false,
                })
                .rescue(TELEGRAM_TOKEN_PATTERN),
        }
    }

    fn notifier(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<TelegramNotifier, NotifyError> {
        let raw_token = args.require("bot_token")?;
        let bot_token = BOT_TOKEN_RE
            .captures(raw_token.trim())
            .map(|caps| caps["key"].to_string())
            .ok_or_else(|| ValidationError::invalid("bot_token", format!("'{}' is not a bot token", raw_token)))?;

        if args.recipients.is_empty() {
            return Err(ValidationError::MissingFields(vec!["chat_id".to_string()]).into());
        }

        let format = match args.field("format").and_then(|f| f.chars().next()) {
            Some('h' | 'H') => BodyFormat::Html,
            Some('t' | 'T') => BodyFormat::Text,
            _ => BodyFormat::Markdown,
        };

        Ok(TelegramNotifier {
            transport: HttpTransport::new(http, "telegram", args.verify)?,
            url: format!("{}{}/sendMessage", TELEGRAM_BOT_URL, bot_token),
            chat_ids: args.recipients.clone(),
            format,
        })
    }
}

impl Default for TelegramBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for TelegramBackend {
    fn descriptor(&self) -> &NotifierDescriptor {
        &self.descriptor
    }

    fn build(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<Box<dyn Notifier>, NotifyError> {
        Ok(Box::new(self.notifier(args, http)?))
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct TelegramPayload {
    chat_id: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

struct TelegramNotifier {
    transport: HttpTransport,
    url: String,
    chat_ids: Vec<Recipient>,
    format: BodyFormat,
}

impl TelegramNotifier {
    fn payload(&self, message: &Message, chat: &Recipient) -> Result<TelegramPayload, ValidationError> {
        let caps = CHAT_ID_RE
            .captures(chat.id().trim_start_matches('#'))
            .ok_or_else(|| ValidationError::invalid("chat_id", format!("'{}' is not a chat id", chat)))?;

        let chat_id = match (caps.name("idno"), caps.name("name")) {
            (Some(id), _) => id.as_str().to_string(),
            (None, Some(name)) => format!("@{}", name.as_str()),
            (None, None) => return Err(ValidationError::invalid("chat_id", chat.to_string())),
        };

        let (text, parse_mode) = match self.format {
            BodyFormat::Html => (
                format!("<b>{}</b>\r\n{}", escape_html(&message.title, false), message.body),
                Some("HTML"),
            ),
            BodyFormat::Markdown => (format!("*{}*\r\n{}", message.title, message.body), Some("Markdown")),
            BodyFormat::Text => (format!("{}\r\n{}", message.title, message.body), None),
        };

        Ok(TelegramPayload {
            chat_id,
            text,
            parse_mode,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn profile(&self) -> NotifierProfile {
        NotifierProfile {
            title_maxlen: 250,
            body_maxlen: 4096,
            format: self.format,
            ..NotifierProfile::default()
        }
    }

    fn recipients(&self) -> &[Recipient] {
        &self.chat_ids
    }

    async fn send(&self, message: &Message, recipient: Option<&Recipient>) -> Result<(), NotifyError> {
        let chat = recipient.ok_or_else(|| ValidationError::MissingFields(vec!["chat_id".to_string()]))?;
        let payload = self.payload(message, chat)?;

        let request = self.transport.post(&self.url).json(&payload);
        self.transport.execute(request).await?;
        Ok(())
    }
}
