use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use crate::notifier::{HttpSettings, HttpTransport, Message, Notifier, NotifierProfile, NotifyError};
use crate::registry::{
    ArgumentSet, Backend, FieldRule, FieldSource, NotifierDescriptor, Recipient, RecipientPolicy,
    ValidationError,
};

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

const PUSHOVER_STATUS_OVERRIDES: &[(u16, &str)] = &[(401, "Unauthorized - Invalid Token.")];

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{30}$").expect("static token pattern"));

static DEVICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,25}$").expect("static device pattern"));

/// Pushover: `pover://user@token[/device...]`
pub struct PushoverBackend {
    descriptor: NotifierDescriptor,
}

impl PushoverBackend {
    pub fn new() -> Self {
        Self {
            descriptor: NotifierDescriptor::new("pover", "pushover")
                .field(FieldRule::required("token", FieldSource::Host))
                .field(FieldRule::required("user", FieldSource::User))
                .field(FieldRule::optional("priority", FieldSource::Query("priority")).with_default("0"))
                .recipients(RecipientPolicy {
                    query_key: Some("to"),
                    ..RecipientPolicy::default()
                }),
        }
    }

    fn notifier(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<PushoverNotifier, NotifyError> {
        let token = args.require("token")?;
        if !TOKEN_RE.is_match(token) {
            return Err(ValidationError::invalid("token", format!("'{}' is not a Pushover API token", token)).into());
        }

        let user = args.require("user")?;
        if !TOKEN_RE.is_match(user) {
            return Err(ValidationError::invalid("user", format!("'{}' is not a Pushover user/group key", user)).into());
        }

        Ok(PushoverNotifier {
            transport: HttpTransport::new(http, "pushover", args.verify)?
                .with_status_overrides(PUSHOVER_STATUS_OVERRIDES),
            token: token.to_string(),
            user: user.to_string(),
            priority: super::priority(args),
            devices: args.recipients.clone(),
        })
    }
}

impl Default for PushoverBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for PushoverBackend {
    fn descriptor(&self) -> &NotifierDescriptor {
        &self.descriptor
    }

    fn build(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<Box<dyn Notifier>, NotifyError> {
        Ok(Box::new(self.notifier(args, http)?))
    }
}

struct PushoverNotifier {
    transport: HttpTransport,
    token: String,
    user: String,
    priority: i8,
    devices: Vec<Recipient>,
}

impl PushoverNotifier {
    fn form(&self, message: &Message, device: Option<&Recipient>) -> Result<Vec<(&'static str, String)>, ValidationError> {
        let mut form = vec![
            ("token", self.token.clone()),
            ("user", self.user.clone()),
            ("priority", self.priority.to_string()),
            ("title", message.title.clone()),
            ("message", message.body.clone()),
        ];

        if let Some(device) = device {
            if !DEVICE_RE.is_match(device.id()) {
                return Err(ValidationError::invalid("device", format!("'{}' is not a valid device", device)));
            }
            form.push(("device", device.id().to_string()));
        }

        if let Some(url) = message.image_url() {
            form.push(("url", url.to_string()));
        }

        Ok(form)
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn profile(&self) -> NotifierProfile {
        NotifierProfile {
            title_maxlen: 250,
            body_maxlen: 512,
            ..NotifierProfile::default()
        }
    }

    fn recipients(&self) -> &[Recipient] {
        &self.devices
    }

    async fn send(&self, message: &Message, recipient: Option<&Recipient>) -> Result<(), NotifyError> {
        let form = self.form(message, recipient)?;
        let request = self
            .transport
            .post(PUSHOVER_URL)
            .basic_auth(&self.token, Some(""))
            .form(&form);

        self.transport.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::args_for;
    use crate::request::{BodyFormat, NotifyType};

    const TOKEN: &str = "abcdefghijklmnopqrstuvwxyz0123";
    const USER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ4567";

    fn message() -> Message {
        Message {
            title: "T".to_string(),
            body: "B".to_string(),
            notify_type: NotifyType::Info,
            format: BodyFormat::Text,
            image: None,
        }
    }

    #[test]
    fn test_devices_from_path_and_query() {
        let backend = PushoverBackend::new();
        let args = args_for(&backend, &format!("pover://{USER}@{TOKEN}/phone/tablet?to=laptop&priority=2"));
        let notifier = backend.notifier(&args, &HttpSettings::default()).unwrap();

        assert_eq!(notifier.priority, 2);
        assert_eq!(
            notifier.devices.iter().map(Recipient::id).collect::<Vec<_>>(),
            vec!["phone", "tablet", "laptop"]
        );
    }

    #[test]
    fn test_priority_out_of_range_is_normal() {
        let backend = PushoverBackend::new();
        let args = args_for(&backend, &format!("pover://{USER}@{TOKEN}?priority=9"));
        let notifier = backend.notifier(&args, &HttpSettings::default()).unwrap();
        assert_eq!(notifier.priority, 0);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let backend = PushoverBackend::new();
        let args = args_for(&backend, &format!("pover://{USER}@short"));
        let err = backend.notifier(&args, &HttpSettings::default()).err().unwrap();
        assert!(matches!(
            err,
            NotifyError::Validation(ValidationError::Invalid { ref field, .. }) if field == "token"
        ));
    }

    #[test]
    fn test_missing_user_named() {
        let backend = PushoverBackend::new();
        let target = crate::target::decompose(&format!("pover://{TOKEN}"), "unknown").unwrap();
        let err = crate::registry::extract(backend.descriptor(), &target).unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(vec!["user".to_string()]));
    }

    #[test]
    fn test_form_per_device() {
        let backend = PushoverBackend::new();
        let args = args_for(&backend, &format!("pover://{USER}@{TOKEN}/phone"));
        let notifier = backend.notifier(&args, &HttpSettings::default()).unwrap();

        let form = notifier.form(&message(), notifier.devices.first()).unwrap();
        assert!(form.contains(&("device", "phone".to_string())));
        assert!(form.contains(&("token", TOKEN.to_string())));

        let broadcast = notifier.form(&message(), None).unwrap();
        assert!(!broadcast.iter().any(|(k, _)| *k == "device"));

        let bad = Recipient::Device("not a device!".to_string());
        assert!(notifier.form(&message(), Some(&bad)).is_err());
    }
}
