use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::notifier::{
    HttpSettings, HttpTransport, ImageSize, Message, Notifier, NotifierProfile, NotifyError,
};
use crate::registry::{
    ArgumentSet, Backend, FieldRule, FieldSource, NotifierDescriptor, Recipient, ValidationError,
};
use crate::request::NotifyType;

/// Plain JSON webhook: `json://[user:pass@]host[:port][/path]`, `jsons://` for TLS
pub struct JsonBackend {
    descriptor: NotifierDescriptor,
}

impl JsonBackend {
    pub fn new() -> Self {
        Self {
            descriptor: NotifierDescriptor::new("json", "json")
                .secure_variant()
                .field(FieldRule::required("host", FieldSource::Host)),
        }
    }

    fn notifier(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<JsonNotifier, NotifyError> {
        let scheme = if args.secure { "https" } else { "http" };
        let authority = match args.port {
            Some(port) => format!("{}:{}", args.host, port),
            None => args.host.clone(),
        };

        let mut url = Url::parse(&format!("{}://{}", scheme, authority))
            .map_err(|e| ValidationError::invalid("host", e.to_string()))?;
        url.set_path(if args.path.is_empty() { "/" } else { &args.path });

        Ok(JsonNotifier {
            transport: HttpTransport::new(http, "json", args.verify)?,
            url,
            user: args.user.clone(),
            password: args.password.clone(),
        })
    }
}

impl Default for JsonBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for JsonBackend {
    fn descriptor(&self) -> &NotifierDescriptor {
        &self.descriptor
    }

    fn build(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<Box<dyn Notifier>, NotifyError> {
        Ok(Box::new(self.notifier(args, http)?))
    }
}

#[derive(Debug, Serialize)]
struct JsonPayload<'a> {
    version: &'static str,
    title: &'a str,
    message: &'a str,
    #[serde(rename = "type")]
    notify_type: NotifyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

struct JsonNotifier {
    transport: HttpTransport,
    url: Url,
    user: Option<String>,
    password: Option<String>,
}

impl JsonNotifier {
    fn payload<'a>(&self, message: &'a Message) -> JsonPayload<'a> {
        JsonPayload {
            version: "1.0",
            title: &message.title,
            message: &message.body,
            notify_type: message.notify_type,
            image: message.image_url(),
        }
    }
}

#[async_trait]
impl Notifier for JsonNotifier {
    fn profile(&self) -> NotifierProfile {
        NotifierProfile {
            image_size: Some(ImageSize::Xy72),
            ..NotifierProfile::default()
        }
    }

    async fn send(&self, message: &Message, _recipient: Option<&Recipient>) -> Result<(), NotifyError> {
        debug!(url = %self.url, "JSON POST");

        let mut request = self.transport.post(self.url.as_str()).json(&self.payload(message));
        if self.user.is_some() || self.password.is_some() {
            request = request.basic_auth(self.user.as_deref().unwrap_or(""), self.password.as_deref());
        }

        self.transport.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::args_for;
    use crate::request::BodyFormat;

    fn message() -> Message {
        Message {
            title: "Done".to_string(),
            body: "Job finished".to_string(),
            notify_type: NotifyType::Success,
            format: BodyFormat::Text,
            image: None,
        }
    }

    #[test]
    fn test_url_from_target() {
        let backend = JsonBackend::new();
        let args = args_for(&backend, "jsons://alice:pw@hooks.local:8443/a/b c");
        let notifier = backend.notifier(&args, &HttpSettings::default()).unwrap();

        assert_eq!(notifier.url.as_str(), "https://hooks.local:8443/a/b%20c");
        assert_eq!(notifier.user.as_deref(), Some("alice"));
        assert_eq!(notifier.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_plain_scheme_uses_http_root() {
        let backend = JsonBackend::new();
        let args = args_for(&backend, "json://localhost");
        let notifier = backend.notifier(&args, &HttpSettings::default()).unwrap();

        assert_eq!(notifier.url.as_str(), "http://localhost/");
    }

    #[test]
    fn test_payload_shape() {
        let backend = JsonBackend::new();
        let args = args_for(&backend, "json://localhost");
        let notifier = backend.notifier(&args, &HttpSettings::default()).unwrap();

        let value = serde_json::to_value(notifier.payload(&message())).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "version": "1.0",
                "title": "Done",
                "message": "Job finished",
                "type": "success",
            })
        );
    }
}
