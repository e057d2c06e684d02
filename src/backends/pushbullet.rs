use async_trait::async_trait;
use serde::Serialize;

use crate::notifier::{HttpSettings, HttpTransport, Message, Notifier, NotifierProfile, NotifyError};
use crate::registry::{
    ArgumentSet, Backend, FieldRule, FieldSource, NotifierDescriptor, Recipient, RecipientPolicy,
};

const PUSHBULLET_URL: &str = "https://api.pushbullet.com/v2/pushes";

/// Pushbullet: `pbul://accesstoken[/#channel|/email|/device...]`
pub struct PushbulletBackend {
    descriptor: NotifierDescriptor,
}

impl PushbulletBackend {
    pub fn new() -> Self {
        Self {
            descriptor: NotifierDescriptor::new("pbul", "pushbullet")
                .field(FieldRule::required("accesstoken", FieldSource::Host))
                .recipients(RecipientPolicy {
                    query_key: Some("to"),
                    classify: true,
                    ..RecipientPolicy::default()
                }),
        }
    }

    fn notifier(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<PushbulletNotifier, NotifyError> {
        Ok(PushbulletNotifier {
            transport: HttpTransport::new(http, "pushbullet", args.verify)?,
            accesstoken: args.require("accesstoken")?.to_string(),
            recipients: args.recipients.clone(),
        })
    }
}

impl Default for PushbulletBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for PushbulletBackend {
    fn descriptor(&self) -> &NotifierDescriptor {
        &self.descriptor
    }

    fn build(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<Box<dyn Notifier>, NotifyError> {
        Ok(Box::new(self.notifier(args, http)?))
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct PushPayload<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_tag: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_iden: Option<&'a str>,
}

struct PushbulletNotifier {
    transport: HttpTransport,
    accesstoken: String,
    recipients: Vec<Recipient>,
}

fn payload<'a>(message: &'a Message, recipient: Option<&'a Recipient>) -> PushPayload<'a> {
    let mut payload = PushPayload {
        kind: "note",
        title: &message.title,
        body: &message.body,
        email: None,
        channel_tag: None,
        device_iden: None,
    };

    match recipient {
        Some(Recipient::Email(email)) => payload.email = Some(email),
        Some(Recipient::Channel(channel)) => payload.channel_tag = Some(channel),
        Some(Recipient::Device(device)) => payload.device_iden = Some(device),
        None => {}
    }

    payload
}

#[async_trait]
impl Notifier for PushbulletNotifier {
    fn profile(&self) -> NotifierProfile {
        NotifierProfile::default()
    }

    fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    async fn send(&self, message: &Message, recipient: Option<&Recipient>) -> Result<(), NotifyError> {
        let request = self
            .transport
            .post(PUSHBULLET_URL)
            .basic_auth(&self.accesstoken, Some(""))
            .json(&payload(message, recipient));

        self.transport.execute(request).await?;
        Ok(())
    }
}
