use async_trait::async_trait;

use crate::notifier::{HttpSettings, HttpTransport, Message, Notifier, NotifierProfile, NotifyError};
use crate::registry::{
    ArgumentSet, Backend, FieldRule, FieldSource, NotifierDescriptor, Recipient, ValidationError,
};

const PROWL_URL: &str = "https://api.prowlapp.com/publicapi/add";

const PROWL_APPLICATION: &str = "NotifyBox";

const PROWL_STATUS_OVERRIDES: &[(u16, &str)] = &[
    (400, "Bad Request; Unsupported Parameters"),
    (401, "Verification Failed"),
    (406, "IP address has exceeded API limit"),
    (409, "Request not approved."),
    (500, "Internal server error."),
];

/// Prowl: `prowl://apikey[/providerkey][?priority=N]`
pub struct ProwlBackend {
    descriptor: NotifierDescriptor,
}

impl ProwlBackend {
    pub fn new() -> Self {
        Self {
            descriptor: NotifierDescriptor::new("prowl", "prowl")
                .field(FieldRule::required("apikey", FieldSource::Host))
                .field(FieldRule::optional("providerkey", FieldSource::Segment(0)).or_query("providerkey"))
                .field(FieldRule::optional("priority", FieldSource::Query("priority")).with_default("0")),
        }
    }

    fn notifier(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<ProwlNotifier, NotifyError> {
        let apikey = args.require("apikey")?;
        if !apikey.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::invalid("apikey", format!("'{}' is not a Prowl API key", apikey)).into());
        }

        Ok(ProwlNotifier {
            transport: HttpTransport::new(http, "prowl", args.verify)?
                .with_status_overrides(PROWL_STATUS_OVERRIDES),
            apikey: apikey.to_string(),
            providerkey: args.field("providerkey").map(str::to_string),
            priority: super::priority(args),
        })
    }
}

impl Default for ProwlBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for ProwlBackend {
    fn descriptor(&self) -> &NotifierDescriptor {
        &self.descriptor
    }

    fn build(&self, args: &ArgumentSet, http: &HttpSettings) -> Result<Box<dyn Notifier>, NotifyError> {
        Ok(Box::new(self.notifier(args, http)?))
    }
}

struct ProwlNotifier {
    transport: HttpTransport,
    apikey: String,
    providerkey: Option<String>,
    priority: i8,
}

impl ProwlNotifier {
    fn form(&self, message: &Message) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("apikey", self.apikey.clone()),
            ("application", PROWL_APPLICATION.to_string()),
            ("event", message.title.clone()),
            ("description", message.body.clone()),
            ("priority", self.priority.to_string()),
        ];

        if let Some(providerkey) = &self.providerkey {
            form.push(("providerkey", providerkey.clone()));
        }
        if let Some(url) = message.image_url() {
            form.push(("url", url.to_string()));
        }

        form
    }
}

#[async_trait]
impl Notifier for ProwlNotifier {
    fn profile(&self) -> NotifierProfile {
        NotifierProfile {
            title_maxlen: 1024,
            body_maxlen: 10000,
            ..NotifierProfile::default()
        }
    }

    async fn send(&self, message: &Message, _recipient: Option<&Recipient>) -> Result<(), NotifyError> {
        let request = self.transport.post(PROWL_URL).form(&self.form(message));
        self.transport.execute(request).await?;
        Ok(())
    }
}
