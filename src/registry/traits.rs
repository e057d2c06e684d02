use crate::notifier::{HttpSettings, Notifier, NotifyError};

use super::types::{ArgumentSet, NotifierDescriptor};

/// A notification backend registered under one scheme
///
/// The descriptor drives argument extraction; `build` turns the extracted
/// arguments into a ready-to-send notifier, validating backend-specific
/// formats along the way.
pub trait Backend: Send + Sync {
    fn descriptor(&self) -> &NotifierDescriptor;

    fn build(
        &self,
        args: &ArgumentSet,
        http: &HttpSettings,
    ) -> Result<Box<dyn Notifier>, NotifyError>;
}
