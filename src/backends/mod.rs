//! Bundled notification backends
//!
//! Each backend pairs a [`Backend`](crate::registry::Backend) (descriptor plus
//! factory) with a [`Notifier`](crate::notifier::Notifier) that builds one
//! service-specific request per recipient.

mod json;
mod prowl;
mod pushbullet;
mod pushover;
mod telegram;

pub use json::JsonBackend;
pub use prowl::ProwlBackend;
pub use pushbullet::PushbulletBackend;
pub use pushover::PushoverBackend;
pub use telegram::TelegramBackend;

use std::sync::Arc;

use crate::registry::SchemaRegistry;

/// Register every bundled backend
pub fn register_defaults(registry: &mut SchemaRegistry) {
    registry.register(Arc::new(JsonBackend::new()));
    registry.register(Arc::new(PushoverBackend::new()));
    registry.register(Arc::new(TelegramBackend::new()));
    registry.register(Arc::new(PushbulletBackend::new()));
    registry.register(Arc::new(ProwlBackend::new()));
}

/// Clamp a `priority` field into `-2..=2`, falling back to normal
fn priority(args: &crate::registry::ArgumentSet) -> i8 {
    match args.field("priority").map(|p| p.trim().parse::<i8>()) {
        Some(Ok(p)) if (-2..=2).contains(&p) => p,
        Some(_) => {
            tracing::warn!(
                backend = args.backend,
                priority = args.field("priority"),
                "Unsupported priority, using normal"
            );
            0
        }
        None => 0,
    }
}
