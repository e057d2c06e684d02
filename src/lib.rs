pub mod backends;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod humanize;
pub mod notifier;
pub mod observability;
pub mod registry;
pub mod request;
pub mod target;
