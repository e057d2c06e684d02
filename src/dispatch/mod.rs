//! Multi-target dispatch
//!
//! A batch walks each raw target through
//! `decompose -> resolve -> extract -> build -> notify`, strictly in order and
//! one outbound call at a time. Each target ends in exactly one
//! [`DeliveryResult`]; a failing target never stops the batch.

mod dispatcher;
mod result;
mod targets;

pub use dispatcher::{DispatchError, DispatchSettings, Dispatcher};
pub use result::{BatchReport, DeliveryResult, TargetState};
pub use targets::Targets;
