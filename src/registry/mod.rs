//! Scheme registry and argument mapping
//!
//! Each backend registers one [`NotifierDescriptor`] describing how the generic
//! [`TargetUrl`](crate::target::TargetUrl) fields map onto its arguments. The
//! registry resolves a scheme (including the generic secure `…s` variant) and
//! [`extract`] turns a decomposed target into an [`ArgumentSet`].
//!
//! ## Key Components
//!
//! - [`Backend`] - Trait every notification backend implements
//! - [`SchemaRegistry`] - Scheme to backend table
//! - [`NotifierDescriptor`] - Field and recipient rules for one scheme
//! - [`ArgumentSet`] - Arguments handed to [`Backend::build`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use notifybox::registry::SchemaRegistry;
//! use notifybox::target::decompose;
//!
//! let registry = SchemaRegistry::with_defaults();
//! let target = decompose("pbul://token/#alerts", "unknown")?;
//! let resolution = registry.resolve(&target.scheme)?;
//! let args = registry.extract(&resolution, &target)?;
//! ```

mod extract;
mod registry;
mod traits;
pub(crate) mod types;

pub use extract::{ValidationError, extract, is_secure_variant, split_segments};
pub use registry::{RegistryError, Resolution, SchemaRegistry};
pub use traits::Backend;
pub use types::{
    ArgumentSet, FieldRule, FieldSource, NotifierDescriptor, Recipient, RecipientPolicy,
    Requirement,
};
