//! Public API layer (Facade) for kks-core.
//!
//! [`KksCore`] bundles the settings, runtime directory, transport and
//! ambient context provider, and exposes one method per user-facing
//! operation. Front ends should go through it rather than wiring the
//! components themselves.
//!
//! ```ignore
//! use kks_core::api::KksCoreBuilder;
//!
//! let core = KksCoreBuilder::new(settings).build();
//! let context = core.require("", "")?;
//! let buffers = core.get(&context, "%val{buflist}")?;
//! ```

mod actions;
mod builder;
mod core;

pub use actions::EditOutcome;
pub use builder::KksCoreBuilder;
pub use core::KksCore;
