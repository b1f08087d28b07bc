//! KksCore, the entry point the CLI (or any other front end) talks to.
//!
//! It owns the settings, runtime directory, transport and ambient provider,
//! and hands out short-lived components borrowing them.

use std::sync::Arc;

use crate::channel::Channel;
use crate::config::Settings;
use crate::context::{AmbientContextProvider, ContextResolver};
use crate::dispatch::Dispatcher;
use crate::lifecycle::Lifecycle;
use crate::query::Retriever;
use crate::registry::SessionRegistry;
use crate::runtime::RuntimeDir;

/// Constructed via [`KksCoreBuilder`](super::builder::KksCoreBuilder).
pub struct KksCore {
    settings: Arc<Settings>,
    runtime: RuntimeDir,
    channel: Arc<dyn Channel>,
    ambient: Arc<dyn AmbientContextProvider>,
}

impl KksCore {
    pub(crate) fn new(
        settings: Arc<Settings>,
        runtime: RuntimeDir,
        channel: Arc<dyn Channel>,
        ambient: Arc<dyn AmbientContextProvider>,
    ) -> Self {
        Self {
            settings,
            runtime,
            channel,
            ambient,
        }
    }

    /// Effective settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runtime directory holding the session entries
    pub fn runtime(&self) -> &RuntimeDir {
        &self.runtime
    }

    /// Fire-and-forget command delivery over the configured transport
    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(self.channel.as_ref())
    }

    /// Query delivery with results read back through a temporary pipe
    pub fn retriever(&self) -> Retriever<'_> {
        Retriever::new(self.channel.as_ref(), self.settings.temp_dir.as_deref())
    }

    /// Live sessions and their clients
    pub fn registry(&self) -> SessionRegistry<'_> {
        SessionRegistry::new(&self.runtime, self.retriever(), self.settings.query_timeout())
    }

    /// Target resolution from flags, environment and ambient markers
    pub fn resolver(&self) -> ContextResolver<'_> {
        ContextResolver::new(self.registry(), self.ambient.as_ref())
    }

    /// Session creation, termination and attaching
    pub fn lifecycle(&self) -> Lifecycle<'_> {
        Lifecycle::new(&self.settings, &self.runtime, self.dispatcher(), self.registry())
    }
}
