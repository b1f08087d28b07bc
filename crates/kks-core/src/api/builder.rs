//! Builder for constructing a [`KksCore`] instance.
//!
//! ```ignore
//! let core = KksCoreBuilder::new(settings)
//!     .with_runtime_dir(RuntimeDir::new("/run/user/1000/kakoune"))
//!     .with_ambient(Arc::new(NoAmbient))
//!     .build();
//! ```

use std::sync::Arc;

use crate::channel::{Channel, FifoChannel, PipeChannel};
use crate::config::{Settings, TransportKind};
use crate::context::{AmbientContextProvider, ProcessAmbient};
use crate::runtime::RuntimeDir;

use super::core::KksCore;

/// Assembles a [`KksCore`] from settings plus optional overrides
pub struct KksCoreBuilder {
    settings: Arc<Settings>,
    runtime: Option<RuntimeDir>,
    channel: Option<Arc<dyn Channel>>,
    ambient: Option<Arc<dyn AmbientContextProvider>>,
}

impl KksCoreBuilder {
    /// Start from owned settings
    pub fn new(settings: Settings) -> Self {
        Self::from_shared_settings(Arc::new(settings))
    }

    /// Start from settings shared with the caller
    pub fn from_shared_settings(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            runtime: None,
            channel: None,
            ambient: None,
        }
    }

    /// Use this runtime directory instead of discovering one
    pub fn with_runtime_dir(mut self, runtime: RuntimeDir) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Override the transport selected by `settings.transport`
    pub fn with_channel(mut self, channel: Arc<dyn Channel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Override ambient context detection
    pub fn with_ambient(mut self, ambient: Arc<dyn AmbientContextProvider>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    /// Missing parts default to the discovered runtime directory, the
    /// configured transport and process-environment detection.
    pub fn build(self) -> KksCore {
        let runtime = self
            .runtime
            .unwrap_or_else(|| RuntimeDir::discover(self.settings.runtime_dir.as_deref()));

        let channel: Arc<dyn Channel> = match self.channel {
            Some(channel) => channel,
            None => match self.settings.transport {
                TransportKind::Pipe => Arc::new(PipeChannel::new(self.settings.editor.clone())),
                TransportKind::Fifo => Arc::new(FifoChannel::new(runtime.clone())),
            },
        };

        let ambient: Arc<dyn AmbientContextProvider> = match self.ambient {
            Some(ambient) => ambient,
            None => Arc::new(ProcessAmbient::new()),
        };

        tracing::debug!(
            "Runtime directory {} via {:?} transport",
            runtime.path().display(),
            self.settings.transport
        );
        KksCore::new(self.settings, runtime, channel, ambient)
    }
}
