mod cli;

pub use cli::{Command, Config, Target, Transport};
pub use kks_core::config::{Settings, TransportKind};
