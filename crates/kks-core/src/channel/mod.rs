//! Control channels: one-way delivery of rendered messages to a session.
//!
//! A channel is opened and closed per message and never acknowledges what it
//! delivered. Anything that needs an answer goes through the query path.

mod fifo;
mod pipe;

pub use fifo::FifoChannel;
pub use pipe::PipeChannel;

use crate::error::Result;

/// Transport that delivers one message to one session
pub trait Channel: Send + Sync {
    /// Deliver a rendered message. Failures are reported as-is; retrying is
    /// the caller's decision.
    fn deliver(&self, session: &str, message: &str) -> Result<()>;
}
