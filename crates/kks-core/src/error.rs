//! Error type shared by every kks-core component.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout kks-core
pub type Result<T> = std::result::Result<T, KakError>;

/// Errors surfaced by session discovery, dispatch and queries.
///
/// Callers decide the exit policy; nothing in the core retries on its own
/// except the bounded readiness poll in session creation.
#[derive(Debug, Error)]
pub enum KakError {
    /// The editor runtime directory is missing or unreadable
    #[error("no Kakoune runtime available at {}: {source}", path.display())]
    RuntimeUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No session was given by flag, environment or ambient context
    #[error("no session: pass -s or set KKS_SESSION")]
    NoSession,

    /// The resolved session is not live
    #[error("session not found: {session}")]
    SessionNotFound { session: String },

    /// The session is live but the client is not attached to it
    #[error("client not found in session {session}: {client}")]
    ClientNotFound { session: String, client: String },

    /// A session with this name is already running
    #[error("session already exists: {session}")]
    SessionExists { session: String },

    /// Session name contains characters the runtime directory cannot hold
    #[error("invalid session name: {name:?}")]
    InvalidName { name: String },

    /// The control channel has no reader any more
    #[error("session {session} is gone: {source}")]
    SessionGone {
        session: String,
        #[source]
        source: std::io::Error,
    },

    /// The editor rejected the delivered message
    #[error("dispatch to session {session} failed: {message}")]
    DispatchFailed { session: String, message: String },

    /// The editor accepted a query but never produced its result
    #[error("no response from session {session} within {timeout:?}")]
    QueryTimeout { session: String, timeout: Duration },

    /// An edit target could not be parsed into name/line/column
    #[error("malformed target {input:?}: {reason}")]
    MalformedTarget { input: String, reason: &'static str },

    /// The editor process could not be started
    #[error("failed to start {editor}: {source}")]
    SpawnFailed {
        editor: String,
        #[source]
        source: std::io::Error,
    },

    /// The editor was started but its control channel never appeared
    #[error("session {session} did not come up after {attempts} attempts")]
    SessionStartTimeout { session: String, attempts: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KakError {
    /// Whether this error means the target does not exist (as opposed to an
    /// I/O or protocol failure). Edit and attach flows fall back to creating
    /// a session on these.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            KakError::NoSession
                | KakError::SessionNotFound { .. }
                | KakError::ClientNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(KakError::NoSession.is_not_found());
        assert!(KakError::SessionNotFound {
            session: "a".into()
        }
        .is_not_found());
        assert!(KakError::ClientNotFound {
            session: "a".into(),
            client: "c".into()
        }
        .is_not_found());
        assert!(!KakError::DispatchFailed {
            session: "a".into(),
            message: "boom".into()
        }
        .is_not_found());
    }

    #[test]
    fn test_messages_name_the_target() {
        let err = KakError::ClientNotFound {
            session: "work".into(),
            client: "main".into(),
        };
        assert_eq!(err.to_string(), "client not found in session work: main");
    }
}
