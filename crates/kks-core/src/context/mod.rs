//! Resolution of the (session, client, buffer) a command targets.

mod ambient;

pub use ambient::{
    AmbientContext, AmbientContextProvider, FixedAmbient, NoAmbient, ProcessAmbient,
};

use serde::Serialize;

use crate::error::{KakError, Result};
use crate::registry::SessionRegistry;

/// Environment variable naming the target session
pub const SESSION_VAR: &str = "KKS_SESSION";
/// Environment variable naming the target client
pub const CLIENT_VAR: &str = "KKS_CLIENT";

/// Target of a command. Empty strings mean "not specified".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Context {
    pub session: String,
    pub client: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub buffer: String,
}

impl Context {
    pub fn new(session: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            client: client.into(),
            buffer: String::new(),
        }
    }

    pub fn with_buffer(mut self, buffer: impl Into<String>) -> Self {
        self.buffer = buffer.into();
        self
    }
}

/// Picks the target from flags, environment and ambient markers, and
/// checks it against the live sessions
#[derive(Clone, Copy)]
pub struct ContextResolver<'a> {
    registry: SessionRegistry<'a>,
    ambient: &'a dyn AmbientContextProvider,
}

impl<'a> ContextResolver<'a> {
    pub fn new(registry: SessionRegistry<'a>, ambient: &'a dyn AmbientContextProvider) -> Self {
        Self { registry, ambient }
    }

    /// Resolve each field independently: explicit value, then `KKS_SESSION`
    /// / `KKS_CLIENT`, then the ambient context, else empty.
    pub fn resolve(&self, session: &str, client: &str) -> Context {
        let mut ambient = None;
        let mut detected = || ambient.get_or_insert_with(|| self.ambient.detect()).clone();

        let session = pick(session, SESSION_VAR).unwrap_or_else(|| {
            detected().session.unwrap_or_default()
        });
        let client = pick(client, CLIENT_VAR).unwrap_or_else(|| {
            detected().client.unwrap_or_default()
        });

        tracing::debug!("Resolved context session={:?} client={:?}", session, client);
        Context::new(session, client)
    }

    /// Check that the context names a live session and, when a client is
    /// given, that the client is connected to it.
    pub fn exists(&self, context: &Context) -> Result<()> {
        if context.session.is_empty() {
            return Err(KakError::NoSession);
        }
        if !self.registry.contains(&context.session) {
            return Err(KakError::SessionNotFound {
                session: context.session.clone(),
            });
        }
        if !context.client.is_empty()
            && !self
                .registry
                .clients(&context.session)?
                .contains(&context.client)
        {
            return Err(KakError::ClientNotFound {
                session: context.session.clone(),
                client: context.client.clone(),
            });
        }
        Ok(())
    }
}

fn pick(explicit: &str, var: &str) -> Option<String> {
    if !explicit.is_empty() {
        return Some(explicit.to_string());
    }
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::SimulatedEditor;
    use crate::query::Retriever;
    use crate::runtime::testing::FakeRuntime;
    use crate::runtime::RuntimeDir;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn unset_env<R>(f: impl FnOnce() -> R) -> R {
        temp_env::with_vars_unset([SESSION_VAR, CLIENT_VAR], f)
    }

    fn resolve_with(
        ambient: &dyn AmbientContextProvider,
        session: &str,
        client: &str,
    ) -> Context {
        let runtime = RuntimeDir::new("/nonexistent");
        let editor = SimulatedEditor::new();
        let registry = SessionRegistry::new(&runtime, Retriever::new(&editor, None), TIMEOUT);
        ContextResolver::new(registry, ambient).resolve(session, client)
    }

    #[test]
    fn test_resolve_explicit_wins() {
        temp_env::with_vars(
            [(SESSION_VAR, Some("env-session")), (CLIENT_VAR, Some("env-client"))],
            || {
                let ambient = FixedAmbient::new(Some("amb"), Some("amb-client"));
                assert_eq!(
                    resolve_with(&ambient, "flag", "flag-client"),
                    Context::new("flag", "flag-client")
                );
            },
        );
    }

    #[test]
    fn test_resolve_env_over_ambient() {
        temp_env::with_vars(
            [(SESSION_VAR, Some("env-session")), (CLIENT_VAR, None)],
            || {
                let ambient = FixedAmbient::new(Some("amb"), Some("amb-client"));
                // Per field: the client still comes from the ambient context
                assert_eq!(
                    resolve_with(&ambient, "", ""),
                    Context::new("env-session", "amb-client")
                );
            },
        );
    }

    #[test]
    fn test_resolve_empty_env_is_unset() {
        temp_env::with_vars([(SESSION_VAR, Some("")), (CLIENT_VAR, Some(""))], || {
            let ambient = FixedAmbient::new(Some("amb"), None);
            assert_eq!(resolve_with(&ambient, "", ""), Context::new("amb", ""));
        });
    }

    #[test]
    fn test_resolve_nothing_found() {
        unset_env(|| {
            assert_eq!(resolve_with(&NoAmbient, "", ""), Context::default());
        });
    }

    #[test]
    fn test_resolve_explicit_client_with_ambient_session() {
        unset_env(|| {
            let ambient = FixedAmbient::new(Some("amb"), Some("amb-client"));
            assert_eq!(
                resolve_with(&ambient, "", "other"),
                Context::new("amb", "other")
            );
        });
    }

    fn with_resolver(test: impl FnOnce(ContextResolver<'_>)) {
        let mut fake = FakeRuntime::new();
        fake.add_live("work").add_stale("crashed");
        let runtime = fake.runtime();
        let editor = SimulatedEditor::responding(|_, message| {
            message
                .contains("%val{client_list}")
                .then(|| "'client0'".to_string())
        });
        let registry = SessionRegistry::new(
            &runtime,
            Retriever::new(&editor, Some(fake.dir.path())),
            TIMEOUT,
        );
        test(ContextResolver::new(registry, &NoAmbient));
    }

    #[test]
    fn test_exists_accepts_live_session_and_client() {
        with_resolver(|resolver| {
            resolver.exists(&Context::new("work", "")).unwrap();
            resolver.exists(&Context::new("work", "client0")).unwrap();
        });
    }

    #[test]
    fn test_exists_failures_are_not_found() {
        with_resolver(|resolver| {
            let no_session = resolver.exists(&Context::default()).unwrap_err();
            assert!(matches!(no_session, KakError::NoSession));

            let stale = resolver.exists(&Context::new("crashed", "")).unwrap_err();
            assert!(matches!(stale, KakError::SessionNotFound { .. }));

            let missing = resolver.exists(&Context::new("nope", "")).unwrap_err();
            assert!(matches!(missing, KakError::SessionNotFound { .. }));

            let client = resolver
                .exists(&Context::new("work", "client9"))
                .unwrap_err();
            assert!(matches!(client, KakError::ClientNotFound { .. }));

            for err in [no_session, stale, missing, client] {
                assert!(err.is_not_found(), "{} should be not-found", err);
            }
        });
    }

    #[test]
    fn test_context_json() {
        let json = serde_json::to_value(Context::new("work", "client0")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "session": "work", "client": "client0" })
        );
    }
}
