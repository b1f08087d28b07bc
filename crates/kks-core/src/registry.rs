use std::time::Duration;

use serde::Serialize;

use crate::context::Context;
use crate::error::Result;
use crate::query::Retriever;
use crate::runtime::RuntimeDir;

/// A live session as reported by `list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub name: String,
    pub clients: Vec<String>,
    /// Working directory of the session, when it answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Why clients or dir could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Enumerates live sessions and asks them about their clients
#[derive(Clone, Copy)]
pub struct SessionRegistry<'a> {
    runtime: &'a RuntimeDir,
    retriever: Retriever<'a>,
    timeout: Duration,
}

impl<'a> SessionRegistry<'a> {
    pub fn new(runtime: &'a RuntimeDir, retriever: Retriever<'a>, timeout: Duration) -> Self {
        Self {
            runtime,
            retriever,
            timeout,
        }
    }

    /// Names of live sessions, sorted. Stale runtime entries left by crashed
    /// editors are skipped.
    pub fn sessions(&self) -> Result<Vec<String>> {
        let sessions: Vec<String> = self
            .runtime
            .entries()?
            .into_iter()
            .filter(|name| {
                let live = self.runtime.is_live(name);
                if !live {
                    tracing::debug!("Skipping stale session entry {}", name);
                }
                live
            })
            .collect();
        Ok(sessions)
    }

    pub fn contains(&self, session: &str) -> bool {
        !session.is_empty() && self.runtime.is_live(session)
    }

    /// Clients currently attached to `session`
    pub fn clients(&self, session: &str) -> Result<Vec<String>> {
        let clients = self.retriever.query(
            "%val{client_list}",
            "",
            &Context::new(session, ""),
            self.timeout,
        )?;
        Ok(clients.into_iter().filter(|c| !c.is_empty()).collect())
    }

    /// Working directory of `session`
    pub fn dir(&self, session: &str) -> Result<String> {
        let values = self
            .retriever
            .query("%sh{pwd}", "", &Context::new(session, ""), self.timeout)?;
        Ok(values.into_iter().next().unwrap_or_default())
    }

    /// Every live session with its clients and working directory. A session
    /// that fails to answer is still listed, with the error recorded.
    pub fn list(&self) -> Result<Vec<Session>> {
        let sessions = self.sessions()?;
        let mut listed = Vec::with_capacity(sessions.len());

        for name in sessions {
            let mut session = Session {
                name,
                clients: Vec::new(),
                dir: None,
                error: None,
            };
            match self
                .clients(&session.name)
                .and_then(|clients| Ok((clients, self.dir(&session.name)?)))
            {
                Ok((clients, dir)) => {
                    session.clients = clients;
                    session.dir = Some(dir);
                }
                Err(e) => {
                    tracing::warn!("Session {} did not answer: {}", session.name, e);
                    session.error = Some(e.to_string());
                }
            }
            listed.push(session);
        }

        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::SimulatedEditor;
    use crate::error::KakError;
    use crate::runtime::testing::FakeRuntime;
    use pretty_assertions::assert_eq;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn answers(session: &str, message: &str) -> Option<String> {
        if message.contains("%val{client_list}") {
            Some(match session {
                "idle" => String::new(),
                _ => "'client0' 'client1'".to_string(),
            })
        } else if message.contains("%sh{pwd}") {
            Some(format!("'/home/user/{}'", session))
        } else {
            None
        }
    }

    #[test]
    fn test_sessions_skip_stale_entries() {
        let mut fake = FakeRuntime::new();
        fake.add_live("work").add_stale("crashed").add_live("notes");
        let runtime = fake.runtime();
        let editor = SimulatedEditor::new();
        let registry = SessionRegistry::new(&runtime, Retriever::new(&editor, None), TIMEOUT);

        assert_eq!(registry.sessions().unwrap(), vec!["notes", "work"]);
        assert!(registry.contains("work"));
        assert!(!registry.contains("crashed"));
        assert!(!registry.contains(""));
    }

    #[test]
    fn test_sessions_missing_runtime_dir() {
        let runtime = RuntimeDir::new("/nonexistent/kakoune");
        let editor = SimulatedEditor::new();
        let registry = SessionRegistry::new(&runtime, Retriever::new(&editor, None), TIMEOUT);

        let err = registry.sessions().unwrap_err();
        assert!(matches!(err, KakError::RuntimeUnavailable { .. }));
    }

    #[test]
    fn test_clients_and_dir() {
        let mut fake = FakeRuntime::new();
        fake.add_live("work").add_live("idle");
        let runtime = fake.runtime();
        let editor = SimulatedEditor::responding(answers);
        let registry = SessionRegistry::new(
            &runtime,
            Retriever::new(&editor, Some(fake.dir.path())),
            TIMEOUT,
        );

        assert_eq!(registry.clients("work").unwrap(), vec!["client0", "client1"]);
        assert!(registry.clients("idle").unwrap().is_empty());
        assert_eq!(registry.dir("work").unwrap(), "/home/user/work");
    }

    #[test]
    fn test_list_records_per_session_errors() {
        let mut fake = FakeRuntime::new();
        fake.add_live("broken").add_live("work");
        let runtime = fake.runtime();
        let editor = SimulatedEditor::responding(answers).with_broken("broken");
        let registry = SessionRegistry::new(
            &runtime,
            Retriever::new(&editor, Some(fake.dir.path())),
            TIMEOUT,
        );

        let sessions = registry.list().unwrap();
        assert_eq!(sessions.len(), 2);

        assert_eq!(sessions[0].name, "broken");
        assert!(sessions[0].clients.is_empty());
        assert!(sessions[0].error.is_some());

        assert_eq!(
            sessions[1],
            Session {
                name: "work".to_string(),
                clients: vec!["client0".to_string(), "client1".to_string()],
                dir: Some("/home/user/work".to_string()),
                error: None,
            }
        );
    }

    #[test]
    fn test_session_json_omits_empty_fields() {
        let session = Session {
            name: "work".to_string(),
            clients: vec!["client0".to_string()],
            dir: None,
            error: None,
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "work", "clients": ["client0"] })
        );
    }
}
