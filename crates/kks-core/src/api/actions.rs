//! High-level operations behind each CLI subcommand.

use crate::command::quote;
use crate::context::Context;
use crate::dispatch::FanoutReport;
use crate::error::{KakError, Result};
use crate::filepath::Filepath;
use crate::registry::Session;

use super::core::KksCore;

/// Result of [`KksCore::edit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The file was opened in the running client
    Opened,
    /// There is no client to open it in; attach a new one to this session
    Attach { session: String },
}

impl KksCore {
    /// Resolve the target from flags, environment and ambient markers
    pub fn resolve(&self, session: &str, client: &str) -> Context {
        self.resolver().resolve(session, client)
    }

    /// Resolve the target and require it to exist
    pub fn require(&self, session: &str, client: &str) -> Result<Context> {
        let context = self.resolve(session, client);
        self.resolver().exists(&context)?;
        Ok(context)
    }

    /// Deliver `command` to the context's session, client and buffer
    pub fn send(&self, context: &Context, command: &str) -> Result<()> {
        self.dispatcher()
            .send(command, &context.buffer, &context.session, &context.client)
    }

    /// Send to every client of every live session
    pub fn send_all(&self, command: &str) -> Result<FanoutReport> {
        self.dispatcher().send_all(&self.registry(), command)
    }

    /// Values of a Kakoune expression such as `%val{buflist}`
    pub fn get(&self, context: &Context, expression: &str) -> Result<Vec<String>> {
        self.retriever().query(
            expression,
            &context.buffer,
            context,
            self.settings().query_timeout(),
        )
    }

    /// Contents of the context's buffer, or of the client's current buffer
    pub fn cat(&self, context: &Context) -> Result<String> {
        self.retriever().capture(
            // Overwrite in place; other write methods would replace the pipe
            |path| format!("write -method overwrite -force {}", quote(path)),
            &context.buffer,
            context,
            self.settings().query_timeout(),
        )
    }

    /// Open `filepath` in the target client.
    ///
    /// Without a live target, a session is created (named after the
    /// requested session if there was one) and the caller is asked to
    /// attach to it.
    pub fn edit(&self, context: &Context, filepath: &Filepath) -> Result<EditOutcome> {
        match self.resolver().exists(context) {
            Ok(()) if !context.client.is_empty() => {
                self.dispatcher().send(
                    &filepath.edit_command(),
                    "",
                    &context.session,
                    &context.client,
                )?;
                Ok(EditOutcome::Opened)
            }
            Ok(()) | Err(KakError::ClientNotFound { .. }) => Ok(EditOutcome::Attach {
                session: context.session.clone(),
            }),
            Err(KakError::SessionNotFound { session }) => {
                tracing::debug!("Session {} not running, starting it", session);
                let session = self.lifecycle().create(&session)?;
                Ok(EditOutcome::Attach { session })
            }
            Err(KakError::NoSession) => {
                let session = self.lifecycle().create("")?;
                Ok(EditOutcome::Attach { session })
            }
            Err(e) => Err(e),
        }
    }

    /// Every live session with its clients and working directory
    pub fn list(&self) -> Result<Vec<Session>> {
        self.registry().list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::KksCoreBuilder;
    use crate::channel::testing::SimulatedEditor;
    use crate::config::{Settings, TransportKind};
    use crate::context::{FixedAmbient, NoAmbient, CLIENT_VAR, SESSION_VAR};
    use crate::runtime::testing::FakeRuntime;
    use pretty_assertions::assert_eq;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;

    fn answers(_session: &str, message: &str) -> Option<String> {
        if message.contains("%val{client_list}") {
            Some("'client0'".to_string())
        } else if message.contains("%val{buflist}") {
            Some("'main.rs' '*debug*'".to_string())
        } else if message.contains("write -method overwrite") {
            Some("hello\n".to_string())
        } else {
            None
        }
    }

    fn core_with(fake: &FakeRuntime, settings: Settings, editor: Arc<SimulatedEditor>) -> KksCore {
        KksCoreBuilder::new(Settings {
            temp_dir: Some(fake.dir.path().to_path_buf()),
            ..settings
        })
        .with_runtime_dir(fake.runtime())
        .with_channel(editor)
        .with_ambient(Arc::new(NoAmbient))
        .build()
    }

    #[test]
    fn test_require_checks_target() {
        let mut fake = FakeRuntime::new();
        fake.add_live("work");
        let editor = Arc::new(SimulatedEditor::responding(answers));
        let core = core_with(&fake, Settings::default(), editor);

        temp_env::with_vars_unset([SESSION_VAR, CLIENT_VAR], || {
            assert_eq!(core.require("work", "client0").unwrap(), Context::new("work", "client0"));
            assert!(matches!(core.require("", "").unwrap_err(), KakError::NoSession));
            assert!(matches!(
                core.require("work", "client7").unwrap_err(),
                KakError::ClientNotFound { .. }
            ));
        });
    }

    #[test]
    fn test_resolve_uses_ambient() {
        let fake = FakeRuntime::new();
        let core = KksCoreBuilder::new(Settings::default())
            .with_runtime_dir(fake.runtime())
            .with_channel(Arc::new(SimulatedEditor::new()))
            .with_ambient(Arc::new(FixedAmbient::new(Some("amb"), Some("c3"))))
            .build();

        temp_env::with_vars_unset([SESSION_VAR, CLIENT_VAR], || {
            assert_eq!(core.resolve("", ""), Context::new("amb", "c3"));
        });
    }

    #[test]
    fn test_get_and_cat() {
        let mut fake = FakeRuntime::new();
        fake.add_live("work");
        let editor = Arc::new(SimulatedEditor::responding(answers));
        let core = core_with(&fake, Settings::default(), editor.clone());

        let context = Context::new("work", "client0");
        assert_eq!(core.get(&context, "%val{buflist}").unwrap(), vec!["main.rs", "*debug*"]);

        let content = core.cat(&context.clone().with_buffer("main.rs")).unwrap();
        assert_eq!(content, "hello\n");

        let sent = editor.sent();
        assert!(sent[1].1.contains("-buffer"));
    }

    #[test]
    fn test_kill_checks_session_over_fifo_transport() {
        let mut fake = FakeRuntime::new();
        fake.add_live("work");
        let core = KksCoreBuilder::new(Settings {
            transport: TransportKind::Fifo,
            ..Settings::default()
        })
        .with_runtime_dir(fake.runtime())
        .with_ambient(Arc::new(NoAmbient))
        .build();

        let err = core.lifecycle().kill("wrok").unwrap_err();
        assert!(matches!(err, KakError::SessionNotFound { ref session } if session == "wrok"));
        core.lifecycle().kill("work").unwrap();
    }

    #[test]
    fn test_edit_in_running_client() {
        let mut fake = FakeRuntime::new();
        fake.add_live("work");
        let editor = Arc::new(SimulatedEditor::responding(answers));
        let core = core_with(&fake, Settings::default(), editor.clone());

        let filepath = Filepath::parse("/src/lib.rs:4").unwrap();
        let outcome = core.edit(&Context::new("work", "client0"), &filepath).unwrap();

        assert_eq!(outcome, EditOutcome::Opened);
        let commands = editor.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].1.contains("edit -existing"));
        assert!(commands[0].1.contains("/src/lib.rs"));
    }

    #[test]
    fn test_edit_without_client_attaches() {
        let mut fake = FakeRuntime::new();
        fake.add_live("work");
        let editor = Arc::new(SimulatedEditor::responding(answers));
        let core = core_with(&fake, Settings::default(), editor.clone());
        let filepath = Filepath::parse("notes.md").unwrap();

        for client in ["", "gone-client"] {
            let outcome = core.edit(&Context::new("work", client), &filepath).unwrap();
            assert_eq!(
                outcome,
                EditOutcome::Attach {
                    session: "work".to_string()
                }
            );
        }
        assert!(editor.commands().is_empty());
    }

    #[test]
    fn test_edit_starts_missing_session() {
        let fake = FakeRuntime::new();
        let scripts = tempfile::tempdir().unwrap();
        let script = scripts.path().join("fake-kak");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\nmkfifo \"{dir}/$3\"\nexec 3<>\"{dir}/$3\"\nsleep 2\n",
                dir = fake.dir.path().display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let settings = Settings {
            editor: script.display().to_string(),
            create_poll_interval_ms: 10,
            ..Settings::default()
        };
        let core = core_with(&fake, settings, Arc::new(SimulatedEditor::new()));
        let filepath = Filepath::parse("notes.md").unwrap();

        let outcome = core.edit(&Context::new("project", ""), &filepath).unwrap();
        assert_eq!(
            outcome,
            EditOutcome::Attach {
                session: "project".to_string()
            }
        );
        assert!(fake.runtime().is_live("project"));
    }
}
