//! Starting, stopping and attaching to editor sessions.

use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use crate::config::Settings;
use crate::dispatch::{Dispatcher, FanoutReport};
use crate::error::{KakError, Result};
use crate::filepath::Filepath;
use crate::namegen;
use crate::registry::SessionRegistry;
use crate::runtime::{validate_name, RuntimeDir};

#[derive(Clone, Copy)]
pub struct Lifecycle<'a> {
    settings: &'a Settings,
    runtime: &'a RuntimeDir,
    dispatcher: Dispatcher<'a>,
    registry: SessionRegistry<'a>,
}

impl<'a> Lifecycle<'a> {
    pub fn new(
        settings: &'a Settings,
        runtime: &'a RuntimeDir,
        dispatcher: Dispatcher<'a>,
        registry: SessionRegistry<'a>,
    ) -> Self {
        Self {
            settings,
            runtime,
            dispatcher,
            registry,
        }
    }

    /// Start a headless session and wait until it accepts commands.
    ///
    /// An empty `name` picks a fresh generated one. Returns the session name.
    pub fn create(&self, name: &str) -> Result<String> {
        let name = if name.is_empty() {
            // Before the first session there may be no runtime directory yet
            let existing = self.registry.sessions().unwrap_or_default();
            namegen::generate_unique_name(&existing)
        } else {
            name.to_string()
        };

        validate_name(&name)?;
        if self.runtime.is_live(&name) {
            return Err(KakError::SessionExists { session: name });
        }

        let editor = &self.settings.editor;
        let mut command = Command::new(editor);
        command
            .args(["-d", "-s", name.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        // Detach from our terminal so the session outlives this process
        unsafe {
            command.pre_exec(|| nix::unistd::setsid().map(drop).map_err(io::Error::from));
        }

        let mut child = command.spawn().map_err(|source| KakError::SpawnFailed {
            editor: editor.clone(),
            source,
        })?;
        tracing::debug!("Spawned {} -d -s {} (pid {})", editor, name, child.id());

        let interval = self.settings.create_poll_interval();
        let attempts = self.settings.create_max_attempts;
        let mut running = true;

        for _ in 0..attempts {
            if self.runtime.is_live(&name) {
                tracing::debug!("Session {} is up", name);
                return Ok(name);
            }

            // `kak -d` may fork and exit 0; only a failing exit is fatal
            if running {
                if let Some(status) = child.try_wait()? {
                    running = false;
                    if !status.success() {
                        let message = format!("{} -d exited with {}", editor, status);
                        return Err(KakError::SpawnFailed {
                            editor: editor.clone(),
                            source: io::Error::other(message),
                        });
                    }
                }
            }

            std::thread::sleep(interval);
        }

        if running {
            let _ = child.kill();
            let _ = child.wait();
        }
        tracing::warn!("Session {} did not come up after {} attempts", name, attempts);
        Err(KakError::SessionStartTimeout {
            session: name,
            attempts,
        })
    }

    /// Ask a live session to exit. Fire-and-forget like any other command.
    pub fn kill(&self, session: &str) -> Result<()> {
        if session.is_empty() {
            return Err(KakError::NoSession);
        }
        if !self.registry.contains(session) {
            return Err(KakError::SessionNotFound {
                session: session.to_string(),
            });
        }
        self.dispatcher.send("kill", "", session, "")
    }

    /// Kill every live session, continuing past failures
    pub fn kill_all(&self) -> Result<FanoutReport> {
        let mut report = FanoutReport::default();
        for session in self.registry.sessions()? {
            let outcome = self.kill(&session);
            report.record(&session, None, outcome);
        }
        Ok(report)
    }

    /// `<editor> -c <session> [file [+line[:column]]]`
    pub fn attach_command(&self, session: &str, filepath: Option<&Filepath>) -> Command {
        let mut command = Command::new(&self.settings.editor);
        command.args(["-c", session]);
        if let Some(filepath) = filepath {
            command.arg(&filepath.name);
            if let Some(position) = filepath.position_arg() {
                command.arg(position);
            }
        }
        command
    }

    /// Replace this process with an editor client attached to `session`.
    /// Only returns on failure.
    pub fn attach(&self, session: &str, filepath: Option<&Filepath>) -> Result<()> {
        if session.is_empty() {
            return Err(KakError::NoSession);
        }
        tracing::debug!("Attaching to session {}", session);
        let source = self.attach_command(session, filepath).exec();
        Err(KakError::SpawnFailed {
            editor: self.settings.editor.clone(),
            source,
        })
    }
}
