use std::io::Write;
use std::process::{Command, Stdio};

use super::Channel;
use crate::error::{KakError, Result};

/// Streams each message into `<editor> -p <session>`, the editor's own
/// remote-command entry point. Used for Kakoune's socket sessions, whose
/// wire protocol is private to the editor.
pub struct PipeChannel {
    editor: String,
}

impl PipeChannel {
    pub fn new(editor: impl Into<String>) -> Self {
        Self {
            editor: editor.into(),
        }
    }
}

impl Channel for PipeChannel {
    fn deliver(&self, session: &str, message: &str) -> Result<()> {
        let mut child = Command::new(&self.editor)
            .args(["-p", session])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| KakError::SpawnFailed {
                editor: self.editor.clone(),
                source,
            })?;

        // Dropping stdin at the end of this block closes the pipe
        if let Some(mut stdin) = child.stdin.take() {
            let mut written = stdin.write_all(message.as_bytes());
            if written.is_ok() && !message.ends_with('\n') {
                written = stdin.write_all(b"\n");
            }
            if let Err(source) = written {
                let _ = child.kill();
                let _ = child.wait();
                return Err(KakError::SessionGone {
                    session: session.to_string(),
                    source,
                });
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KakError::DispatchFailed {
                session: session.to_string(),
                message: match stderr.trim() {
                    "" => format!("{} -p exited with {}", self.editor, output.status),
                    msg => msg.to_string(),
                },
            });
        }

        tracing::debug!("Delivered {} bytes to session {}", message.len(), session);
        Ok(())
    }
}
