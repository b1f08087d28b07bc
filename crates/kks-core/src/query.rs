//! Result retrieval
//!
//! The editor can only be told to write a value somewhere, so a query hands
//! it a freshly created named pipe, dispatches the command that writes into
//! it, and waits for the content on a single-use channel. A pipe rather
//! than a plain file means end-of-file marks a complete result, so an
//! empty answer is distinguishable from no answer yet.

use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use nix::sys::stat::Mode;
use tempfile::TempDir;

use crate::channel::Channel;
use crate::command::{quote, unquote_all};
use crate::context::Context;
use crate::dispatch::Dispatcher;
use crate::error::{KakError, Result};

/// Prefix of the temporary directories holding result pipes
pub const TEMP_PREFIX: &str = "kks-";

/// Split captured content into values.
///
/// Kakoune-quoted output (`'a' 'b'`) yields one value per quoted word,
/// anything else one value per line. Empty content is an empty result.
pub fn decode_values(content: &str) -> Vec<String> {
    if content.trim_end_matches('\n').is_empty() {
        return Vec::new();
    }
    unquote_all(content).unwrap_or_else(|| content.lines().map(str::to_string).collect())
}

/// One-shot handoff point: created, armed once, fulfilled by the editor,
/// consumed once and removed on drop.
struct ResultPipe {
    dir: TempDir,
    path: PathBuf,
}

impl ResultPipe {
    fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        let path = dir.path().join("result");
        nix::unistd::mkfifo(path.as_path(), Mode::S_IRUSR | Mode::S_IWUSR)
            .map_err(io::Error::from)?;

        Ok(Self { dir, path })
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }

    /// Start the background reader. It blocks until the editor opens the
    /// pipe and publishes everything written once the editor closes it.
    fn arm(&self) -> Receiver<io::Result<String>> {
        let (tx, rx) = mpsc::sync_channel(0);
        let path = self.path.clone();
        thread::spawn(move || {
            let content = fs::read(&path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
            // The receiver is gone after a timeout
            let _ = tx.send(content);
        });
        rx
    }
}

impl Drop for ResultPipe {
    fn drop(&mut self) {
        // Opening read-write never blocks on Linux and counts as a writer, so
        // a reader stuck in open() wakes up; once the path is unlinked no new
        // reader can block on it. Dropping the handle then delivers EOF.
        let release = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path);
        let _ = fs::remove_file(&self.path);
        drop(release);
        tracing::debug!("Removed result pipe {}", self.dir.path().display());
    }
}

/// Issues queries and waits for the editor's answer
#[derive(Clone, Copy)]
pub struct Retriever<'a> {
    channel: &'a dyn Channel,
    temp_root: Option<&'a Path>,
}

impl<'a> Retriever<'a> {
    pub fn new(channel: &'a dyn Channel, temp_root: Option<&'a Path>) -> Self {
        Self { channel, temp_root }
    }

    /// Evaluate `expression` (e.g. `%val{buflist}`) in the given context and
    /// return its values.
    pub fn query(
        &self,
        expression: &str,
        buffer: &str,
        context: &Context,
        timeout: Duration,
    ) -> Result<Vec<String>> {
        let content = self.capture(
            |path| format!("echo -quoting kakoune -to-file {} {}", quote(path), expression),
            buffer,
            context,
            timeout,
        )?;
        Ok(decode_values(&content))
    }

    /// Run the command built from the result path and return whatever the
    /// editor writes there, e.g. `write -force <path>` for buffer contents.
    pub fn capture(
        &self,
        build: impl FnOnce(&str) -> String,
        buffer: &str,
        context: &Context,
        timeout: Duration,
    ) -> Result<String> {
        if context.session.is_empty() {
            return Err(KakError::NoSession);
        }

        let pipe = ResultPipe::create(self.temp_root)?;
        let rx = pipe.arm();

        let command = build(&pipe.path_str());
        Dispatcher::new(self.channel).send(&command, buffer, &context.session, &context.client)?;

        match rx.recv_timeout(timeout) {
            Ok(content) => Ok(content?),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "Session {} did not answer within {:?}",
                    context.session,
                    timeout
                );
                Err(KakError::QueryTimeout {
                    session: context.session.clone(),
                    timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(KakError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "result reader exited without a result",
            ))),
        }
    }
}
