//! Editor runtime directory
//!
//! Every live session owns one entry in the runtime directory, named after
//! the session: a Unix socket for Kakoune itself, or a named pipe for
//! editors driven through the FIFO transport.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{KakError, Result};

/// Session names double as file names inside the runtime directory
static SESSION_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9_.-]*$").expect("Invalid SESSION_NAME_PATTERN regex")
});

/// Reject names that would escape the runtime directory or break quoting
pub fn validate_name(name: &str) -> Result<()> {
    if !SESSION_NAME_PATTERN.is_match(name) {
        return Err(KakError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Liveness of a runtime entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// The control channel accepts writes
    Live,
    /// Leftover file whose editor has gone away
    Stale,
    /// No entry with this name
    Missing,
}

/// Resolve the runtime directory from the environment.
///
/// `KKS_RUNTIME_DIR` wins, then `$XDG_RUNTIME_DIR/kakoune`, then
/// `$TMPDIR/kakoune-$USER` the way Kakoune itself lays it out.
pub fn default_runtime_dir() -> PathBuf {
    if let Some(dir) = env_path("KKS_RUNTIME_DIR") {
        return dir;
    }
    if let Some(xdg) = env_path("XDG_RUNTIME_DIR") {
        return xdg.join("kakoune");
    }
    let tmp = env_path("TMPDIR").unwrap_or_else(|| PathBuf::from("/tmp"));
    let user = std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| unsafe { libc::getuid() }.to_string());
    tmp.join(format!("kakoune-{}", user))
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Open the write end of a named pipe without blocking.
///
/// Fails with `ENXIO` when nobody holds the read end.
pub(crate) fn open_fifo_writer(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

/// Handle on the runtime directory. Holds no state besides its path, so
/// every call observes the directory as it is right now.
#[derive(Debug, Clone)]
pub struct RuntimeDir {
    path: PathBuf,
}

impl RuntimeDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use the configured override or fall back to the environment
    pub fn discover(configured: Option<&Path>) -> Self {
        match configured {
            Some(path) => Self::new(path),
            None => Self::new(default_runtime_dir()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the control channel for a session
    pub fn entry_path(&self, session: &str) -> PathBuf {
        self.path.join(session)
    }

    /// Names of all FIFO and socket entries, sorted
    pub fn entries(&self) -> Result<Vec<String>> {
        let unavailable = |source| KakError::RuntimeUnavailable {
            path: self.path.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !(file_type.is_fifo() || file_type.is_socket()) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    /// Check whether a session's control channel currently accepts writes
    pub fn probe(&self, session: &str) -> EntryState {
        let path = self.entry_path(session);
        let Ok(meta) = fs::symlink_metadata(&path) else {
            return EntryState::Missing;
        };
        let file_type = meta.file_type();

        let result = if file_type.is_fifo() {
            open_fifo_writer(&path).map(drop)
        } else if file_type.is_socket() {
            UnixStream::connect(&path).map(drop)
        } else {
            return EntryState::Stale;
        };

        match result {
            Ok(()) => EntryState::Live,
            Err(e) => {
                tracing::debug!("Runtime entry {} is stale: {}", path.display(), e);
                EntryState::Stale
            }
        }
    }

    pub fn is_live(&self, session: &str) -> bool {
        self.probe(session) == EntryState::Live
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Simulated runtime directories for tests.

    use std::fs::File;
    use std::os::unix::fs::OpenOptionsExt;
    use std::path::Path;

    use nix::sys::stat::Mode;
    use tempfile::TempDir;

    use super::RuntimeDir;

    /// A temp runtime directory whose live sessions are FIFOs with an open
    /// reader, and whose stale sessions are FIFOs nobody reads.
    pub struct FakeRuntime {
        pub dir: TempDir,
        readers: Vec<File>,
    }

    impl FakeRuntime {
        pub fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                readers: Vec::new(),
            }
        }

        pub fn runtime(&self) -> RuntimeDir {
            RuntimeDir::new(self.dir.path())
        }

        pub fn add_live(&mut self, name: &str) -> &mut Self {
            let path = self.add_stale_path(name);
            self.readers.push(open_reader(&path));
            self
        }

        pub fn add_stale(&mut self, name: &str) -> &mut Self {
            self.add_stale_path(name);
            self
        }

        fn add_stale_path(&self, name: &str) -> std::path::PathBuf {
            let path = self.dir.path().join(name);
            nix::unistd::mkfifo(path.as_path(), Mode::S_IRUSR | Mode::S_IWUSR).unwrap();
            path
        }
    }

    fn open_reader(path: &Path) -> File {
        std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .unwrap()
    }
}
