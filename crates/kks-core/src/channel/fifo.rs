use std::io::{self, Write};
use std::os::fd::AsRawFd;

use super::Channel;
use crate::error::{KakError, Result};
use crate::runtime::{open_fifo_writer, RuntimeDir};

/// Writes each message straight into the session's named pipe
pub struct FifoChannel {
    runtime: RuntimeDir,
}

impl FifoChannel {
    pub fn new(runtime: RuntimeDir) -> Self {
        Self { runtime }
    }
}

impl Channel for FifoChannel {
    fn deliver(&self, session: &str, message: &str) -> Result<()> {
        let path = self.runtime.entry_path(session);
        let gone = |e: io::Error| classify(session, e);

        // Non-blocking open so a missing reader fails instead of hanging
        let mut file = open_fifo_writer(&path).map_err(gone)?;
        set_blocking(&file)?;
        file.write_all(message.as_bytes()).map_err(gone)?;
        if !message.ends_with('\n') {
            file.write_all(b"\n").map_err(gone)?;
        }

        tracing::debug!("Delivered {} bytes to {}", message.len(), path.display());
        Ok(())
    }
}

/// Clear O_NONBLOCK so large messages wait for the reader instead of EAGAIN
fn set_blocking(file: &std::fs::File) -> Result<()> {
    let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_SETFL, 0) };
    if rc == -1 {
        return Err(KakError::Io(io::Error::last_os_error()));
    }
    Ok(())
}

fn classify(session: &str, e: io::Error) -> KakError {
    match e.raw_os_error() {
        Some(libc::ENXIO) | Some(libc::EPIPE) | Some(libc::ENOENT) => {
            KakError::SessionGone {
                session: session.to_string(),
                source: e,
            }
        }
        _ => KakError::Io(e),
    }
}
