//! Detection of the editor session a command was launched from.
//!
//! Shells started by Kakoune (`terminal`, `%sh{}` blocks, plugins) carry
//! markers in their environment. When the markers were scrubbed from our own
//! environment (e.g. by `sudo` or `env -i`), ancestors may still have them.

/// Session and client markers found in the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientContext {
    pub session: Option<String>,
    pub client: Option<String>,
}

/// Source of the ambient editor context
pub trait AmbientContextProvider: Send + Sync {
    fn detect(&self) -> AmbientContext;
}

/// Never detects anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAmbient;

impl AmbientContextProvider for NoAmbient {
    fn detect(&self) -> AmbientContext {
        AmbientContext::default()
    }
}

/// Always reports the same context
#[derive(Debug, Default, Clone)]
pub struct FixedAmbient(AmbientContext);

impl FixedAmbient {
    pub fn new(session: Option<&str>, client: Option<&str>) -> Self {
        Self(AmbientContext {
            session: session.map(str::to_string),
            client: client.map(str::to_string),
        })
    }
}

impl AmbientContextProvider for FixedAmbient {
    fn detect(&self) -> AmbientContext {
        self.0.clone()
    }
}

/// Variables Kakoune exports to shell expansions, then the ones set in
/// terminals it spawns
const SESSION_MARKERS: &[&str] = &["kak_session", "KAKOUNE_SESSION"];
const CLIENT_MARKERS: &[&str] = &["kak_client", "KAKOUNE_CLIENT"];

/// Reads markers from this process's environment, then from its ancestors
#[derive(Debug, Clone, Copy)]
pub struct ProcessAmbient {
    max_depth: usize,
}

impl Default for ProcessAmbient {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

impl ProcessAmbient {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many ancestors to inspect (0 = own environment only)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl AmbientContextProvider for ProcessAmbient {
    fn detect(&self) -> AmbientContext {
        if let Some(found) = markers_from(|var| std::env::var(var).ok()) {
            return found;
        }

        let mut pid = parent_pid(std::process::id());
        for _ in 0..self.max_depth {
            let Some(current) = pid.filter(|&p| p > 1) else {
                break;
            };
            if let Some(found) = markers_from(|var| environ_var(current, var)) {
                tracing::debug!("Found editor context in ancestor process {}", current);
                return found;
            }
            pid = parent_pid(current);
        }

        AmbientContext::default()
    }
}

/// Session and client from one environment, so the pair stays coherent.
/// `None` when the environment names no session.
fn markers_from(lookup: impl Fn(&str) -> Option<String>) -> Option<AmbientContext> {
    let first = |markers: &[&str]| {
        markers
            .iter()
            .filter_map(|var| lookup(*var))
            .find(|value| !value.is_empty())
    };

    let session = first(SESSION_MARKERS)?;
    Some(AmbientContext {
        session: Some(session),
        client: first(CLIENT_MARKERS),
    })
}

/// Value of `var` in another process's environment. `None` on any error
/// (permission denied, process gone, no procfs).
fn environ_var(pid: u32, var: &str) -> Option<String> {
    let content = std::fs::read(format!("/proc/{}/environ", pid)).ok()?;
    let prefix = format!("{}=", var);

    // NUL-separated KEY=VALUE entries
    content
        .split(|&b| b == 0)
        .filter_map(|entry| std::str::from_utf8(entry).ok())
        .find_map(|entry| entry.strip_prefix(&prefix).map(str::to_string))
}

/// Parent of `pid` from `/proc/<pid>/stat`
fn parent_pid(pid: u32) -> Option<u32> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    // "pid (comm) state ppid ...", where comm may itself contain ") "
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace().nth(1)?.parse().ok()
}
