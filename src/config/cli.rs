use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kks_core::config::{Settings, TransportKind};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Handy Kakoune companion")]
pub struct Config {
    /// Enable debug logging (to stderr)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Kakoune runtime directory holding the session sockets
    #[arg(long, global = true)]
    pub runtime_dir: Option<PathBuf>,

    /// How commands reach sessions
    #[arg(long, global = true, value_enum)]
    pub transport: Option<Transport>,

    /// How long to wait for a session to answer, in milliseconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Through `kak -p`
    Pipe,
    /// Straight into the session's named pipe
    Fifo,
}

impl From<Transport> for TransportKind {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Pipe => TransportKind::Pipe,
            Transport::Fifo => TransportKind::Fifo,
        }
    }
}

/// Session and client flags shared by most subcommands
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// Session (defaults to KKS_SESSION or the surrounding editor)
    #[arg(short, long, default_value = "")]
    pub session: String,

    /// Client (defaults to KKS_CLIENT or the surrounding editor)
    #[arg(short, long, default_value = "")]
    pub client: String,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new headless session
    #[command(visible_alias = "n")]
    New {
        /// Session name (generated when omitted)
        name: Option<String>,
    },

    /// Edit a file in a client, starting a session if needed
    #[command(visible_alias = "e")]
    Edit {
        #[command(flatten)]
        target: Target,

        /// FILE[:LINE[:COL]], optionally with a +LINE[:COL] argument
        #[arg(required = true, num_args = 1..=2)]
        file: Vec<String>,
    },

    /// Send a command to a client
    #[command(visible_alias = "s")]
    Send {
        #[command(flatten)]
        target: Target,

        /// Run in this buffer
        #[arg(short, long, default_value = "")]
        buffer: String,

        /// Send to every client of every session
        #[arg(short, long, conflicts_with_all = ["buffer", "session", "client"])]
        all: bool,

        /// Kakoune command
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Attach a new client to a session
    #[command(visible_alias = "a")]
    Attach {
        #[command(flatten)]
        target: Target,
    },

    /// Print the values of a Kakoune expansion, e.g. %val{buflist}
    Get {
        #[command(flatten)]
        target: Target,

        /// Evaluate in this buffer
        #[arg(short, long, default_value = "")]
        buffer: String,

        /// Expansion to evaluate
        expression: String,
    },

    /// Terminate a session
    #[command(visible_alias = "k")]
    Kill {
        /// Session (defaults to KKS_SESSION or the surrounding editor)
        #[arg(short, long, default_value = "")]
        session: String,

        /// Terminate every session
        #[arg(short = 'A', long)]
        all: bool,
    },

    /// List sessions and their clients
    #[command(visible_aliases = ["ls", "l"])]
    List {
        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Print the contents of a buffer
    Cat {
        #[command(flatten)]
        target: Target,

        /// Buffer (defaults to the client's current buffer)
        #[arg(short, long, default_value = "")]
        buffer: String,
    },

    /// Print the resolved session and client
    Env {
        #[command(flatten)]
        target: Target,

        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Print Kakoune commands that integrate kks, for `evaluate-commands %sh{kks init}`
    Init,
}

impl Config {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply command line overrides on top of file settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(runtime_dir) = &self.runtime_dir {
            settings.runtime_dir = Some(runtime_dir.clone());
        }
        if let Some(transport) = self.transport {
            settings.transport = transport.into();
        }
        if let Some(timeout) = self.timeout {
            settings.query_timeout_ms = timeout;
        }
    }
}
