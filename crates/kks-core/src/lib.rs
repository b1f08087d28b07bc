//! Session discovery, targeting and command dispatch for Kakoune.
//!
//! Kakoune sessions are independent processes reachable only through their
//! runtime directory entries. This crate finds them, works out which
//! session/client/buffer a command is meant for, delivers commands, and
//! reads results back through short-lived named pipes.

pub mod api;
pub mod channel;
pub mod command;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod filepath;
pub mod lifecycle;
pub mod namegen;
pub mod query;
pub mod registry;
pub mod runtime;

pub use error::{KakError, Result};
