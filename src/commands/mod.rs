//! Subcommand glue between the CLI and kks-core.

mod format;

use std::io::Write;

use anyhow::{bail, Context as _, Result};
use kks_core::api::{EditOutcome, KksCore};
use kks_core::dispatch::FanoutReport;
use kks_core::filepath::Filepath;

use crate::config::{Command, Target};

pub use format::{env_lines, session_table};

/// Kakoune commands printed by `kks init`
pub const INIT_KAK: &str = include_str!("init.kak");

/// Run one subcommand, writing its output to `out`
pub fn run(core: &KksCore, command: Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::New { name } => {
            let session = core.lifecycle().create(name.as_deref().unwrap_or_default())?;
            writeln!(out, "{}", session)?;
        }

        Command::Edit { target, file } => {
            let cwd = std::env::current_dir().context("Cannot determine current directory")?;
            let filepath = Filepath::from_args(file.as_slice())?.absolutize(&cwd);
            let context = core.resolve(&target.session, &target.client);

            if let EditOutcome::Attach { session } = core.edit(&context, &filepath)? {
                core.lifecycle().attach(&session, Some(&filepath))?;
            }
        }

        Command::Send {
            target,
            buffer,
            all,
            command,
        } => {
            let command = command.join(" ");
            if all {
                check_fanout(core.send_all(&command)?, "send")?;
            } else {
                let context = require(core, &target)?.with_buffer(buffer);
                core.send(&context, &command)?;
            }
        }

        Command::Attach { target } => {
            let session = attach_session(core, &target)?;
            core.lifecycle().attach(&session, None)?;
        }

        Command::Get {
            target,
            buffer,
            expression,
        } => {
            let context = require(core, &target)?.with_buffer(buffer);
            for value in core.get(&context, &expression)? {
                writeln!(out, "{}", value)?;
            }
        }

        Command::Kill { session, all } => {
            if all {
                check_fanout(core.lifecycle().kill_all()?, "kill")?;
            } else {
                let context = core.resolve(&session, "");
                core.lifecycle().kill(&context.session)?;
            }
        }

        Command::List { json } => {
            let sessions = core.list()?;
            if json {
                serde_json::to_writer_pretty(&mut *out, &sessions)?;
                writeln!(out)?;
            } else {
                out.write_all(session_table(&sessions).as_bytes())?;
            }
        }

        Command::Cat { target, buffer } => {
            let context = require(core, &target)?.with_buffer(buffer);
            out.write_all(core.cat(&context)?.as_bytes())?;
        }

        Command::Env { target, json } => {
            let context = require(core, &target)?;
            if json {
                serde_json::to_writer_pretty(&mut *out, &context)?;
                writeln!(out)?;
            } else {
                out.write_all(env_lines(&context).as_bytes())?;
            }
        }

        Command::Init => out.write_all(INIT_KAK.as_bytes())?,
    }

    out.flush()?;
    Ok(())
}

fn require(core: &KksCore, target: &Target) -> Result<kks_core::context::Context> {
    Ok(core.require(&target.session, &target.client)?)
}

/// Session to attach to; a client given with `-c` must be connected to it
fn attach_session(core: &KksCore, target: &Target) -> Result<String> {
    Ok(require(core, target)?.session)
}

/// Print every failed delivery, then fail if there was any
fn check_fanout(report: FanoutReport, action: &str) -> Result<()> {
    for failure in &report.failures {
        eprintln!("kks {}: {}", action, failure);
    }
    if !report.is_success() {
        bail!(
            "{} of {} {} deliveries failed",
            report.failures.len(),
            report.attempted,
            action
        );
    }
    tracing::debug!("{} reached {} targets", action, report.attempted);
    Ok(())
}
