use std::fmt;

use crate::channel::Channel;
use crate::command::Message;
use crate::error::{KakError, Result};
use crate::registry::SessionRegistry;

/// One failed delivery during a fan-out
#[derive(Debug)]
pub struct FanoutFailure {
    pub session: String,
    pub client: Option<String>,
    pub error: KakError,
}

impl fmt::Display for FanoutFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.client {
            Some(client) => write!(f, "{}:{}: {}", self.session, client, self.error),
            None => write!(f, "{}: {}", self.session, self.error),
        }
    }
}

/// Outcome of delivering to every live session or client
#[derive(Debug, Default)]
pub struct FanoutReport {
    /// Deliveries attempted
    pub attempted: usize,
    pub failures: Vec<FanoutFailure>,
}

impl FanoutReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record(&mut self, session: &str, client: Option<&str>, outcome: Result<()>) {
        self.attempted += 1;
        if let Err(error) = outcome {
            tracing::debug!(
                "Delivery to {}{} failed: {}",
                session,
                client.map(|c| format!(":{}", c)).unwrap_or_default(),
                error
            );
            self.failures.push(FanoutFailure {
                session: session.to_string(),
                client: client.map(str::to_string),
                error,
            });
        }
    }
}

/// Renders commands and hands them to the control channel
#[derive(Clone, Copy)]
pub struct Dispatcher<'a> {
    channel: &'a dyn Channel,
}

impl<'a> Dispatcher<'a> {
    pub fn new(channel: &'a dyn Channel) -> Self {
        Self { channel }
    }

    /// Send one command to a session, optionally in a buffer and/or client.
    ///
    /// Fire-and-forget: success means the message was delivered, not that
    /// the editor ran it without error.
    pub fn send(&self, command: &str, buffer: &str, session: &str, client: &str) -> Result<()> {
        if session.is_empty() {
            return Err(KakError::NoSession);
        }

        let message = Message::new(command)
            .in_buffer(buffer)
            .for_client(client)
            .render();
        tracing::debug!(
            "Sending to {}{}: {}",
            session,
            if client.is_empty() {
                String::new()
            } else {
                format!(":{}", client)
            },
            command
        );
        self.channel.deliver(session, &message)
    }

    /// Send `command` to every client of every live session.
    ///
    /// Best-effort: a failing session or client is recorded and the rest are
    /// still attempted. Only failing to enumerate sessions aborts.
    pub fn send_all(&self, registry: &SessionRegistry<'_>, command: &str) -> Result<FanoutReport> {
        let mut report = FanoutReport::default();

        for session in registry.sessions()? {
            let clients = match registry.clients(&session) {
                Ok(clients) => clients,
                Err(error) => {
                    report.attempted += 1;
                    tracing::debug!("Could not list clients of {}: {}", session, error);
                    report.failures.push(FanoutFailure {
                        session,
                        client: None,
                        error,
                    });
                    continue;
                }
            };

            for client in &clients {
                let outcome = self.send(command, "", &session, client);
                report.record(&session, Some(client), outcome);
            }
        }

        tracing::debug!(
            "Fan-out of {:?}: {}/{} delivered",
            command,
            report.succeeded(),
            report.attempted
        );
        Ok(report)
    }
}
