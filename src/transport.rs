//! Transport contract for instrument communication.
//!
//! A [`Transport`] is the line to one physical instrument: write a command,
//! read a reply, or do both as one query. The core never opens connections
//! itself; the orchestration layer hands each instrument an already-open
//! transport and the instrument owns it exclusively.
//!
//! Only `write`, `read` and `ask` are mandatory. The service-request surface
//! (`read_status_byte`, `wait_on_event`) defaults to [`NotSupported`] so
//! plain transports stay trivial to implement, and SRQ-capable ones opt in.
//!
//! [`NotSupported`]: crate::error::InstrError::NotSupported

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{InstrError, Result};

/// Event classes a transport can wait on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// IEEE-488 service request (SRQ).
    ServiceRequest,
}

/// Asynchronous command/reply channel to one instrument.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable description, used in error messages.
    fn description(&self) -> String;

    /// Send a command. No reply is expected.
    async fn write(&self, command: &str) -> Result<()>;

    /// Read one reply, trimmed of its line terminator.
    async fn read(&self) -> Result<String>;

    /// Send a query and read its reply.
    async fn ask(&self, command: &str) -> Result<String> {
        self.write(command).await?;
        self.read().await
    }

    /// Read one reply as raw bytes (needed for binary blocks, which are
    /// generally not valid UTF-8). Defaults to the string read.
    async fn read_raw(&self) -> Result<Vec<u8>> {
        Ok(self.read().await?.into_bytes())
    }

    /// Send a query and read its reply as raw bytes.
    async fn ask_raw(&self, command: &str) -> Result<Vec<u8>> {
        self.write(command).await?;
        self.read_raw().await
    }

    /// Serial-poll the status byte. Reading clears the RQS bit on hardware
    /// that latches it.
    async fn read_status_byte(&self) -> Result<u8> {
        Err(InstrError::not_supported(
            self.description(),
            "read_status_byte",
        ))
    }

    /// Block until an event of the given kind arrives or `timeout` elapses.
    /// Returns `true` if an event was consumed, `false` on timeout.
    async fn wait_on_event(&self, _kind: EventKind, _timeout: Duration) -> Result<bool> {
        Err(InstrError::not_supported(
            self.description(),
            "wait_on_event",
        ))
    }

    /// Whether the transport is currently in a fault state. Acquisition
    /// loops poll this to abort early instead of waiting out their timeout.
    fn error_state(&self) -> bool {
        false
    }
}
