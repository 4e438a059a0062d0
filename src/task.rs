//! The background acquisition engine.
//!
//! One [`AcqTask`] runs one acquisition cycle on a tokio task:
//!
//! 1. pre-read delay (if any queued device asked for it), slept in short
//!    slices so cancellation is observed promptly,
//! 2. a single trigger arm (if any queued device asked for it),
//! 3. a detect poll loop until the instrument reports completion,
//! 4. the queued reads, sequentially, in registration order.
//!
//! Cancellation is cooperative: the flag is checked at every boundary, and
//! a cancelled task finishes with an empty result list. The task never
//! retries; the first failing read aborts the remainder and the error is
//! held for whoever collects the cycle.

use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::codec::Value;
use crate::device::{Device, IoCtx, Options};
use crate::error::{InstrError, Result};
use crate::instrument::TriggerHooks;
use crate::transport::Transport;

/// Longest uninterrupted sleep during the pre-read delay.
pub const DELAY_SLICE: Duration = Duration::from_millis(100);

/// Per-call bound handed to `detect`; the loop re-checks cancellation and
/// the transport fault state between calls.
pub const DETECT_WAIT: Duration = Duration::from_millis(500);

/// Cooperative cancellation flag shared between an instrument and its
/// running task.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    /// A fresh, uncancelled flag.
    pub fn new() -> Self {
        CancelFlag(AtomicBool::new(false))
    }

    /// Request cancellation. The task stops at its next check point.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One queued read.
pub struct AcqOp {
    /// The device to read.
    pub device: Arc<Device>,
    /// Per-call options for that read.
    pub options: Options,
}

/// One acquisition cycle, consumed by `run`.
pub struct AcqTask {
    /// Owning instrument's display name.
    pub instrument: String,
    /// The instrument's transport.
    pub transport: Arc<dyn Transport>,
    /// Trigger hooks; `None` when no queued device requires triggering.
    pub hooks: Option<Arc<dyn TriggerHooks>>,
    /// Pre-read delay; zero when no queued device requires it.
    pub delay: Duration,
    /// The queued reads, in registration order.
    pub ops: Vec<AcqOp>,
    /// Sibling devices, for option resolution during the reads.
    pub peers: Arc<HashMap<String, Arc<Device>>>,
    /// Cancellation flag shared with the instrument.
    pub cancel: Arc<CancelFlag>,
}

impl AcqTask {
    /// Run the cycle to completion, cancellation, or first error.
    pub async fn run(self) -> Result<Vec<Value>> {
        let mut remaining = self.delay;
        while remaining > Duration::ZERO {
            if self.cancel.is_cancelled() {
                return Ok(Vec::new());
            }
            let slice = remaining.min(DELAY_SLICE);
            tokio::time::sleep(slice).await;
            remaining -= slice;
        }

        if let Some(hooks) = &self.hooks {
            if self.cancel.is_cancelled() {
                return Ok(Vec::new());
            }
            hooks.arm(self.transport.as_ref()).await?;
            debug!("{}: armed, waiting for completion", self.instrument);
            loop {
                if self.cancel.is_cancelled() {
                    return Ok(Vec::new());
                }
                if self.transport.error_state() {
                    return Err(InstrError::transport(format!(
                        "{}: transport reported an error state during detection",
                        self.instrument
                    )));
                }
                if hooks.detect(self.transport.as_ref(), DETECT_WAIT).await? {
                    break;
                }
            }
        }

        let ctx = IoCtx {
            instrument: &self.instrument,
            transport: self.transport.as_ref(),
            peers: &self.peers,
        };
        let mut results = Vec::with_capacity(self.ops.len());
        for op in &self.ops {
            if self.cancel.is_cancelled() {
                return Ok(Vec::new());
            }
            results.push(op.device.raw_read(&ctx, &op.options).await?);
        }
        debug!(
            "{}: cycle complete, {} result(s)",
            self.instrument,
            results.len()
        );
        Ok(results)
    }
}
