//! Service-request (SRQ) completion detection.
//!
//! Instruments that signal measurement completion over the IEEE-488 status
//! system are armed with `*OPC` so that completion latches the event-status
//! OPC bit, which the `*ESE`/`*SRE` masks propagate into a service request.
//! [`SrqDetector`] then detects that request through one of three
//! strategies, chosen to match what the transport can do:
//!
//! - [`SrqStrategy::Poll`] — serial-poll the status byte for the RQS bit,
//! - [`SrqStrategy::Queued`] — block on the transport's SRQ event queue,
//! - [`SrqStrategy::Flag`] — an interrupt layer signals a [`SrqFlag`].
//!
//! The status system is shared state, so every arm is preceded by a
//! cleanup pass that drains signals left over from aborted cycles; stale
//! signals are logged, never raised.

use async_trait::async_trait;
use log::warn;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{InstrError, Result};
use crate::instrument::TriggerHooks;
use crate::transport::{EventKind, Transport};

/// Status byte: request-for-service bit.
pub const STB_RQS: u8 = 0x40;
/// Status byte: event-status-summary bit.
pub const STB_ESB: u8 = 0x20;
/// Event status register: operation-complete bit.
pub const ESR_OPC: u8 = 0x01;

/// Default arm sequence: start the measurement and request OPC on finish.
pub const DEFAULT_ARM: &str = "INITiate;*OPC";

/// Fast completion flag signalled by a transport's interrupt layer.
///
/// The interrupt handler must serial-poll (and thereby clear) the status
/// byte itself, then pass the observed value to [`signal`](SrqFlag::signal).
#[derive(Debug, Default)]
pub struct SrqFlag {
    set: AtomicBool,
    status: AtomicU8,
    notify: Notify,
}

impl SrqFlag {
    /// A fresh, unsignalled flag.
    pub fn new() -> Arc<Self> {
        Arc::new(SrqFlag::default())
    }

    /// Record a service request with the status byte the handler read.
    pub fn signal(&self, status: u8) {
        self.status.store(status, Ordering::SeqCst);
        self.set.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Wait for a signal, at most `max_wait`. Consumes the signal and
    /// returns the recorded status byte, or `None` on timeout.
    pub async fn wait(&self, max_wait: Duration) -> Option<u8> {
        let deadline = Instant::now() + max_wait;
        loop {
            if self.set.swap(false, Ordering::SeqCst) {
                return Some(self.status.load(Ordering::SeqCst));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let _ = tokio::time::timeout(remaining, self.notify.notified()).await;
        }
    }

    /// Drop any pending signal. Returns whether one was pending.
    pub fn clear(&self) -> bool {
        self.set.swap(false, Ordering::SeqCst)
    }
}

/// How completion is detected.
pub enum SrqStrategy {
    /// Serial-poll the status byte at this interval until RQS is set.
    Poll {
        /// Sleep between polls.
        interval: Duration,
    },
    /// Block on the transport's queued SRQ events.
    Queued,
    /// Wait on an externally signalled flag.
    Flag(Arc<SrqFlag>),
}

/// SRQ-based completion detector with a diagnostic cache of the last
/// status byte and event status register it saw.
pub struct SrqDetector {
    strategy: SrqStrategy,
    last_status: AtomicU8,
    last_esr: AtomicU8,
}

impl SrqDetector {
    fn with_strategy(strategy: SrqStrategy) -> Self {
        SrqDetector {
            strategy,
            last_status: AtomicU8::new(0),
            last_esr: AtomicU8::new(0),
        }
    }

    /// Status-byte polling at the given interval.
    pub fn polling(interval: Duration) -> Self {
        Self::with_strategy(SrqStrategy::Poll { interval })
    }

    /// Queued-event detection.
    pub fn queued() -> Self {
        Self::with_strategy(SrqStrategy::Queued)
    }

    /// Flag detection; the interrupt layer signals `flag`.
    pub fn flagged(flag: Arc<SrqFlag>) -> Self {
        Self::with_strategy(SrqStrategy::Flag(flag))
    }

    /// Last status byte observed.
    pub fn last_status(&self) -> u8 {
        self.last_status.load(Ordering::SeqCst)
    }

    /// Last event status register value observed.
    pub fn last_esr(&self) -> u8 {
        self.last_esr.load(Ordering::SeqCst)
    }

    async fn read_esr(&self, transport: &dyn Transport) -> Result<u8> {
        let reply = transport.ask("*ESR?").await?;
        let esr: u8 = reply
            .trim()
            .parse()
            .map_err(|_| InstrError::Decode(format!("'{reply}' is not an event status value")))?;
        self.last_esr.store(esr, Ordering::SeqCst);
        Ok(esr)
    }

    /// One bounded detection attempt. `true` means the armed measurement
    /// completed; `false` means nothing within `max_wait` (not an error).
    pub async fn detect(&self, transport: &dyn Transport, max_wait: Duration) -> Result<bool> {
        match &self.strategy {
            SrqStrategy::Poll { interval } => {
                let deadline = Instant::now() + max_wait;
                loop {
                    let status = transport.read_status_byte().await?;
                    if status & STB_RQS != 0 {
                        self.last_status.store(status, Ordering::SeqCst);
                        return Ok(true);
                    }
                    if Instant::now() + *interval > deadline {
                        return Ok(false);
                    }
                    tokio::time::sleep(*interval).await;
                }
            }
            SrqStrategy::Queued => {
                if !transport
                    .wait_on_event(EventKind::ServiceRequest, max_wait)
                    .await?
                {
                    return Ok(false);
                }
                // consume the latched registers so the queue cannot wedge
                self.read_esr(transport).await?;
                let status = transport.read_status_byte().await?;
                self.last_status.store(status, Ordering::SeqCst);
                Ok(true)
            }
            SrqStrategy::Flag(flag) => match flag.wait(max_wait).await {
                Some(status) => {
                    self.last_status.store(status, Ordering::SeqCst);
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }

    /// Drain signals a previous, possibly aborted cycle left latched:
    /// the OPC event bit, looped status-byte RQS, queued events, and a
    /// pending flag. Stale signals are logged, never raised.
    pub async fn cleanup(&self, transport: &dyn Transport) -> Result<()> {
        let esr = self.read_esr(transport).await?;
        if esr & ESR_OPC != 0 {
            warn!("stale operation-complete event bit was latched");
        }
        for _ in 0..16 {
            let status = transport.read_status_byte().await?;
            if status & STB_RQS == 0 {
                break;
            }
            warn!("stale service request drained (status 0x{status:02x})");
        }
        if matches!(self.strategy, SrqStrategy::Queued) {
            for _ in 0..16 {
                if !transport
                    .wait_on_event(EventKind::ServiceRequest, Duration::ZERO)
                    .await?
                {
                    break;
                }
                warn!("stale queued service-request event drained");
            }
        }
        if let SrqStrategy::Flag(flag) = &self.strategy {
            if flag.clear() {
                warn!("stale service-request flag cleared");
            }
        }
        self.last_status.store(0, Ordering::SeqCst);
        self.last_esr.store(0, Ordering::SeqCst);
        Ok(())
    }
}

/// [`TriggerHooks`] driving an SRQ-signalling instrument: cleanup, then the
/// configured arm command; detection through the wrapped detector.
pub struct SrqTrigger {
    detector: SrqDetector,
    arm_command: String,
}

impl SrqTrigger {
    /// Hooks with the default arm sequence ([`DEFAULT_ARM`]).
    pub fn new(detector: SrqDetector) -> Self {
        SrqTrigger {
            detector,
            arm_command: DEFAULT_ARM.to_string(),
        }
    }

    /// Override the arm command.
    pub fn with_arm_command(mut self, command: impl Into<String>) -> Self {
        self.arm_command = command.into();
        self
    }

    /// The wrapped detector (for diagnostics).
    pub fn detector(&self) -> &SrqDetector {
        &self.detector
    }

    /// One-time status-system setup: clear everything, then route the OPC
    /// event bit into a service request.
    pub async fn initialize(&self, transport: &dyn Transport) -> Result<()> {
        transport.write("*CLS").await?;
        transport.write("*ESE 1;*SRE 32").await?;
        Ok(())
    }
}

#[async_trait]
impl TriggerHooks for SrqTrigger {
    async fn arm(&self, transport: &dyn Transport) -> Result<()> {
        self.detector.cleanup(transport).await?;
        transport.write(&self.arm_command).await
    }

    async fn detect(&self, transport: &dyn Transport, max_wait: Duration) -> Result<bool> {
        self.detector.detect(transport, max_wait).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    #[tokio::test]
    async fn polling_detects_completion() {
        let t = MockTransport::new("sim").with_arm(DEFAULT_ARM, Duration::from_millis(30));
        let det = SrqDetector::polling(Duration::from_millis(5));
        t.write(DEFAULT_ARM).await.unwrap();
        assert!(!det.detect(&t, Duration::from_millis(10)).await.unwrap());
        assert!(det.detect(&t, Duration::from_millis(200)).await.unwrap());
        assert_eq!(det.last_status() & STB_RQS, STB_RQS);
    }

    #[tokio::test]
    async fn queued_detection_consumes_registers() {
        let t = MockTransport::new("sim").with_arm(DEFAULT_ARM, Duration::from_millis(20));
        let det = SrqDetector::queued();
        t.write(DEFAULT_ARM).await.unwrap();
        assert!(det.detect(&t, Duration::from_millis(200)).await.unwrap());
        // OPC bit was read-and-cleared during detection
        assert_eq!(det.last_esr() & ESR_OPC, ESR_OPC);
        assert_eq!(t.ask("*ESR?").await.unwrap(), "0");
    }

    #[tokio::test]
    async fn flag_detection() {
        let flag = SrqFlag::new();
        let det = SrqDetector::flagged(flag.clone());
        let t = MockTransport::new("sim");
        let waiter = {
            let flag = flag.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(15)).await;
                flag.signal(STB_RQS | STB_ESB);
            })
        };
        assert!(det.detect(&t, Duration::from_millis(200)).await.unwrap());
        assert_eq!(det.last_status(), STB_RQS | STB_ESB);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn cleanup_drains_stale_signals() {
        let t = MockTransport::new("sim");
        t.inject_esr_opc();
        t.inject_status(STB_RQS);
        t.inject_status(STB_RQS);
        t.inject_stale_event();
        let det = SrqDetector::queued();
        det.cleanup(&t).await.unwrap();
        assert_eq!(t.ask("*ESR?").await.unwrap(), "0");
        assert_eq!(t.read_status_byte().await.unwrap(), 0);
        assert!(!t
            .wait_on_event(EventKind::ServiceRequest, Duration::ZERO)
            .await
            .unwrap());
    }
}
