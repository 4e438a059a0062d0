//! A mock transport that simulates a SCPI instrument.
//!
//! The simulator keeps a register map: a write of `NAME value` stores the
//! value, a query of `NAME?` reads it back. Canned replies cover queries
//! that do not fit the register pattern (`*IDN?`, block fetches). A
//! completion schedule models a triggered measurement: after the configured
//! arm command is written, the instrument "completes" a fixed delay later,
//! at which point it raises SRQ once (status byte `0x60`, consumed on read)
//! and sets the event-status OPC bit until `*ESR?` clears it.
//!
//! Every command is logged, so tests can assert that a rejected `set`
//! performed zero I/O, or that a trigger was issued exactly once.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{InstrError, Result};
use crate::transport::{EventKind, Transport};

const STB_COMPLETE: u8 = 0x60; // RQS | ESB
const ESR_OPC: u8 = 0x01;

#[derive(Default)]
struct MockState {
    registers: BTreeMap<String, String>,
    canned: HashMap<String, String>,
    write_log: Vec<String>,
    ask_log: Vec<String>,
    pending_reply: Option<String>,
    arm_command: Option<String>,
    completion_delay: Duration,
    completes_at: Option<Instant>,
    srq_pending: bool,
    event_pending: bool,
    esr_latched: bool,
    esr: u8,
    stale_events: u32,
    status_overrides: VecDeque<u8>,
}

impl MockState {
    fn completed(&self) -> bool {
        matches!(self.completes_at, Some(t) if Instant::now() >= t)
    }

    // OPC latches once per completed measurement
    fn latch_esr_opc(&mut self) {
        if !self.esr_latched {
            self.esr |= ESR_OPC;
            self.esr_latched = true;
        }
    }
}

/// Scripted SCPI instrument simulator implementing [`Transport`].
pub struct MockTransport {
    name: String,
    state: Mutex<MockState>,
    error_flag: AtomicBool,
}

impl MockTransport {
    /// A fresh simulator with an empty register map.
    pub fn new(name: impl Into<String>) -> Self {
        MockTransport {
            name: name.into(),
            state: Mutex::new(MockState::default()),
            error_flag: AtomicBool::new(false),
        }
    }

    /// Preload a register, as if `NAME value` had been written.
    pub fn with_register(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.state.lock().registers.insert(name.into(), value.into());
        self
    }

    /// Fix the reply for one query verbatim (for `*IDN?`, block fetches,
    /// anything the register pattern cannot express).
    pub fn with_reply(self, query: impl Into<String>, reply: impl Into<String>) -> Self {
        self.state.lock().canned.insert(query.into(), reply.into());
        self
    }

    /// Writing `command` later starts a measurement that completes after
    /// `delay`, raising SRQ and the OPC event bit.
    pub fn with_arm(self, command: impl Into<String>, delay: Duration) -> Self {
        let mut st = self.state.lock();
        st.arm_command = Some(command.into());
        st.completion_delay = delay;
        drop(st);
        self
    }

    /// Current value of a register, if any write has set it.
    pub fn register(&self, name: &str) -> Option<String> {
        self.state.lock().registers.get(name).cloned()
    }

    /// Commands written so far (queries excluded).
    pub fn write_log(&self) -> Vec<String> {
        self.state.lock().write_log.clone()
    }

    /// Queries asked so far.
    pub fn ask_log(&self) -> Vec<String> {
        self.state.lock().ask_log.clone()
    }

    /// Total number of commands and queries issued.
    pub fn io_count(&self) -> usize {
        let st = self.state.lock();
        st.write_log.len() + st.ask_log.len()
    }

    /// Number of times `command` was written.
    pub fn writes_of(&self, command: &str) -> usize {
        self.state
            .lock()
            .write_log
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    /// Queue a stale service-request event, as left behind by an aborted
    /// previous acquisition.
    pub fn inject_stale_event(&self) {
        self.state.lock().stale_events += 1;
    }

    /// Queue one scripted status byte, served before the schedule-driven
    /// ones.
    pub fn inject_status(&self, status: u8) {
        self.state.lock().status_overrides.push_back(status);
    }

    /// Latch the OPC bit in the event status register.
    pub fn inject_esr_opc(&self) {
        self.state.lock().esr |= ESR_OPC;
    }

    /// Flip the transport fault flag observed by `error_state`.
    pub fn set_error_state(&self, faulted: bool) {
        self.error_flag.store(faulted, Ordering::SeqCst);
    }

    fn reply_for(st: &mut MockState, query: &str) -> Result<String> {
        if let Some(r) = st.canned.get(query) {
            return Ok(r.clone());
        }
        match query {
            "*IDN?" => Ok("MockWorks,sim100,0,1.0".to_string()),
            "*ESR?" => {
                let v = st.esr;
                st.esr = 0;
                Ok(v.to_string())
            }
            "SYSTem:ERRor?" => Ok("0,\"No error\"".to_string()),
            _ => {
                let base = query.trim_end_matches('?');
                st.registers.get(base).cloned().ok_or_else(|| {
                    InstrError::transport(format!("mock has no reply for '{query}'"))
                })
            }
        }
    }

    fn handle_write(st: &mut MockState, command: &str) {
        if st.arm_command.as_deref() == Some(command) {
            st.completes_at = Some(Instant::now() + st.completion_delay);
            st.srq_pending = true;
            st.event_pending = true;
            st.esr_latched = false;
            return;
        }
        match command {
            "*CLS" => {
                st.esr = 0;
                st.stale_events = 0;
                st.status_overrides.clear();
            }
            c if c.starts_with('*') => {}
            c => {
                if let Some((name, value)) = c.split_once(' ') {
                    st.registers.insert(name.to_string(), value.to_string());
                }
            }
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn description(&self) -> String {
        format!("mock transport '{}'", self.name)
    }

    async fn write(&self, command: &str) -> Result<()> {
        let mut st = self.state.lock();
        if command.contains('?') {
            st.ask_log.push(command.to_string());
            let reply = Self::reply_for(&mut st, command)?;
            st.pending_reply = Some(reply);
        } else {
            st.write_log.push(command.to_string());
            Self::handle_write(&mut st, command);
        }
        Ok(())
    }

    async fn read(&self) -> Result<String> {
        self.state
            .lock()
            .pending_reply
            .take()
            .ok_or_else(|| InstrError::transport("mock read with no pending reply"))
    }

    async fn read_status_byte(&self) -> Result<u8> {
        let mut st = self.state.lock();
        if let Some(status) = st.status_overrides.pop_front() {
            return Ok(status);
        }
        if st.completed() && st.srq_pending {
            st.srq_pending = false;
            st.latch_esr_opc();
            return Ok(STB_COMPLETE);
        }
        Ok(0)
    }

    async fn wait_on_event(&self, _kind: EventKind, timeout: Duration) -> Result<bool> {
        let wait_until = {
            let mut st = self.state.lock();
            if st.stale_events > 0 {
                st.stale_events -= 1;
                return Ok(true);
            }
            if st.completed() && st.event_pending {
                st.event_pending = false;
                st.latch_esr_opc();
                return Ok(true);
            }
            st.completes_at
        };
        match wait_until {
            Some(t) => {
                let now = Instant::now();
                if t.saturating_duration_since(now) <= timeout {
                    tokio::time::sleep(t.saturating_duration_since(now)).await;
                    let mut st = self.state.lock();
                    if st.event_pending {
                        st.event_pending = false;
                        st.latch_esr_opc();
                        return Ok(true);
                    }
                    Ok(false)
                } else {
                    tokio::time::sleep(timeout).await;
                    Ok(false)
                }
            }
            None => {
                tokio::time::sleep(timeout).await;
                Ok(false)
            }
        }
    }

    fn error_state(&self) -> bool {
        self.error_flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_round_trip() {
        let t = MockTransport::new("sim");
        t.write("FREQuency 1000").await.unwrap();
        assert_eq!(t.ask("FREQuency?").await.unwrap(), "1000");
        assert_eq!(t.register("FREQuency").unwrap(), "1000");
    }

    #[tokio::test]
    async fn arm_raises_srq_once_after_delay() {
        let t = MockTransport::new("sim").with_arm("INITiate;*OPC", Duration::from_millis(20));
        assert_eq!(t.read_status_byte().await.unwrap(), 0);
        t.write("INITiate;*OPC").await.unwrap();
        assert_eq!(t.read_status_byte().await.unwrap(), 0);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(t.read_status_byte().await.unwrap(), STB_COMPLETE);
        // consumed on read
        assert_eq!(t.read_status_byte().await.unwrap(), 0);
        // OPC bit stays latched until *ESR? reads it
        assert_eq!(t.ask("*ESR?").await.unwrap(), "1");
        assert_eq!(t.ask("*ESR?").await.unwrap(), "0");
    }

    #[tokio::test]
    async fn stale_events_drain() {
        let t = MockTransport::new("sim");
        t.inject_stale_event();
        assert!(t
            .wait_on_event(EventKind::ServiceRequest, Duration::ZERO)
            .await
            .unwrap());
        assert!(!t
            .wait_on_event(EventKind::ServiceRequest, Duration::ZERO)
            .await
            .unwrap());
    }
}
