//! Instrument aggregate and the 4-level asynchronous acquisition protocol.
//!
//! An [`Instrument`] owns one transport exclusively, a fixed table of
//! devices, and a single async-cycle slot. Sweep-style callers drive the
//! slot through four numbered levels, calling each level once per
//! instrument per sweep point:
//!
//! | level | name       | effect                                        |
//! |-------|------------|-----------------------------------------------|
//! | 0     | Setup      | queue a device read into the pending cycle    |
//! | 1     | Started    | spawn the background acquisition task         |
//! | 2     | Waiting    | block until the cycle completes               |
//! | 3     | Collecting | pop the next result, FIFO                     |
//!
//! Because every instrument's cycle runs on its own task, the waits of many
//! instruments overlap and a sweep point costs about the slowest
//! instrument, not the sum.
//!
//! Transitions other than `N -> N+1` are rejected, with these exceptions:
//! `Setup` and `Started` may be repeated within a cycle, `Waiting` is
//! idempotent while the cycle's results are still held, and `Collecting`
//! is legal from any state. Once `Waiting` returns, the level drops back to
//! idle: a fresh `Setup` may start the next cycle, discarding any results
//! the previous one left uncollected. A rejected transition cancels the
//! in-flight task, resets the slot to idle, and surfaces
//! [`InstrError::AsyncOrdering`], so one confused caller cannot wedge the
//! instrument for the rest of a sweep.

use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::codec::Value;
use crate::device::{AutoInit, Device, DeviceMetadata, IoCtx, Options};
use crate::error::{InstrError, Result};
use crate::task::{AcqOp, AcqTask, CancelFlag};
use crate::transport::Transport;

/// Poll period while blocked on a running cycle.
const WAIT_SLICE: Duration = Duration::from_millis(20);

/// Minimum spacing between two `force_get` passes.
const FORCE_GET_SPACING: Duration = Duration::from_secs(2);

/// The numbered protocol levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum AsyncLevel {
    /// No cycle in progress.
    Idle = -1,
    /// Queuing device reads.
    Setup = 0,
    /// Background task running.
    Started = 1,
    /// Cycle finished, results held.
    Waiting = 2,
    /// Results being handed out.
    Collecting = 3,
}

impl fmt::Display for AsyncLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AsyncLevel::Idle => "Idle",
            AsyncLevel::Setup => "Setup",
            AsyncLevel::Started => "Started",
            AsyncLevel::Waiting => "Waiting",
            AsyncLevel::Collecting => "Collecting",
        };
        write!(f, "{name}({})", *self as i8)
    }
}

/// Trigger seam for instruments whose measurements must be armed and whose
/// completion must be detected. The default, [`SyncReady`], is for hardware
/// that is simply ready when read.
#[async_trait]
pub trait TriggerHooks: Send + Sync {
    /// Arm the measurement. Called exactly once per cycle.
    async fn arm(&self, transport: &dyn Transport) -> Result<()>;

    /// Check for completion, waiting at most `max_wait`. `false` means not
    /// yet; the engine calls again. Timeouts are not errors.
    async fn detect(&self, transport: &dyn Transport, max_wait: Duration) -> Result<bool>;
}

/// No-op hooks: nothing to arm, always complete.
pub struct SyncReady;

#[async_trait]
impl TriggerHooks for SyncReady {
    async fn arm(&self, _transport: &dyn Transport) -> Result<()> {
        Ok(())
    }

    async fn detect(&self, _transport: &dyn Transport, _max_wait: Duration) -> Result<bool> {
        Ok(true)
    }
}

/// Callback invoked while a blocking wait polls, so an embedding event loop
/// can keep servicing itself. Default is no callback.
pub type YieldPoint = Arc<dyn Fn() + Send + Sync>;

struct RunningTask {
    cancel: Arc<CancelFlag>,
    join: JoinHandle<Result<Vec<Value>>>,
}

struct AsyncSlot {
    level: AsyncLevel,
    pending: Vec<AcqOp>,
    use_hooks: bool,
    use_delay: bool,
    queued: usize,
    task: Option<RunningTask>,
    results: Option<Result<Vec<Value>>>,
    cursor: usize,
}

impl AsyncSlot {
    fn new() -> Self {
        AsyncSlot {
            level: AsyncLevel::Idle,
            pending: Vec::new(),
            use_hooks: false,
            use_delay: false,
            queued: 0,
            task: None,
            results: None,
            cursor: 0,
        }
    }

    fn clear(&mut self) {
        self.level = AsyncLevel::Idle;
        self.pending.clear();
        self.use_hooks = false;
        self.use_delay = false;
        self.queued = 0;
        self.results = None;
        self.cursor = 0;
    }

    /// Open a fresh cycle at `Setup`, dropping everything the previous one
    /// left behind (uncollected results, trigger/delay requirements).
    fn begin_cycle(&mut self) {
        self.use_hooks = false;
        self.use_delay = false;
        self.queued = 0;
        self.results = None;
        self.cursor = 0;
        self.level = AsyncLevel::Setup;
    }
}

struct InstrumentCore {
    name: String,
    transport: Arc<dyn Transport>,
    hooks: Arc<dyn TriggerHooks>,
    devices: Arc<HashMap<String, Arc<Device>>>,
    // selector name -> devices whose option defaults track it
    dependents: HashMap<String, Vec<String>>,
    slot: tokio::sync::Mutex<AsyncSlot>,
    delay_warned: AtomicBool,
    yield_point: Option<YieldPoint>,
    last_force: parking_lot::Mutex<Option<Instant>>,
}

impl InstrumentCore {
    fn io_ctx(&self) -> IoCtx<'_> {
        IoCtx {
            instrument: &self.name,
            transport: self.transport.as_ref(),
            peers: &self.devices,
        }
    }

    /// Drop the caches of every device whose option defaults track
    /// `selector`; their effective command no longer matches what the
    /// cached value was read with.
    fn invalidate_dependents(&self, selector: &str) {
        if let Some(deps) = self.dependents.get(selector) {
            for name in deps {
                if let Some(dep) = self.devices.get(name) {
                    dep.invalidate_cache();
                }
            }
        }
    }

    async fn violate(&self, slot: &mut AsyncSlot, detail: String) -> InstrError {
        if let Some(rt) = slot.task.take() {
            rt.cancel.cancel();
            let _ = rt.join.await;
        }
        slot.clear();
        InstrError::AsyncOrdering {
            instrument: self.name.clone(),
            detail,
        }
    }

    /// Block until the running task finishes and stash its outcome. No-op
    /// when nothing is running.
    async fn harvest(&self, slot: &mut AsyncSlot) {
        let Some(rt) = slot.task.take() else { return };
        let mut aborted = false;
        while !rt.join.is_finished() {
            if !aborted && self.transport.error_state() {
                rt.cancel.cancel();
                aborted = true;
            }
            if let Some(yield_point) = &self.yield_point {
                yield_point();
            }
            tokio::time::sleep(WAIT_SLICE).await;
        }
        let outcome = match rt.join.await {
            Ok(r) => r,
            Err(e) => Err(InstrError::AsyncTask(e.to_string())),
        };
        let outcome = if aborted && outcome.is_ok() {
            Err(InstrError::transport(format!(
                "{}: transport reported an error state during the cycle",
                self.name
            )))
        } else {
            outcome
        };
        slot.results = Some(outcome);
    }

    fn async_delay(&self) -> Duration {
        let secs = self
            .devices
            .get("async_delay")
            .and_then(|d| d.cached())
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        Duration::from_secs_f64(secs.max(0.0))
    }

    fn spawn_cycle(&self, slot: &mut AsyncSlot) {
        let ops = std::mem::take(&mut slot.pending);
        slot.queued = ops.len();
        let delay = if slot.use_delay {
            let d = self.async_delay();
            if d.is_zero() && !self.delay_warned.swap(true, Ordering::SeqCst) {
                warn!(
                    "{}: a queued device requires a settling delay but async_delay is 0",
                    self.name
                );
            }
            d
        } else {
            Duration::ZERO
        };
        let cancel = Arc::new(CancelFlag::new());
        let task = AcqTask {
            instrument: self.name.clone(),
            transport: self.transport.clone(),
            hooks: slot.use_hooks.then(|| self.hooks.clone()),
            delay,
            ops,
            peers: self.devices.clone(),
            cancel: cancel.clone(),
        };
        slot.task = Some(RunningTask {
            cancel,
            join: tokio::spawn(task.run()),
        });
    }

    async fn dispatch(
        &self,
        level: AsyncLevel,
        device: &Arc<Device>,
        options: Options,
    ) -> Result<Option<Value>> {
        let mut guard = self.slot.lock().await;
        let slot: &mut AsyncSlot = &mut guard;
        match level {
            AsyncLevel::Idle => {
                // request for the idle level is the explicit cancel path
                if let Some(rt) = slot.task.take() {
                    rt.cancel.cancel();
                    let _ = rt.join.await;
                }
                slot.clear();
                Ok(None)
            }
            AsyncLevel::Setup => {
                if !device.can_get() {
                    return Err(InstrError::not_supported(
                        format!("{}.{}", self.name, device.name()),
                        "get",
                    ));
                }
                match slot.level {
                    AsyncLevel::Idle => {
                        // a fresh cycle drops anything a previous one left
                        slot.begin_cycle();
                    }
                    AsyncLevel::Setup => {}
                    from => {
                        let detail = format!("Setup(0) requested at {from}");
                        return Err(self.violate(slot, detail).await);
                    }
                }
                slot.use_hooks |= device.trig();
                slot.use_delay |= device.delay();
                slot.pending.push(AcqOp {
                    device: device.clone(),
                    options,
                });
                Ok(None)
            }
            AsyncLevel::Started => match slot.level {
                AsyncLevel::Setup => {
                    self.spawn_cycle(slot);
                    slot.level = AsyncLevel::Started;
                    debug!("{}: cycle started, {} read(s) queued", self.name, slot.queued);
                    Ok(None)
                }
                // idempotent within the same cycle
                AsyncLevel::Started => Ok(None),
                from => {
                    let detail = format!("Started(1) requested at {from}");
                    Err(self.violate(slot, detail).await)
                }
            },
            AsyncLevel::Waiting => match slot.level {
                AsyncLevel::Started => {
                    self.harvest(slot).await;
                    // the cycle is over: drop back so a fresh Setup can
                    // follow; the results stay held for Collecting
                    slot.level = AsyncLevel::Idle;
                    slot.cursor = 0;
                    Ok(None)
                }
                // idempotent while the cycle's results are still held
                _ if slot.results.is_some() => Ok(None),
                from => {
                    let detail = format!("Waiting(2) requested at {from}");
                    Err(self.violate(slot, detail).await)
                }
            },
            AsyncLevel::Collecting => {
                if slot.results.is_none() && slot.task.is_some() {
                    self.harvest(slot).await;
                }
                let served = match &slot.results {
                    None => {
                        let detail =
                            format!("Collecting(3) with no acquisition cycle (at {})", slot.level);
                        return Err(self.violate(slot, detail).await);
                    }
                    Some(Ok(values)) if slot.cursor >= values.len() => None,
                    Some(Ok(values)) => Some(Ok(values[slot.cursor].clone())),
                    Some(Err(e)) => Some(Err(e.clone())),
                };
                let Some(outcome) = served else {
                    let detail = "Collecting(3) with no results remaining".to_string();
                    return Err(self.violate(slot, detail).await);
                };
                slot.cursor += 1;
                let total = match &slot.results {
                    Some(Ok(values)) => values.len(),
                    _ => slot.queued.max(1),
                };
                if slot.cursor >= total {
                    slot.clear();
                } else {
                    slot.level = AsyncLevel::Collecting;
                }
                outcome.map(Some)
            }
        }
    }

    /// Let an in-flight cycle finish before foreground I/O touches the
    /// transport. The harvested results stay available for the protocol.
    async fn wait_for_cycle(&self) {
        let mut slot = self.slot.lock().await;
        if slot.task.is_some() {
            self.harvest(&mut slot).await;
        }
    }
}

/// A named instrument: one transport, a device table, one async slot.
#[derive(Clone)]
pub struct Instrument {
    core: Arc<InstrumentCore>,
}

impl Instrument {
    /// Start building an instrument around an open transport.
    pub fn builder(name: impl Into<String>, transport: Arc<dyn Transport>) -> InstrumentBuilder {
        InstrumentBuilder {
            name: name.into(),
            transport,
            hooks: Arc::new(SyncReady),
            devices: Vec::new(),
            yield_point: None,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.core.transport
    }

    /// Handle to a device by name.
    pub fn device(&self, name: &str) -> Result<DeviceHandle> {
        let dev = self
            .core
            .devices
            .get(name)
            .ok_or_else(|| InstrError::NoSuchDevice {
                instrument: self.core.name.clone(),
                device: name.to_string(),
            })?;
        Ok(DeviceHandle {
            core: self.core.clone(),
            dev: dev.clone(),
        })
    }

    /// Metadata for every registered device, for help text and headers.
    pub fn metadata(&self) -> Vec<DeviceMetadata> {
        let mut all: Vec<_> = self.core.devices.values().map(|d| d.metadata()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// The device table as JSON, for data-file headers.
    pub fn metadata_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self.metadata())
            .map_err(|e| InstrError::Decode(format!("metadata serialization failed: {e}")))
    }

    /// Query the identification string (`*IDN?`).
    pub async fn idn(&self) -> Result<String> {
        self.core.transport.ask("*IDN?").await
    }

    /// Pop one entry from the instrument error queue (`SYSTem:ERRor?`).
    pub async fn get_error(&self) -> Result<String> {
        self.core.transport.ask("SYSTem:ERRor?").await
    }

    /// Send a raw command; queries (containing `?`) return their reply.
    pub async fn ask_write(&self, command: &str) -> Result<Option<String>> {
        if command.contains('?') {
            Ok(Some(self.core.transport.ask(command).await?))
        } else {
            self.core.transport.write(command).await?;
            Ok(None)
        }
    }

    /// Refresh every autoinit device from hardware, highest priority first.
    /// Devices whose value is currently unobtainable are skipped. Repeat
    /// calls within 2 s are no-ops.
    pub async fn force_get(&self) -> Result<()> {
        {
            let mut last = self.core.last_force.lock();
            if matches!(*last, Some(t) if t.elapsed() < FORCE_GET_SPACING) {
                return Ok(());
            }
            *last = Some(Instant::now());
        }
        let mut targets: Vec<_> = self
            .core
            .devices
            .values()
            .filter(|d| d.can_get())
            .filter_map(|d| d.autoinit().priority().map(|p| (p, d.clone())))
            .collect();
        targets.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.name().cmp(b.1.name())));
        self.core.wait_for_cycle().await;
        let ctx = self.core.io_ctx();
        for (_, dev) in targets {
            match dev.raw_read(&ctx, &Options::new()).await {
                Ok(_) => {}
                Err(InstrError::InvalidAutoArgument { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Cancel any in-flight cycle and reset the protocol to idle.
    pub async fn reset_async(&self) {
        let mut slot = self.core.slot.lock().await;
        if let Some(rt) = slot.task.take() {
            rt.cancel.cancel();
            let _ = rt.join.await;
        }
        slot.clear();
    }

    /// Current protocol level.
    pub async fn async_level(&self) -> AsyncLevel {
        self.core.slot.lock().await.level
    }

    /// Set the pre-read settling delay, in seconds.
    pub fn set_async_delay(&self, seconds: f64) -> Result<()> {
        let dev = self
            .core
            .devices
            .get("async_delay")
            .ok_or_else(|| InstrError::NoSuchDevice {
                instrument: self.core.name.clone(),
                device: "async_delay".to_string(),
            })?;
        let v = dev.check_value(&self.core.name, &Value::Float(seconds))?;
        dev.set_cache(v);
        self.core.invalidate_dependents("async_delay");
        Ok(())
    }
}

/// Builder for [`Instrument`].
pub struct InstrumentBuilder {
    name: String,
    transport: Arc<dyn Transport>,
    hooks: Arc<dyn TriggerHooks>,
    devices: Vec<Arc<Device>>,
    yield_point: Option<YieldPoint>,
}

impl InstrumentBuilder {
    /// Install trigger hooks (default: [`SyncReady`]).
    pub fn hooks(mut self, hooks: Arc<dyn TriggerHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Register a device.
    pub fn device(mut self, device: Arc<Device>) -> Self {
        self.devices.push(device);
        self
    }

    /// Install a callback invoked while blocking waits poll.
    pub fn yield_point(mut self, f: YieldPoint) -> Self {
        self.yield_point = Some(f);
        self
    }

    /// Finish construction. An `async_delay` device (seconds, float) is
    /// registered automatically unless one was provided.
    pub fn build(self) -> Instrument {
        let mut devices: HashMap<String, Arc<Device>> = self
            .devices
            .into_iter()
            .map(|d| (d.name().to_string(), d))
            .collect();
        devices.entry("async_delay".to_string()).or_insert_with(|| {
            Device::memory("async_delay", Value::Float(0.0))
                .doc("Settling delay before async reads, in seconds.")
                .range(0.0, 3600.0)
                .build()
        });
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for dev in devices.values() {
            for selector in dev.option_device_refs() {
                dependents
                    .entry(selector)
                    .or_default()
                    .push(dev.name().to_string());
            }
        }
        Instrument {
            core: Arc::new(InstrumentCore {
                name: self.name,
                transport: self.transport,
                hooks: self.hooks,
                devices: Arc::new(devices),
                dependents,
                slot: tokio::sync::Mutex::new(AsyncSlot::new()),
                delay_warned: AtomicBool::new(false),
                yield_point: self.yield_point,
                last_force: parking_lot::Mutex::new(None),
            }),
        }
    }
}

/// Non-owning view pairing a device with its instrument; all user-facing
/// operations go through here.
#[derive(Clone)]
pub struct DeviceHandle {
    core: Arc<InstrumentCore>,
    dev: Arc<Device>,
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("instrument", &self.core.name)
            .field("device", &self.dev.name())
            .finish()
    }
}

impl DeviceHandle {
    /// The underlying device.
    pub fn device(&self) -> &Arc<Device> {
        &self.dev
    }

    /// Fully qualified `instrument.device` name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.core.name, self.dev.name())
    }

    /// Validate and normalize a candidate value. No I/O.
    pub fn check(&self, value: &Value) -> Result<Value> {
        self.dev.check_value(&self.core.name, value)
    }

    /// Read the value from hardware. If an async cycle is in flight the
    /// read waits for it to finish rather than interleaving I/O.
    pub async fn get(&self) -> Result<Value> {
        self.get_with(Options::new()).await
    }

    /// [`get`](DeviceHandle::get) with per-call options.
    pub async fn get_with(&self, options: Options) -> Result<Value> {
        self.core.wait_for_cycle().await;
        let ctx = self.core.io_ctx();
        self.dev.raw_read(&ctx, &options).await
    }

    /// Write a value: validate first (a rejected value performs no I/O),
    /// then write, then re-read if the device is `setget`.
    pub async fn set(&self, value: impl Into<Value>) -> Result<()> {
        self.set_with(value, Options::new()).await
    }

    /// [`set`](DeviceHandle::set) with per-call options.
    pub async fn set_with(&self, value: impl Into<Value>, options: Options) -> Result<()> {
        let value = value.into();
        if !self.dev.can_set() {
            return Err(InstrError::not_supported(self.full_name(), "set"));
        }
        let normalized = self.check(&value)?;
        self.core.wait_for_cycle().await;
        let ctx = self.core.io_ctx();
        self.dev.raw_write(&ctx, &normalized, &options).await?;
        if self.dev.setget() {
            self.dev.raw_read(&ctx, &options).await?;
        }
        self.core.invalidate_dependents(self.dev.name());
        Ok(())
    }

    /// Last known value. On a cache miss, autoinit devices read from
    /// hardware; a currently-unobtainable value yields `None` rather than
    /// an error.
    pub async fn getcache(&self) -> Result<Option<Value>> {
        if let Some(v) = self.dev.cached() {
            return Ok(Some(v));
        }
        if self.dev.autoinit() == AutoInit::Off || !self.dev.can_get() {
            return Ok(None);
        }
        match self.get().await {
            Ok(v) => Ok(Some(v)),
            Err(InstrError::InvalidAutoArgument { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Overwrite the cache without touching hardware. The value is still
    /// validated.
    pub fn setcache(&self, value: impl Into<Value>) -> Result<()> {
        let normalized = self.check(&value.into())?;
        self.dev.set_cache(normalized);
        self.core.invalidate_dependents(self.dev.name());
        Ok(())
    }

    /// Drive the async protocol for this device.
    ///
    /// Levels `Setup`, `Started` and `Waiting` return `None`; `Collecting`
    /// returns this cycle's next queued result.
    pub async fn getasync(&self, level: AsyncLevel) -> Result<Option<Value>> {
        self.getasync_with(level, Options::new()).await
    }

    /// [`getasync`](DeviceHandle::getasync) with per-call options (used at
    /// `Setup`, where the read is queued).
    pub async fn getasync_with(&self, level: AsyncLevel, options: Options) -> Result<Option<Value>> {
        self.core.dispatch(level, &self.dev, options).await
    }

    /// Serializable device description.
    pub fn metadata(&self) -> DeviceMetadata {
        self.dev.metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    fn simple_instrument() -> (Instrument, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new("sim").with_register("READ", "42"));
        let instr = Instrument::builder("sim1", transport.clone())
            .device(Device::scpi_get("readval", "READ?").build())
            .device(Device::scpi("freq", "FREQuency").range(0.0, 1e9).build())
            .build();
        (instr, transport)
    }

    #[tokio::test]
    async fn async_delay_is_auto_registered() {
        let (instr, _) = simple_instrument();
        let delay = instr.device("async_delay").unwrap();
        assert_eq!(delay.getcache().await.unwrap(), Some(Value::Float(0.0)));
        instr.set_async_delay(0.5).unwrap();
        assert_eq!(delay.getcache().await.unwrap(), Some(Value::Float(0.5)));
    }

    #[tokio::test]
    async fn metadata_json_lists_devices() {
        let (instr, _) = simple_instrument();
        let json = instr.metadata_json().unwrap();
        let names: Vec<_> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["async_delay", "freq", "readval"]);
        assert_eq!(json[1]["max"], 1e9);
    }

    #[tokio::test]
    async fn unknown_device_is_an_error() {
        let (instr, _) = simple_instrument();
        let err = instr.device("nope").unwrap_err();
        assert!(matches!(err, InstrError::NoSuchDevice { .. }));
    }

    #[tokio::test]
    async fn set_on_read_only_device_does_no_io() {
        let (instr, transport) = simple_instrument();
        let dev = instr.device("readval").unwrap();
        let before = transport.io_count();
        let err = dev.set(Value::Float(1.0)).await.unwrap_err();
        assert!(matches!(err, InstrError::NotSupported { .. }));
        assert_eq!(transport.io_count(), before);
    }

    #[tokio::test]
    async fn idn_and_ask_write() {
        let (instr, transport) = simple_instrument();
        assert_eq!(instr.idn().await.unwrap(), "MockWorks,sim100,0,1.0");
        assert_eq!(
            instr.ask_write("FREQuency 250").await.unwrap(),
            None
        );
        assert_eq!(
            instr.ask_write("FREQuency?").await.unwrap(),
            Some("250".to_string())
        );
        assert_eq!(transport.register("FREQuency").unwrap(), "250");
    }
}
