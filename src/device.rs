//! Device abstraction: one controllable or readable property of an
//! instrument.
//!
//! A [`Device`] bundles a value type, optional bounds or choices, a cache of
//! the last known value, and one of three I/O kinds:
//!
//! - [`DeviceKind::Memory`] — a software variable with no hardware behind it,
//! - [`DeviceKind::Scpi`] — command templates rendered per call, with `{val}`
//!   and option substitution,
//! - [`DeviceKind::Custom`] — arbitrary I/O through the [`DeviceIo`] trait.
//!
//! Devices are built with [`DeviceBuilder`] and registered on an instrument;
//! all user-facing operations (`get`, `set`, `check`, caching, async
//! queuing) go through the handle the instrument hands out. This module
//! holds only the device-local pieces: validation, option resolution,
//! template rendering, and the raw read/write primitives.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::codec::{self, BlockFormat, ChoiceSet, Value, ValueType};
use crate::error::{InstrError, Result};
use crate::transport::Transport;

/// Per-call option values, e.g. `{"ch": Int(2)}` for a channel selector.
pub type Options = BTreeMap<String, Value>;

/// Whether `getcache` on an empty cache performs a hardware read, and with
/// what priority `force_get` refreshes the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AutoInit {
    /// Cache misses return an error instead of touching hardware.
    Off,
    /// Cache misses trigger a read; higher priorities refresh first.
    Priority(u32),
}

impl AutoInit {
    /// Numeric priority, `None` when off.
    pub fn priority(self) -> Option<u32> {
        match self {
            AutoInit::Off => None,
            AutoInit::Priority(p) => Some(p),
        }
    }
}

/// Default value of an option not supplied at call time.
#[derive(Debug, Clone)]
pub enum OptionSource {
    /// A fixed value.
    Const(Value),
    /// The cached value of another device on the same instrument.
    Device(String),
}

/// Constraint an effective option value must satisfy; violation means the
/// device's value is not currently obtainable (`InvalidAutoArgument`).
#[derive(Debug, Clone)]
pub enum OptionLim {
    /// Numeric range, either bound optional.
    Range { min: Option<f64>, max: Option<f64> },
    /// Membership in a choice set.
    Choices(ChoiceSet),
}

/// SCPI command templates for a device.
#[derive(Debug, Clone, Default)]
pub struct ScpiSpec {
    /// Write template. `{val}` marks where the value goes; without it the
    /// wire value is appended after a space. `None` makes the device
    /// read-only.
    pub set_fmt: Option<String>,
    /// Query template. `None` makes the device write-only.
    pub get_cmd: Option<String>,
    /// Defaults for options the templates reference.
    pub option_defaults: BTreeMap<String, OptionSource>,
    /// Constraints on effective option values.
    pub option_lims: BTreeMap<String, OptionLim>,
}

/// Custom I/O behavior for devices the SCPI template scheme cannot express.
#[async_trait]
pub trait DeviceIo: Send + Sync {
    /// Whether the device can be read.
    fn can_read(&self) -> bool {
        true
    }

    /// Whether the device can be written.
    fn can_write(&self) -> bool {
        false
    }

    /// Perform the hardware read.
    async fn read(&self, ctx: &IoCtx<'_>, options: &Options) -> Result<Value>;

    /// Perform the hardware write.
    async fn write(&self, _ctx: &IoCtx<'_>, _value: &Value, _options: &Options) -> Result<()> {
        Err(InstrError::not_supported("custom device", "write"))
    }
}

/// I/O kind of a device.
pub enum DeviceKind {
    /// Software variable, no hardware I/O.
    Memory,
    /// Template-driven SCPI I/O.
    Scpi(ScpiSpec),
    /// Arbitrary I/O.
    Custom(Box<dyn DeviceIo>),
}

impl fmt::Debug for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Memory => f.write_str("Memory"),
            DeviceKind::Scpi(spec) => f.debug_tuple("Scpi").field(spec).finish(),
            DeviceKind::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// What a device's I/O can see: the owning instrument's name, its transport,
/// and its sibling devices (for option defaults that track a selector).
pub struct IoCtx<'a> {
    /// Instrument display name, for error messages.
    pub instrument: &'a str,
    /// The instrument's transport.
    pub transport: &'a dyn Transport,
    /// Sibling devices by name.
    pub peers: &'a HashMap<String, Arc<Device>>,
}

/// Serializable description of a device, for help text and file headers.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceMetadata {
    /// Device name.
    pub name: String,
    /// One-line documentation.
    pub doc: String,
    /// Wire type name.
    pub type_name: String,
    /// Lower bound, if any.
    pub min: Option<f64>,
    /// Upper bound, if any.
    pub max: Option<f64>,
    /// Allowed choices, if enumerated.
    pub choices: Option<Vec<String>>,
    /// Autoinit priority, `None` when off.
    pub autoinit: Option<u32>,
    /// Whether `set` re-reads the value afterwards.
    pub setget: bool,
    /// Whether an async read of this device requires the trigger step.
    pub trig: bool,
    /// Whether an async read of this device requires the pre-read delay.
    pub delay: bool,
    /// Whether the device is readable.
    pub can_get: bool,
    /// Whether the device is writable.
    pub can_set: bool,
}

/// One named, typed property of an instrument.
#[derive(Debug)]
pub struct Device {
    name: String,
    doc: String,
    kind: DeviceKind,
    vtype: ValueType,
    min: Option<f64>,
    max: Option<f64>,
    autoinit: AutoInit,
    setget: bool,
    trig: bool,
    delay: bool,
    cache: Mutex<Option<Value>>,
}

impl Device {
    /// A software variable with an initial value; type inferred from it.
    pub fn memory(name: impl Into<String>, initial: Value) -> DeviceBuilder {
        let vtype = ValueType::of(&initial);
        DeviceBuilder {
            name: name.into(),
            doc: String::new(),
            kind: DeviceKind::Memory,
            vtype,
            min: None,
            max: None,
            autoinit: Some(AutoInit::Priority(10)),
            setget: false,
            trig: false,
            delay: false,
            initial: Some(initial),
        }
    }

    /// A SCPI device with a write template and the auto-derived query
    /// (`base` + `?`).
    pub fn scpi(name: impl Into<String>, base: impl Into<String>) -> DeviceBuilder {
        let base = base.into();
        let get_cmd = format!("{}?", base.replace(" {val}", "").trim_end());
        DeviceBuilder::scpi_kind(
            name.into(),
            ScpiSpec {
                set_fmt: Some(base),
                get_cmd: Some(get_cmd),
                ..ScpiSpec::default()
            },
        )
    }

    /// A read-only SCPI device.
    pub fn scpi_get(name: impl Into<String>, get_cmd: impl Into<String>) -> DeviceBuilder {
        DeviceBuilder::scpi_kind(
            name.into(),
            ScpiSpec {
                get_cmd: Some(get_cmd.into()),
                ..ScpiSpec::default()
            },
        )
    }

    /// A write-only SCPI device.
    pub fn scpi_set(name: impl Into<String>, set_fmt: impl Into<String>) -> DeviceBuilder {
        DeviceBuilder::scpi_kind(
            name.into(),
            ScpiSpec {
                set_fmt: Some(set_fmt.into()),
                ..ScpiSpec::default()
            },
        )
    }

    /// A device with custom I/O behavior.
    pub fn custom(name: impl Into<String>, io: Box<dyn DeviceIo>) -> DeviceBuilder {
        DeviceBuilder {
            name: name.into(),
            doc: String::new(),
            kind: DeviceKind::Custom(io),
            vtype: ValueType::Float,
            min: None,
            max: None,
            autoinit: None,
            setget: false,
            trig: false,
            delay: false,
            initial: None,
        }
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line documentation.
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Declared wire type.
    pub fn vtype(&self) -> &ValueType {
        &self.vtype
    }

    /// Autoinit policy.
    pub fn autoinit(&self) -> AutoInit {
        self.autoinit
    }

    /// Whether an async read of this device requires the trigger step.
    pub fn trig(&self) -> bool {
        self.trig
    }

    /// Whether an async read of this device requires the pre-read delay.
    pub fn delay(&self) -> bool {
        self.delay
    }

    /// Whether `set` re-reads the value after writing.
    pub fn setget(&self) -> bool {
        self.setget
    }

    /// Whether the device is readable.
    pub fn can_get(&self) -> bool {
        match &self.kind {
            DeviceKind::Memory => true,
            DeviceKind::Scpi(spec) => spec.get_cmd.is_some(),
            DeviceKind::Custom(io) => io.can_read(),
        }
    }

    /// Whether the device is writable.
    pub fn can_set(&self) -> bool {
        match &self.kind {
            DeviceKind::Memory => true,
            DeviceKind::Scpi(spec) => spec.set_fmt.is_some(),
            DeviceKind::Custom(io) => io.can_write(),
        }
    }

    /// Names of sibling devices whose cached value feeds this device's
    /// option defaults. Setting one of those invalidates this cache.
    pub fn option_device_refs(&self) -> Vec<String> {
        match &self.kind {
            DeviceKind::Scpi(spec) => spec
                .option_defaults
                .values()
                .filter_map(|s| match s {
                    OptionSource::Device(name) => Some(name.clone()),
                    OptionSource::Const(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Last known value, if any.
    pub fn cached(&self) -> Option<Value> {
        self.cache.lock().clone()
    }

    /// Overwrite the cache without touching hardware.
    pub fn set_cache(&self, value: Value) {
        *self.cache.lock() = Some(value);
    }

    /// Drop the cached value.
    pub fn invalidate_cache(&self) {
        *self.cache.lock() = None;
    }

    fn full_name(&self, instrument: &str) -> String {
        format!("{instrument}.{}", self.name)
    }

    /// Validate and normalize a candidate value against the device's type
    /// and bounds. Choices come back in canonical spelling; integers are
    /// widened for float devices. Performs no I/O.
    pub fn check_value(&self, instrument: &str, value: &Value) -> Result<Value> {
        let full = self.full_name(instrument);
        let mismatch = |got: &Value| InstrError::TypeMismatch {
            device: full.clone(),
            expected: self.vtype.type_name().to_string(),
            got: got.type_name().to_string(),
        };
        let normalized = match (&self.vtype, value) {
            (ValueType::Bool, Value::Bool(_)) => value.clone(),
            (ValueType::Int, Value::Int(_)) => value.clone(),
            (ValueType::Float, Value::Float(_)) => value.clone(),
            (ValueType::Float, Value::Int(v)) => Value::Float(*v as f64),
            (ValueType::Str, Value::Str(_)) => value.clone(),
            (ValueType::Choice(set), Value::Str(s)) => match set.canonical(s) {
                Some(c) => Value::Str(c.to_string()),
                None => {
                    return Err(InstrError::InvalidChoice {
                        device: full,
                        value: s.clone(),
                        choices: set.to_string(),
                    })
                }
            },
            (ValueType::Block(_), Value::Block(_)) => value.clone(),
            (_, v) => return Err(mismatch(v)),
        };
        if let Some(n) = normalized.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    return Err(InstrError::OutOfRange {
                        device: full,
                        value: normalized.to_string(),
                        bound: format!("below MIN={min}"),
                    });
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Err(InstrError::OutOfRange {
                        device: full,
                        value: normalized.to_string(),
                        bound: format!("above MAX={max}"),
                    });
                }
            }
        }
        Ok(normalized)
    }

    /// Serializable description for help text and file headers.
    pub fn metadata(&self) -> DeviceMetadata {
        DeviceMetadata {
            name: self.name.clone(),
            doc: self.doc.clone(),
            type_name: self.vtype.type_name().to_string(),
            min: self.min,
            max: self.max,
            choices: match &self.vtype {
                ValueType::Choice(set) => Some(set.values().to_vec()),
                _ => None,
            },
            autoinit: self.autoinit.priority(),
            setget: self.setget,
            trig: self.trig,
            delay: self.delay,
            can_get: self.can_get(),
            can_set: self.can_set(),
        }
    }

    fn render(&self, instrument: &str, fmt: &str, vars: &HashMap<String, String>) -> Result<String> {
        strfmt::strfmt(fmt, vars).map_err(|e| InstrError::Template {
            device: self.full_name(instrument),
            detail: e.to_string(),
        })
    }

    /// Merge option defaults with per-call overrides, validate them, and
    /// render each as its wire string for template substitution.
    fn resolve_options(
        &self,
        ctx: &IoCtx<'_>,
        spec: &ScpiSpec,
        options: &Options,
    ) -> Result<HashMap<String, String>> {
        let full = self.full_name(ctx.instrument);
        let mut effective: Options = BTreeMap::new();
        for (name, source) in &spec.option_defaults {
            let value = match source {
                OptionSource::Const(v) => v.clone(),
                OptionSource::Device(dev) => {
                    let peer = ctx.peers.get(dev).ok_or_else(|| InstrError::NoSuchDevice {
                        instrument: ctx.instrument.to_string(),
                        device: dev.clone(),
                    })?;
                    peer.cached().ok_or_else(|| InstrError::InvalidAutoArgument {
                        device: full.clone(),
                        detail: format!("option '{name}' tracks '{dev}' which has no cached value"),
                    })?
                }
            };
            effective.insert(name.clone(), value);
        }
        for (name, value) in options {
            effective.insert(name.clone(), value.clone());
        }
        for (name, lim) in &spec.option_lims {
            let value = effective.get(name).ok_or_else(|| {
                InstrError::InvalidAutoArgument {
                    device: full.clone(),
                    detail: format!("option '{name}' was not supplied"),
                }
            })?;
            let ok = match lim {
                OptionLim::Range { min, max } => match value.as_f64() {
                    Some(n) => min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m),
                    None => false,
                },
                OptionLim::Choices(set) => {
                    value.as_str().map(|s| set.contains(s)).unwrap_or(false)
                }
            };
            if !ok {
                return Err(InstrError::InvalidAutoArgument {
                    device: full,
                    detail: format!("option '{name}' = {value} is out of limits"),
                });
            }
        }
        let mut vars = HashMap::new();
        for (name, value) in &effective {
            let wire = match value {
                Value::Str(s) => s.clone(),
                other => other.to_string(),
            };
            vars.insert(name.clone(), wire);
        }
        Ok(vars)
    }

    /// Hardware read, unconditionally. Updates the cache on success. The
    /// caching / async-deferral policy lives on the instrument handle.
    pub async fn raw_read(&self, ctx: &IoCtx<'_>, options: &Options) -> Result<Value> {
        let full = self.full_name(ctx.instrument);
        let value = match &self.kind {
            DeviceKind::Memory => {
                return self
                    .cached()
                    .ok_or_else(|| InstrError::transport(format!("{full}: memory value missing")))
            }
            DeviceKind::Scpi(spec) => {
                let get_cmd = spec
                    .get_cmd
                    .as_ref()
                    .ok_or_else(|| InstrError::not_supported(full.clone(), "get"))?;
                let vars = self.resolve_options(ctx, spec, options)?;
                let cmd = self.render(ctx.instrument, get_cmd, &vars)?;
                match &self.vtype {
                    ValueType::Block(_) => {
                        let raw = ctx.transport.ask_raw(&cmd).await?;
                        codec::from_wire_bytes(&raw, &self.vtype)?
                    }
                    _ => {
                        let reply = ctx.transport.ask(&cmd).await?;
                        codec::from_wire(&reply, &self.vtype)?
                    }
                }
            }
            DeviceKind::Custom(io) => {
                if !io.can_read() {
                    return Err(InstrError::not_supported(full, "get"));
                }
                io.read(ctx, options).await?
            }
        };
        self.set_cache(value.clone());
        Ok(value)
    }

    /// Hardware write, unconditionally. The value must already have passed
    /// [`check_value`]. Updates the cache on success.
    ///
    /// [`check_value`]: Device::check_value
    pub async fn raw_write(&self, ctx: &IoCtx<'_>, value: &Value, options: &Options) -> Result<()> {
        let full = self.full_name(ctx.instrument);
        match &self.kind {
            DeviceKind::Memory => {}
            DeviceKind::Scpi(spec) => {
                let set_fmt = spec
                    .set_fmt
                    .as_ref()
                    .ok_or_else(|| InstrError::not_supported(full.clone(), "set"))?;
                let wire = codec::to_wire(value, &self.vtype)?;
                let mut vars = self.resolve_options(ctx, spec, options)?;
                let cmd = if set_fmt.contains("{val}") {
                    vars.insert("val".to_string(), wire);
                    self.render(ctx.instrument, set_fmt, &vars)?
                } else {
                    let head = self.render(ctx.instrument, set_fmt, &vars)?;
                    format!("{head} {wire}")
                };
                ctx.transport.write(&cmd).await?;
            }
            DeviceKind::Custom(io) => {
                if !io.can_write() {
                    return Err(InstrError::not_supported(full, "set"));
                }
                io.write(ctx, value, options).await?;
            }
        }
        self.set_cache(value.clone());
        Ok(())
    }
}

/// Fluent construction of a [`Device`], in the style of the parameter
/// builders elsewhere in the stack.
pub struct DeviceBuilder {
    name: String,
    doc: String,
    kind: DeviceKind,
    vtype: ValueType,
    min: Option<f64>,
    max: Option<f64>,
    autoinit: Option<AutoInit>,
    setget: bool,
    trig: bool,
    delay: bool,
    initial: Option<Value>,
}

impl DeviceBuilder {
    fn scpi_kind(name: String, spec: ScpiSpec) -> Self {
        let autoinit = if spec.get_cmd.is_some() {
            Some(AutoInit::Priority(1))
        } else {
            Some(AutoInit::Off)
        };
        DeviceBuilder {
            name,
            doc: String::new(),
            kind: DeviceKind::Scpi(spec),
            vtype: ValueType::Float,
            min: None,
            max: None,
            autoinit,
            setget: false,
            trig: false,
            delay: false,
            initial: None,
        }
    }

    /// One-line documentation shown in metadata.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Declared wire type.
    pub fn vtype(mut self, vtype: ValueType) -> Self {
        self.vtype = vtype;
        self
    }

    /// Numeric bounds enforced by `check`.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Restrict to an enumerated choice set (SCPI mnemonic spellings).
    pub fn choices<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vtype = ValueType::Choice(ChoiceSet::new(values));
        self
    }

    /// Declare a binary block device.
    pub fn block(mut self, format: BlockFormat) -> Self {
        self.vtype = ValueType::Block(format);
        self
    }

    /// Override the autoinit policy.
    pub fn autoinit(mut self, autoinit: AutoInit) -> Self {
        self.autoinit = Some(autoinit);
        self
    }

    /// Re-read the value after every write (for hardware that rounds).
    pub fn setget(mut self) -> Self {
        self.setget = true;
        self
    }

    /// Async reads of this device require the trigger step.
    pub fn trig(mut self) -> Self {
        self.trig = true;
        self
    }

    /// Async reads of this device require the pre-read delay.
    pub fn with_delay(mut self) -> Self {
        self.delay = true;
        self
    }

    /// Fixed default for a template option.
    pub fn option_const(mut self, name: impl Into<String>, value: Value) -> Self {
        if let DeviceKind::Scpi(spec) = &mut self.kind {
            spec.option_defaults
                .insert(name.into(), OptionSource::Const(value));
        }
        self
    }

    /// Default a template option from a sibling device's cached value.
    pub fn option_device(mut self, name: impl Into<String>, device: impl Into<String>) -> Self {
        if let DeviceKind::Scpi(spec) = &mut self.kind {
            spec.option_defaults
                .insert(name.into(), OptionSource::Device(device.into()));
        }
        self
    }

    /// Constrain an effective option value.
    pub fn option_lim(mut self, name: impl Into<String>, lim: OptionLim) -> Self {
        if let DeviceKind::Scpi(spec) = &mut self.kind {
            spec.option_lims.insert(name.into(), lim);
        }
        self
    }

    /// Finish construction.
    pub fn build(self) -> Arc<Device> {
        let device = Device {
            name: self.name,
            doc: self.doc,
            kind: self.kind,
            vtype: self.vtype,
            min: self.min,
            max: self.max,
            autoinit: self.autoinit.unwrap_or(AutoInit::Off),
            setget: self.setget,
            trig: self.trig,
            delay: self.delay,
            cache: Mutex::new(self.initial),
        };
        Arc::new(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_check_names_the_bound() {
        let dev = Device::scpi("freq", "FREQuency")
            .range(1e-6, 8.1e9)
            .build();
        let err = dev
            .check_value("gen1", &Value::Float(1e10))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "gen1.freq: 10000000000 is above MAX=8100000000"
        );
        let err = dev.check_value("gen1", &Value::Float(1e-9)).unwrap_err();
        assert!(err.to_string().contains("below MIN=0.000001"));
    }

    #[test]
    fn choice_check_normalizes_to_canonical() {
        let dev = Device::scpi("route", "ROUTe")
            .choices(["INTernal", "EXTernal", "USB"])
            .build();
        assert_eq!(
            dev.check_value("sw", &Value::Str("usb".into())).unwrap(),
            Value::Str("USB".into())
        );
        assert_eq!(
            dev.check_value("sw", &Value::Str("ext".into())).unwrap(),
            Value::Str("EXTernal".into())
        );
        let err = dev
            .check_value("sw", &Value::Str("ethernet".into()))
            .unwrap_err();
        assert!(matches!(err, InstrError::InvalidChoice { .. }));
        assert!(err.to_string().contains("use one of"));
    }

    #[test]
    fn int_widens_for_float_device() {
        let dev = Device::memory("level", Value::Float(0.0)).build();
        assert_eq!(
            dev.check_value("m", &Value::Int(3)).unwrap(),
            Value::Float(3.0)
        );
        let err = dev.check_value("m", &Value::Str("3".into())).unwrap_err();
        assert!(matches!(err, InstrError::TypeMismatch { .. }));
    }

    #[test]
    fn scpi_builder_derives_query() {
        let dev = Device::scpi("freq", "FREQuency").build();
        assert!(dev.can_get());
        assert!(dev.can_set());
        let md = dev.metadata();
        assert_eq!(md.autoinit, Some(1));
        let get_only = Device::scpi_get("temp", "TEMPerature?").build();
        assert!(get_only.can_get());
        assert!(!get_only.can_set());
    }

    #[tokio::test]
    async fn scpi_write_appends_value_without_placeholder() {
        use crate::mock::MockTransport;
        let transport = MockTransport::new("sim");
        let peers = HashMap::new();
        let ctx = IoCtx {
            instrument: "gen1",
            transport: &transport,
            peers: &peers,
        };
        let dev = Device::scpi("freq", "FREQuency").build();
        dev.raw_write(&ctx, &Value::Float(1.5e6), &Options::new())
            .await
            .unwrap();
        assert_eq!(transport.register("FREQuency").unwrap(), "1500000");
        assert_eq!(
            dev.raw_read(&ctx, &Options::new()).await.unwrap(),
            Value::Float(1.5e6)
        );
    }

    #[tokio::test]
    async fn option_tracks_selector_cache() {
        use crate::mock::MockTransport;
        let transport = MockTransport::new("sim").with_register("SENSe2:VOLTage", "0.25");
        let selector = Device::memory("chan", Value::Int(2)).build();
        let mut peers = HashMap::new();
        peers.insert("chan".to_string(), selector.clone());
        let ctx = IoCtx {
            instrument: "dmm",
            transport: &transport,
            peers: &peers,
        };
        let dev = Device::scpi_get("volt", "SENSe{ch}:VOLTage?")
            .option_device("ch", "chan")
            .option_lim(
                "ch",
                OptionLim::Range {
                    min: Some(1.0),
                    max: Some(4.0),
                },
            )
            .build();
        assert_eq!(
            dev.raw_read(&ctx, &Options::new()).await.unwrap(),
            Value::Float(0.25)
        );
        // out-of-limits selector makes the value unobtainable
        selector.set_cache(Value::Int(9));
        let err = dev.raw_read(&ctx, &Options::new()).await.unwrap_err();
        assert!(matches!(err, InstrError::InvalidAutoArgument { .. }));
    }
}
