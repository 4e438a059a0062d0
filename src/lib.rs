//! Laboratory instrument control core.
//!
//! The crate models an instrument as one exclusively-owned transport plus a
//! table of typed devices, and provides the machinery a sweep loop needs to
//! read many instruments concurrently: per-call value validation and wire
//! conversion, cached values, and a 4-level asynchronous acquisition
//! protocol whose background cycles overlap across instruments.
//!
//! A quick tour:
//!
//! - [`transport`] — the async command/reply contract to one instrument,
//! - [`codec`] — typed values and their SCPI wire forms (booleans, exact
//!   decimals, mnemonic choices, length-prefixed binary blocks),
//! - [`device`] — one controllable property: bounds, choices, cache, and
//!   memory / SCPI-template / custom I/O kinds,
//! - [`instrument`] — the aggregate and the Setup/Started/Waiting/Collecting
//!   protocol dispatcher,
//! - [`task`] — the background cycle: delay, trigger, detect, reads,
//! - [`srq`] — service-request completion detection (poll, queued event, or
//!   interrupt flag) for IEEE-488 style hardware,
//! - [`mock`] — a scripted SCPI simulator for tests.

pub mod codec;
pub mod device;
pub mod error;
pub mod instrument;
pub mod mock;
pub mod srq;
pub mod task;
pub mod transport;

pub use codec::{BlockFormat, ChoiceSet, ElemKind, Value, ValueType};
pub use device::{AutoInit, Device, DeviceBuilder, Options};
pub use error::{InstrError, Result};
pub use instrument::{AsyncLevel, DeviceHandle, Instrument, SyncReady, TriggerHooks};
pub use srq::{SrqDetector, SrqFlag, SrqStrategy, SrqTrigger};
pub use task::CancelFlag;
pub use transport::{EventKind, Transport};
