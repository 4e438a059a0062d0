//! Custom error types for the instrument control core.
//!
//! This module defines the primary error type, `InstrError`, used across the
//! crate. Using the `thiserror` crate, it provides a centralized and
//! consistent taxonomy for everything that can go wrong between a caller and
//! a piece of lab hardware:
//!
//! - **`NotSupported`**: an operation was invoked on a device or transport
//!   without the corresponding capability (e.g. `set` on a read-only device).
//!   Never retried, always surfaced.
//! - **`OutOfRange` / `InvalidChoice`**: validation failures raised by
//!   `check` before any I/O occurs, naming the failed bound or the allowed
//!   set.
//! - **`Decode`**: the wire value did not match its declared length or type.
//!   The data for that read is assumed lost; no retry.
//! - **`AsyncOrdering`**: the caller violated the 4-level async protocol.
//!   Raising this cancels the in-flight acquisition task.
//! - **`Transport`**: the underlying read/write/ask failed. Retry policy, if
//!   any, belongs to the orchestration layer, not the core.
//! - **`InvalidAutoArgument`**: a device's value is not currently obtainable
//!   because a dependent option is in the wrong state. This is an expected,
//!   frequent outcome (swallowed by `getcache`), not a hardware fault.
//!
//! Every error that concerns a device carries the fully qualified
//! `instrument.device` name, so a caller sweeping many instruments can tell
//! which one failed.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, InstrError>;

/// Error taxonomy for the instrument core.
///
/// The type is `Clone` because a failure inside a background acquisition
/// task may have to be surfaced to several callers (the one blocked waiting
/// and every later collector of that cycle).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstrError {
    /// Operation invoked without the corresponding capability.
    #[error("{subject}: '{operation}' is not supported")]
    NotSupported {
        /// Fully qualified device name, or transport description.
        subject: String,
        /// The operation that was attempted.
        operation: String,
    },

    /// A value failed a min/max bound check.
    #[error("{device}: {value} is {bound}")]
    OutOfRange {
        /// Fully qualified device name.
        device: String,
        /// The offending value.
        value: String,
        /// Which bound failed, e.g. `below MIN=0.000001` or `above MAX=100`.
        bound: String,
    },

    /// A value is not a member of the device's choice set.
    #[error("{device}: invalid value ({value}): use one of {choices}")]
    InvalidChoice {
        /// Fully qualified device name.
        device: String,
        /// The offending value.
        value: String,
        /// The allowed set, rendered for the user.
        choices: String,
    },

    /// A value has the wrong type for the device.
    #[error("{device}: wrong value type: expected {expected}, got {got}")]
    TypeMismatch {
        /// Fully qualified device name.
        device: String,
        /// Expected type name.
        expected: String,
        /// Received type name.
        got: String,
    },

    /// The wire data did not match its declared length or type.
    #[error("decode error: {0}")]
    Decode(String),

    /// A SCPI command template could not be formatted.
    #[error("{device}: bad command template: {detail}")]
    Template {
        /// Fully qualified device name.
        device: String,
        /// What went wrong during substitution.
        detail: String,
    },

    /// The 4-level async protocol was driven out of order.
    #[error("{instrument}: async calls out of order: {detail}")]
    AsyncOrdering {
        /// Instrument display name.
        instrument: String,
        /// Which transition was illegal.
        detail: String,
    },

    /// The underlying transport read/write/ask failed.
    #[error("transport fault: {0}")]
    Transport(String),

    /// The device's value is not currently obtainable (expected outcome,
    /// swallowed by `getcache` under autoinit).
    #[error("{device}: argument currently invalid: {detail}")]
    InvalidAutoArgument {
        /// Fully qualified device name.
        device: String,
        /// Which option made the value unavailable.
        detail: String,
    },

    /// Lookup of an unknown device name.
    #[error("{instrument}: no device named '{device}'")]
    NoSuchDevice {
        /// Instrument display name.
        instrument: String,
        /// The name that was looked up.
        device: String,
    },

    /// The background acquisition task failed abnormally (e.g. panicked).
    #[error("async task failed: {0}")]
    AsyncTask(String),
}

impl InstrError {
    /// Shorthand for a `NotSupported` error on a named subject.
    pub fn not_supported(subject: impl Into<String>, operation: impl Into<String>) -> Self {
        InstrError::NotSupported {
            subject: subject.into(),
            operation: operation.into(),
        }
    }

    /// Shorthand for a transport fault with a formatted message.
    pub fn transport(detail: impl Into<String>) -> Self {
        InstrError::Transport(detail.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_device() {
        let err = InstrError::OutOfRange {
            device: "gen1.freq".into(),
            value: "10000000000".into(),
            bound: "above MAX=8100000000".into(),
        };
        assert_eq!(
            err.to_string(),
            "gen1.freq: 10000000000 is above MAX=8100000000"
        );
    }

    #[test]
    fn not_supported_display() {
        let err = InstrError::not_supported("dmm.readval", "set");
        assert!(err.to_string().contains("'set' is not supported"));
    }
}
