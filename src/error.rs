//! Crate-wide error type
//!
//! Each subsystem owns the error enum for the faults it can detect. `RigError`
//! folds them together so configuration and tick code can use `?` freely.
//!
//! Configuration, binding and compile errors only ever surface while the rig
//! is being built. Protocol and device errors surface from inside a tick and
//! are fatal to the scheduler.

use crate::device::ProtocolError;
use crate::rig::BindingError;
use crate::script::CompileError;
use crate::wiring::DeviceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RigError {
    /// Unknown alias or type, missing key, bad value shape, wrong arity
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Device I/O error: {0}")]
    DeviceIo(#[from] DeviceError),

    /// A fault raised while building the entry at `key`, e.g. `inputs.pad`
    #[error("{key}: {source}")]
    Keyed {
        key: String,
        #[source]
        source: Box<RigError>,
    },
}

impl RigError {
    pub fn config(message: impl Into<String>) -> Self {
        RigError::Configuration(message.into())
    }

    /// Ties an error to the document entry that caused it. Configuration
    /// messages get the key as a prefix, anything else is wrapped.
    pub fn keyed(self, key: impl Into<String>) -> Self {
        let key = key.into();
        match self {
            RigError::Configuration(message) => {
                RigError::Configuration(format!("{}: {}", key, message))
            }
            other => RigError::Keyed {
                key,
                source: Box::new(other),
            },
        }
    }

    /// True for faults that can only happen before the scheduler starts
    pub fn is_build_time(&self) -> bool {
        matches!(
            self,
            RigError::Configuration(_)
                | RigError::Binding(_)
                | RigError::Compile(_)
                | RigError::Keyed { .. }
        )
    }
}

impl From<toml::de::Error> for RigError {
    fn from(e: toml::de::Error) -> Self {
        RigError::Configuration(e.to_string())
    }
}

pub type RigResult<T> = Result<T, RigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_prefixes_configuration_and_wraps_the_rest() {
        let err = RigError::config("bad pin").keyed("inputs.btn");
        assert!(matches!(&err, RigError::Configuration(m) if m == "inputs.btn: bad pin"));

        let err = RigError::DeviceIo(DeviceError::PinBusy(5)).keyed("outputs.m");
        assert!(err.is_build_time());
        assert!(err.to_string().starts_with("outputs.m: Device I/O error"), "{}", err);
        assert!(matches!(
            &err,
            RigError::Keyed { source, .. } if matches!(**source, RigError::DeviceIo(_))
        ));
    }
}
