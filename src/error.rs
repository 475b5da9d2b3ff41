//! Unified error type for the objbridge library.
//!
//! Module-specific errors ([`RegistrationError`], [`ConvertError`],
//! [`RuntimeError`] and, with the `config` feature, [`ConfigError`]) are
//! wrapped by [`Error`] so embedders can use one error type at the API
//! surface.

use thiserror::Error;

#[cfg(feature = "config")]
use crate::config::ConfigError;
use crate::runtime::RuntimeError;

/// Errors raised while registering host types and functions.
///
/// Registration is a startup-time contract: every check runs before any
/// runtime object is created, so a failed registration leaves both the
/// runtime and the bridge registry untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("type '{shape}' must be a record or a pointer to a record")]
    NotARecord { shape: String },

    #[error("invalid initializer for '{type_name}': {reason}")]
    InvalidInit { type_name: String, reason: String },

    #[error("invalid method '{name}' on '{type_name}': {reason}")]
    InvalidMethod {
        type_name: String,
        name: String,
        reason: String,
    },

    #[error("name '{name}' is already exposed in namespace '{namespace}'")]
    DuplicateName { namespace: String, name: String },

    #[error("namespace '{namespace}' exceeds its dispatch table of {capacity} slots")]
    SlotCapacity { namespace: String, capacity: usize },

    #[error("object is not a module or a bridged type: {0}")]
    InvalidNamespace(String),

    /// Instance storage outlives any single call, so it cannot keep
    /// borrowed runtime handles.
    #[error("field '{field}' of '{type_name}' has shape {shape}, which holds runtime objects")]
    UnsupportedField {
        type_name: String,
        field: String,
        shape: String,
    },
}

/// Errors from converting a runtime object into a host value.
///
/// These are soft failures: they never set a pending runtime error on their
/// own. The dispatch layer decides whether to surface them to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("expected {expected}, got {got}")]
    KindMismatch { expected: String, got: String },

    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<ConvertError>,
    },

    #[error("cannot convert to {0}")]
    Unsupported(String),
}

impl ConvertError {
    pub(crate) fn mismatch(expected: impl ToString, got: impl Into<String>) -> Self {
        Self::KindMismatch {
            expected: expected.to_string(),
            got: got.into(),
        }
    }
}

/// Unified error type for all objbridge operations.
///
/// # Example
///
/// ```ignore
/// use objbridge::{Bridge, Result};
///
/// fn setup(bridge: &mut Bridge) -> Result<()> {
///     let main = bridge.main_module();
///     bridge.register_type(main, &point_shape(), None, "Point", "")?;
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Error from type or function registration.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Error from converting a runtime object into a host value.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Exception raised inside the embedded runtime.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Error loading the bridge configuration.
    #[cfg(feature = "config")]
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A null handle was passed where an object is required.
    #[error("null object handle")]
    NullHandle,

    /// The process-wide bridge was used before `init` or after `shutdown`.
    #[error("bridge is not initialized")]
    NotInitialized,
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a registration error.
    pub fn is_registration(&self) -> bool {
        matches!(self, Self::Registration(_))
    }

    /// Returns `true` if this is an exception raised by the runtime.
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }

    /// Returns `true` if this is a conversion error.
    pub fn is_convert(&self) -> bool {
        matches!(self, Self::Convert(_))
    }
}
