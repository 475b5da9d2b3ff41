//! Bidirectional object bridge between host values and an embedded,
//! reference-counted dynamic runtime.
//!
//! Host records become runtime types whose instances keep their storage on
//! the host side, host functions become runtime callables, and values
//! convert in both directions by walking a [`Shape`].
//!
//! # Quick Start
//!
//! ```ignore
//! use objbridge::prelude::*;
//!
//! let mut bridge = Bridge::new();
//!
//! // Publish `add(a, b)` in the main module
//! let add = HostFn::new(
//!     "Add",
//!     vec![Shape::Int(IntWidth::W64), Shape::Int(IntWidth::W64)],
//!     vec![Shape::Int(IntWidth::W64)],
//!     |args| Ok(vec![Value::Int(args[0].as_i64()? + args[1].as_i64()?)]),
//! );
//! let add = bridge.function_of(add)?;
//!
//! // Call it from the runtime side
//! let (a, b) = (bridge.from_host(&Value::Int(3)), bridge.from_host(&Value::Int(4)));
//! let sum = bridge.call(add.handle(), &[a, b], &[])?;
//! assert_eq!(bridge.to_host(sum, &Shape::Int(IntWidth::W64))?, Value::Int(7));
//! ```
//!
//! # Modules
//!
//! - [`runtime`] - The embedded runtime: object heap, exceptions, types, modules
//! - [`bridge`] - Type and function registration, call dispatch, the [`Bridge`] context
//! - [`shape`] / [`value`] - Host type descriptors and host values
//! - [`holder`] - Pinned instance storage
//! - [`global`] - Per-thread `init`/`shutdown` convenience
//!
//! # Feature Flags
//!
//! - `config` - Load [`BridgeConfig`] from TOML (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `full` - Enable all features

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)
)]

mod logging;

pub mod bridge;
pub mod config;
mod error;
pub mod global;
pub mod handle;
pub mod holder;
mod marshal;
pub mod prelude;
pub mod runtime;
pub mod shape;
pub mod value;

// Re-export the unified error type
pub use error::{ConvertError, Error, RegistrationError, Result};

pub use bridge::{Bridge, FunctionHandle};
#[cfg(feature = "config")]
pub use config::ConfigError;
pub use config::BridgeConfig;
pub use handle::ObjectHandle;
pub use holder::{HolderId, HolderRegistry};
pub use runtime::{ExceptionKind, RawObject, Runtime, RuntimeError};
pub use shape::{ComplexWidth, FloatWidth, HostFn, IntWidth, Receiver, RecordShape, Shape, to_snake_name};
pub use value::{KwArgs, Pointer, RecordValue, Value};
