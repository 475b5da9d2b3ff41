//! Convenient re-exports for common usage patterns.
//!
//! # Example
//!
//! ```ignore
//! use objbridge::prelude::*;
//!
//! let mut bridge = Bridge::new();
//! let point = RecordShape::new("geo.Point")
//!     .field("X", Shape::Int(IntWidth::W64))
//!     .build();
//! bridge.register_type(bridge.main_module(), &point, None, "Point", "")?;
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Bridge context and handles
pub use crate::bridge::{Bridge, FunctionHandle};
pub use crate::config::BridgeConfig;
pub use crate::handle::ObjectHandle;

// Host-side descriptors and values
pub use crate::shape::{ComplexWidth, FloatWidth, HostFn, IntWidth, Receiver, RecordShape, Shape};
pub use crate::value::{KwArgs, Pointer, RecordValue, Value};
