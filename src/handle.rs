//! Handles to runtime objects.

use std::fmt;

use crate::logging::warn;
use crate::runtime::{RawObject, Runtime};

/// A reference to one runtime object, or the null handle.
///
/// Handles are plain copies of an object address. Dropping a handle never
/// touches the object's reference count; release it explicitly with
/// [`Bridge::release`](crate::Bridge::release) when the reference was owned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ObjectHandle(Option<RawObject>);

impl ObjectHandle {
    /// Wrap a raw result. A missing object yields the null handle and logs
    /// the runtime's pending exception, which stays pending for the caller.
    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    pub fn wrap(rt: &Runtime, raw: Option<RawObject>) -> Self {
        if raw.is_none() {
            if let Some(error) = rt.pending_error() {
                warn!(error = %error, "runtime returned no object");
            }
        }
        Self(raw)
    }

    pub const fn null() -> Self {
        Self(None)
    }

    pub const fn from_raw(raw: RawObject) -> Self {
        Self(Some(raw))
    }

    /// The underlying address, `None` for the null handle.
    pub const fn raw(self) -> Option<RawObject> {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0.is_none()
    }

    /// Identity comparison: both handles address the same object.
    pub fn is(self, other: ObjectHandle) -> bool {
        self.0.is_some() && self.0 == other.0
    }
}

impl From<RawObject> for ObjectHandle {
    fn from(raw: RawObject) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(raw) => write!(f, "{raw}"),
            None => f.write_str("<null>"),
        }
    }
}
