//! Exceptions raised inside the embedded runtime.

use std::fmt;

use thiserror::Error;

/// Category of a runtime exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    TypeError,
    AttributeError,
    IndexError,
    RuntimeError,
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::AttributeError => "AttributeError",
            ExceptionKind::IndexError => "IndexError",
            ExceptionKind::RuntimeError => "RuntimeError",
        };
        f.write_str(name)
    }
}

/// A fetched runtime exception.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: ExceptionKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_type_error(&self) -> bool {
        self.kind == ExceptionKind::TypeError
    }
}

/// Marker returned by every fallible runtime entry point: an exception is
/// now pending in the runtime and the caller must propagate failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Raised;
