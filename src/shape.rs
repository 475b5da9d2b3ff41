//! Shape descriptors for host values and host callables.
//!
//! A [`Shape`] describes the structure of a host value so the marshaling
//! layer can walk it without runtime reflection. Records carry their field
//! list and methods; callables are described by [`HostFn`], which bundles
//! parameter and result shapes with the function body.
//!
//! # Example
//!
//! ```ignore
//! use objbridge::shape::{HostFn, IntWidth, RecordShape, Shape};
//! use objbridge::Value;
//!
//! let point = RecordShape::new("geo::Point")
//!     .field("X", Shape::Int(IntWidth::W64))
//!     .field("Y", Shape::Int(IntWidth::W64))
//!     .build();
//!
//! let add = HostFn::new(
//!     "Add",
//!     vec![Shape::Int(IntWidth::W64), Shape::Int(IntWidth::W64)],
//!     vec![Shape::Int(IntWidth::W64)],
//!     |args| Ok(vec![Value::Int(args[0].as_i64()? + args[1].as_i64()?)]),
//! );
//! ```

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

/// Width of a host integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    W32,
    W64,
}

/// Total width of a complex number (two floats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplexWidth {
    W64,
    W128,
}

/// Structure of a host value.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Bool,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
    Complex(ComplexWidth),
    Str,
    Bytes,
    List(Box<Shape>),
    Map(Box<Shape>, Box<Shape>),
    Record(Rc<RecordShape>),
    /// Nullable reference to shared storage.
    Ptr(Box<Shape>),
    /// A runtime object passed through unconverted.
    Object,
    /// Keyword arguments; only valid as the last parameter of a callable.
    KwArgs,
}

impl Shape {
    pub fn list(element: Shape) -> Self {
        Shape::List(Box::new(element))
    }

    pub fn map(key: Shape, value: Shape) -> Self {
        Shape::Map(Box::new(key), Box::new(value))
    }

    pub fn ptr(target: Shape) -> Self {
        Shape::Ptr(Box::new(target))
    }

    /// The record of a `Record` shape.
    pub fn record(&self) -> Option<&Rc<RecordShape>> {
        match self {
            Shape::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The record of a `Record` or `Ptr(Record)` shape.
    pub fn record_target(&self) -> Option<&Rc<RecordShape>> {
        match self {
            Shape::Record(record) => Some(record),
            Shape::Ptr(inner) => inner.record(),
            _ => None,
        }
    }

    /// Whether this is `Ptr(Record(_))`.
    pub fn is_record_ptr(&self) -> bool {
        matches!(self, Shape::Ptr(inner) if inner.record().is_some())
    }

    /// Whether a value of this shape can hold runtime object handles,
    /// directly or inside collections, pointers and record fields.
    pub fn carries_handles(&self) -> bool {
        self.carries_handles_in(&mut HashSet::new())
    }

    fn carries_handles_in(&self, visited: &mut HashSet<String>) -> bool {
        match self {
            Shape::Object | Shape::KwArgs => true,
            Shape::List(inner) | Shape::Ptr(inner) => inner.carries_handles_in(visited),
            Shape::Map(key, value) => key.carries_handles_in(visited) || value.carries_handles_in(visited),
            Shape::Record(record) => {
                visited.insert(record.name.clone())
                    && record.fields.iter().any(|f| f.shape.carries_handles_in(visited))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Bool => f.write_str("bool"),
            Shape::Int(width) => write!(f, "i{}", width.bits()),
            Shape::Uint(width) => write!(f, "u{}", width.bits()),
            Shape::Float(FloatWidth::W32) => f.write_str("f32"),
            Shape::Float(FloatWidth::W64) => f.write_str("f64"),
            Shape::Complex(ComplexWidth::W64) => f.write_str("c64"),
            Shape::Complex(ComplexWidth::W128) => f.write_str("c128"),
            Shape::Str => f.write_str("str"),
            Shape::Bytes => f.write_str("bytes"),
            Shape::List(element) => write!(f, "list<{element}>"),
            Shape::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Shape::Record(record) => f.write_str(&record.name),
            Shape::Ptr(target) => write!(f, "ptr<{target}>"),
            Shape::Object => f.write_str("object"),
            Shape::KwArgs => f.write_str("kwargs"),
        }
    }
}

/// One field of a record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
}

impl Field {
    /// Fields whose name starts with an uppercase letter are exported.
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }

    /// Name of the field as seen from the runtime.
    pub fn exposed_name(&self) -> String {
        to_snake_name(&self.name)
    }
}

/// A record type: host type name, ordered fields, methods.
///
/// The host type name is the record's identity; two record shapes with the
/// same name describe the same host type. A record that refers to itself
/// does so through a placeholder with the same name and no fields, reached
/// through a pointer or a list:
///
/// ```ignore
/// let node = RecordShape::new("list::Node")
///     .field("Value", Shape::Int(IntWidth::W64))
///     .field("Next", Shape::ptr(RecordShape::new("list::Node").build()))
///     .build();
/// ```
///
/// Once the type is registered the bridge resolves the placeholder to the
/// registered shape, so values read or written through `Next` carry every
/// field.
#[derive(Debug, Clone)]
pub struct RecordShape {
    pub name: String,
    pub fields: Vec<Field>,
    pub methods: Vec<HostFn>,
}

impl PartialEq for RecordShape {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl RecordShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.fields.push(Field {
            name: name.into(),
            shape,
        });
        self
    }

    /// Attach a method. Methods must declare a receiver.
    pub fn method(mut self, method: HostFn) -> Self {
        self.methods.push(method);
        self
    }

    pub fn build(self) -> Shape {
        Shape::Record(Rc::new(self))
    }

    /// Type name without its path (`geo::Point` and `geo.Point` give `Point`).
    pub fn bare_name(&self) -> &str {
        let tail = self.name.rsplit("::").next().unwrap_or(&self.name);
        tail.rsplit('.').next().unwrap_or(tail)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn exported_fields(&self) -> impl Iterator<Item = (usize, &Field)> {
        self.fields.iter().enumerate().filter(|(_, f)| f.is_exported())
    }
}

/// How a method receives its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// A copy of the instance's record.
    Value,
    /// A pointer to the instance's storage; mutations are visible.
    Pointer,
}

type Body = Rc<dyn Fn(Vec<Value>) -> anyhow::Result<Vec<Value>>>;

/// A host callable together with its signature.
///
/// When `receiver` is set, the receiver is passed as the first argument and
/// is not listed in `params`. A trailing [`Shape::KwArgs`] parameter marks a
/// callable that accepts keyword arguments.
#[derive(Clone)]
pub struct HostFn {
    pub name: String,
    pub receiver: Option<Receiver>,
    pub params: Vec<Shape>,
    pub results: Vec<Shape>,
    body: Body,
}

impl HostFn {
    pub fn new(
        name: impl Into<String>,
        params: Vec<Shape>,
        results: Vec<Shape>,
        body: impl Fn(Vec<Value>) -> anyhow::Result<Vec<Value>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            receiver: None,
            params,
            results,
            body: Rc::new(body),
        }
    }

    /// A method; the body gets the receiver as its first argument.
    pub fn method(
        name: impl Into<String>,
        receiver: Receiver,
        params: Vec<Shape>,
        results: Vec<Shape>,
        body: impl Fn(Vec<Value>) -> anyhow::Result<Vec<Value>> + 'static,
    ) -> Self {
        Self {
            receiver: Some(receiver),
            ..Self::new(name, params, results, body)
        }
    }

    pub fn accepts_kwargs(&self) -> bool {
        matches!(self.params.last(), Some(Shape::KwArgs))
    }

    /// Parameters supplied positionally, without a trailing kwargs slot.
    pub fn positional_params(&self) -> &[Shape] {
        match self.params.split_last() {
            Some((Shape::KwArgs, positional)) => positional,
            _ => &self.params,
        }
    }

    pub fn invoke(&self, args: Vec<Value>) -> anyhow::Result<Vec<Value>> {
        (self.body)(args)
    }
}

impl fmt::Debug for HostFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFn")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("params", &self.params)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

/// Convert a host identifier to the runtime's naming convention: an
/// underscore before every non-leading uppercase letter, then lowercase.
///
/// `MaxRetries` becomes `max_retries`.
pub fn to_snake_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}
