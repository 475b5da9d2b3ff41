//! Host values.
//!
//! [`Value`] is the host side of every conversion. Records are plain data;
//! shared, mutable storage is expressed with [`Pointer`], which is how a
//! runtime instance and any views of its nested records see the same bytes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use anyhow::{anyhow, bail};

use crate::handle::ObjectHandle;
use crate::logging::fatal;
use crate::shape::{RecordShape, Shape};

/// A host value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Record(RecordValue),
    Ptr(Option<Pointer>),
    Object(ObjectHandle),
    KwArgs(KwArgs),
}

impl Value {
    /// The zero value of `shape`: empty collections, null pointers,
    /// records with every field zeroed.
    pub fn zero(shape: &Shape) -> Self {
        match shape {
            Shape::Bool => Value::Bool(false),
            Shape::Int(_) => Value::Int(0),
            Shape::Uint(_) => Value::Uint(0),
            Shape::Float(_) => Value::Float(0.0),
            Shape::Complex(_) => Value::Complex(0.0, 0.0),
            Shape::Str => Value::Str(String::new()),
            Shape::Bytes => Value::Bytes(Vec::new()),
            Shape::List(_) => Value::List(Vec::new()),
            Shape::Map(..) => Value::Map(Vec::new()),
            Shape::Record(record) => Value::Record(RecordValue::zero(record)),
            Shape::Ptr(_) => Value::Ptr(None),
            Shape::Object => Value::Object(ObjectHandle::null()),
            Shape::KwArgs => Value::KwArgs(KwArgs::default()),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Complex(..) => "complex",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Ptr(_) => "ptr",
            Value::Object(_) => "object",
            Value::KwArgs(_) => "kwargs",
        }
    }

    pub fn as_bool(&self) -> anyhow::Result<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => bail!("expected bool, got {}", other.kind_name()),
        }
    }

    pub fn as_i64(&self) -> anyhow::Result<i64> {
        match self {
            Value::Int(v) => Ok(*v),
            other => bail!("expected int, got {}", other.kind_name()),
        }
    }

    pub fn as_u64(&self) -> anyhow::Result<u64> {
        match self {
            Value::Uint(v) => Ok(*v),
            other => bail!("expected uint, got {}", other.kind_name()),
        }
    }

    pub fn as_f64(&self) -> anyhow::Result<f64> {
        match self {
            Value::Float(v) => Ok(*v),
            other => bail!("expected float, got {}", other.kind_name()),
        }
    }

    pub fn as_str(&self) -> anyhow::Result<&str> {
        match self {
            Value::Str(v) => Ok(v),
            other => bail!("expected str, got {}", other.kind_name()),
        }
    }

    pub fn as_record(&self) -> anyhow::Result<&RecordValue> {
        match self {
            Value::Record(record) => Ok(record),
            other => bail!("expected record, got {}", other.kind_name()),
        }
    }

    /// The target of a non-null pointer.
    pub fn as_ptr(&self) -> anyhow::Result<&Pointer> {
        match self {
            Value::Ptr(Some(pointer)) => Ok(pointer),
            Value::Ptr(None) => bail!("null pointer"),
            other => bail!("expected ptr, got {}", other.kind_name()),
        }
    }

    pub fn as_kwargs(&self) -> anyhow::Result<&KwArgs> {
        match self {
            Value::KwArgs(kwargs) => Ok(kwargs),
            other => bail!("expected kwargs, got {}", other.kind_name()),
        }
    }
}

/// A record value: its shape plus one value per field, in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    pub shape: Rc<RecordShape>,
    pub fields: Vec<Value>,
}

impl RecordValue {
    pub fn zero(shape: &Rc<RecordShape>) -> Self {
        Self {
            shape: Rc::clone(shape),
            fields: shape.fields.iter().map(|f| Value::zero(&f.shape)).collect(),
        }
    }

    /// Field by its host name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(self.shape.field_index(name)?)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let index = self.shape.field_index(name)?;
        self.fields.get_mut(index)
    }

    /// Builder-style field assignment; unknown names are ignored.
    pub fn with(mut self, name: &str, value: Value) -> Self {
        if let Some(slot) = self.get_mut(name) {
            *slot = value;
        }
        self
    }
}

/// Shared, mutable storage for a host value, or a place inside one.
///
/// A pointer is a root cell plus a path of record field indices. Pointers
/// into the same root alias: writes through one are visible through all.
#[derive(Clone)]
pub struct Pointer {
    root: Rc<RefCell<Value>>,
    path: Vec<usize>,
}

impl Pointer {
    /// Allocate new storage holding `value`.
    pub fn new(value: Value) -> Self {
        Self {
            root: Rc::new(RefCell::new(value)),
            path: Vec::new(),
        }
    }

    /// A pointer to field `index` of the record stored here.
    pub fn field(&self, index: usize) -> Pointer {
        let mut path = self.path.clone();
        path.push(index);
        Self {
            root: Rc::clone(&self.root),
            path,
        }
    }

    /// Copy of the pointee.
    pub fn get(&self) -> Value {
        self.with(Value::clone)
    }

    pub fn set(&self, value: Value) {
        self.with_mut(|slot| *slot = value);
    }

    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        let root = self.root.borrow();
        let mut current = &*root;
        for &index in &self.path {
            let kind = current.kind_name();
            current = match current {
                Value::Record(record) => match record.fields.get(index) {
                    Some(field) => field,
                    None => fatal!("pointer path leaves a record at field {index}"),
                },
                _ => fatal!("pointer path does not match a {kind} value"),
            };
        }
        f(current)
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        let mut root = self.root.borrow_mut();
        let mut current = &mut *root;
        for &index in &self.path {
            let kind = current.kind_name();
            current = match current {
                Value::Record(record) => match record.fields.get_mut(index) {
                    Some(field) => field,
                    None => fatal!("pointer path leaves a record at field {index}"),
                },
                _ => fatal!("pointer path does not match a {kind} value"),
            };
        }
        f(current)
    }

    /// Copy of the pointee's field `name`.
    pub fn get_field(&self, name: &str) -> anyhow::Result<Value> {
        self.with(|value| -> anyhow::Result<Value> {
            value
                .as_record()?
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("no field named {name}"))
        })
    }

    pub fn set_field(&self, name: &str, field: Value) -> anyhow::Result<()> {
        self.with_mut(|value| -> anyhow::Result<()> {
            match value {
                Value::Record(record) => match record.get_mut(name) {
                    Some(slot) => {
                        *slot = field;
                        Ok(())
                    }
                    None => bail!("no field named {name}"),
                },
                other => bail!("expected record, got {}", other.kind_name()),
            }
        })
    }

    /// Whether both pointers designate the same place.
    pub fn ptr_eq(&self, other: &Pointer) -> bool {
        Rc::ptr_eq(&self.root, &other.root) && self.path == other.path
    }
}

impl PartialEq for Pointer {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pointer")
            .field("root", &Rc::as_ptr(&self.root))
            .field("path", &self.path)
            .finish()
    }
}

/// Keyword arguments passed to a callable that accepts them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KwArgs(pub HashMap<String, ObjectHandle>);

impl Deref for KwArgs {
    type Target = HashMap<String, ObjectHandle>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for KwArgs {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
