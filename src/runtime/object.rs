//! Object layout of the embedded runtime.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Address of one object in the runtime heap.
///
/// The generation distinguishes a live object from a later object that
/// reuses the same heap cell, so a stale address is detected instead of
/// silently aliasing a new object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawObject {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for RawObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Index into a namespace's dispatch table.
pub type SlotId = usize;

/// One method exposed by an extension type or a module.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub slot: SlotId,
    /// Whether the callable accepts keyword arguments.
    pub keywords: bool,
    pub doc: Option<String>,
}

/// One attribute exposed through a getter/setter pair.
#[derive(Debug, Clone, PartialEq)]
pub struct GetSetDef {
    pub name: String,
    pub getter: SlotId,
    pub setter: SlotId,
    pub doc: Option<String>,
}

/// A type object. Builtin types carry no extension slots.
#[derive(Debug, Clone, Default)]
pub struct TypeObject {
    pub name: String,
    pub doc: Option<String>,
    pub alloc: bool,
    pub dealloc: bool,
    pub init: bool,
    pub getsets: Vec<GetSetDef>,
    pub methods: Vec<MethodDef>,
}

impl TypeObject {
    pub fn getset(&self, name: &str) -> Option<&GetSetDef> {
        self.getsets.iter().find(|g| g.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct ModuleObject {
    pub name: String,
    pub dict: BTreeMap<String, RawObject>,
}

/// Instance of an extension type. The payload is owned by the extension
/// host that allocated the instance.
pub struct InstanceObject {
    pub ty: RawObject,
    pub payload: Option<Box<dyn Any>>,
}

impl fmt::Debug for InstanceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceObject")
            .field("ty", &self.ty)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

/// What a function object is bound to when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Module-level function; dispatch keys on the module.
    Module(RawObject),
    /// Method bound to an instance.
    Instance(RawObject),
    /// Method descriptor read from the type; the first call argument is
    /// the instance.
    Unbound(RawObject),
}

#[derive(Debug, Clone)]
pub struct FunctionObject {
    pub def: MethodDef,
    pub binding: Binding,
}

/// Payload of a heap object.
#[derive(Debug)]
pub enum ObjectKind {
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<RawObject>),
    Tuple(Vec<RawObject>),
    Dict(Vec<(RawObject, RawObject)>),
    Module(ModuleObject),
    Type(TypeObject),
    Instance(InstanceObject),
    Function(FunctionObject),
}

impl ObjectKind {
    /// Objects this one holds a reference to.
    pub(crate) fn children(&self) -> Vec<RawObject> {
        match self {
            ObjectKind::List(items) | ObjectKind::Tuple(items) => items.clone(),
            ObjectKind::Dict(entries) => entries.iter().flat_map(|(k, v)| [*k, *v]).collect(),
            ObjectKind::Module(module) => module.dict.values().copied().collect(),
            ObjectKind::Instance(instance) => vec![instance.ty],
            ObjectKind::Function(function) => match function.binding {
                Binding::Module(owner) | Binding::Instance(owner) | Binding::Unbound(owner) => {
                    vec![owner]
                }
            },
            _ => Vec::new(),
        }
    }
}

pub(crate) struct HeapObject {
    pub(crate) refcount: usize,
    pub(crate) immortal: bool,
    pub(crate) ty: RawObject,
    pub(crate) kind: ObjectKind,
}

pub(crate) struct HeapCell {
    pub(crate) generation: u32,
    pub(crate) object: Option<HeapObject>,
}
