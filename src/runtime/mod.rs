//! The embedded dynamic runtime: a reference-counted object heap.
//!
//! This is the object model the bridge talks to. It provides what an
//! embedded interpreter exposes to extension code and nothing more:
//!
//! - a heap of reference-counted objects addressed by [`RawObject`]
//! - a pending-exception slot ([`Runtime::raise`], [`Runtime::take_error`])
//! - type objects whose allocation, deallocation, initialization, attribute
//!   and method slots call back into an [`ExtensionHost`]
//! - modules, bound functions and method descriptors
//! - the primitive wrappers (ints, floats, strings, lists, dicts, ...)
//!
//! # Reference counting
//!
//! Constructors return a new reference. Container stores take their own
//! reference to the stored item. Lookups (`list_get`, `dict_get`,
//! `module_get`) return borrowed references. When an extension instance
//! drops to zero it is queued rather than freed, because its memory belongs
//! to the host; [`Runtime::drain_finalizers`] hands queued instances back to
//! the host's deallocator.

mod error;
mod object;
mod primitives;

pub use error::{ExceptionKind, Raised, RuntimeError};
pub use object::{
    Binding, FunctionObject, GetSetDef, InstanceObject, MethodDef, ModuleObject, ObjectKind,
    RawObject, SlotId, TypeObject,
};

use std::any::Any;
use std::collections::BTreeMap;

use crate::logging::{fatal, trace};
use object::{HeapCell, HeapObject};

/// Callbacks the runtime makes into the code that defined an extension type.
///
/// Every method runs with the runtime borrowed mutably, mirroring an
/// interpreter that invokes native slots while holding its global lock.
/// Fallible callbacks report failure by raising an exception on `rt` and
/// returning [`Raised`].
pub trait ExtensionHost {
    /// Allocate a new instance of the extension type `ty`.
    fn alloc(&mut self, rt: &mut Runtime, ty: RawObject) -> Result<RawObject, Raised>;

    /// Release an instance whose reference count dropped to zero. The host
    /// must finish by calling [`Runtime::free_object`].
    fn dealloc(&mut self, rt: &mut Runtime, obj: RawObject);

    /// Initialize a freshly allocated instance from call arguments.
    fn init(
        &mut self,
        rt: &mut Runtime,
        obj: RawObject,
        args: RawObject,
        kwargs: Option<RawObject>,
    ) -> Result<(), Raised>;

    /// Read the attribute behind getter `slot`.
    fn get(&mut self, rt: &mut Runtime, obj: RawObject, slot: SlotId) -> Result<RawObject, Raised>;

    /// Write the attribute behind setter `slot`.
    fn set(
        &mut self,
        rt: &mut Runtime,
        obj: RawObject,
        value: RawObject,
        slot: SlotId,
    ) -> Result<(), Raised>;

    /// Invoke the method or function behind `slot`. `owner` is the module
    /// for module functions and the instance for methods.
    fn call(
        &mut self,
        rt: &mut Runtime,
        owner: RawObject,
        args: RawObject,
        kwargs: Option<RawObject>,
        slot: SlotId,
    ) -> Result<RawObject, Raised>;
}

/// Host for a runtime without extension types.
///
/// Every slot raises `TypeError`; deallocation just frees the object.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExtensions;

impl ExtensionHost for NoExtensions {
    fn alloc(&mut self, rt: &mut Runtime, _ty: RawObject) -> Result<RawObject, Raised> {
        Err(rt.raise_type_error("no extension host installed"))
    }

    fn dealloc(&mut self, rt: &mut Runtime, obj: RawObject) {
        rt.free_object(obj);
    }

    fn init(
        &mut self,
        rt: &mut Runtime,
        _obj: RawObject,
        _args: RawObject,
        _kwargs: Option<RawObject>,
    ) -> Result<(), Raised> {
        Err(rt.raise_type_error("no extension host installed"))
    }

    fn get(&mut self, rt: &mut Runtime, _obj: RawObject, _slot: SlotId) -> Result<RawObject, Raised> {
        Err(rt.raise_type_error("no extension host installed"))
    }

    fn set(
        &mut self,
        rt: &mut Runtime,
        _obj: RawObject,
        _value: RawObject,
        _slot: SlotId,
    ) -> Result<(), Raised> {
        Err(rt.raise_type_error("no extension host installed"))
    }

    fn call(
        &mut self,
        rt: &mut Runtime,
        _owner: RawObject,
        _args: RawObject,
        _kwargs: Option<RawObject>,
        _slot: SlotId,
    ) -> Result<RawObject, Raised> {
        Err(rt.raise_type_error("no extension host installed"))
    }
}

struct Builtins {
    type_: RawObject,
    none: RawObject,
    bool_: RawObject,
    int: RawObject,
    float: RawObject,
    complex: RawObject,
    str_: RawObject,
    bytes: RawObject,
    list: RawObject,
    tuple: RawObject,
    dict: RawObject,
    module: RawObject,
    function: RawObject,
}

/// The embedded runtime.
pub struct Runtime {
    heap: Vec<HeapCell>,
    free: Vec<u32>,
    live: usize,
    builtins: Builtins,
    none: RawObject,
    true_: RawObject,
    false_: RawObject,
    pending: Option<RuntimeError>,
    modules: BTreeMap<String, RawObject>,
    finalizers: Vec<RawObject>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Start a runtime with its builtin types and singletons.
    pub fn new() -> Self {
        let placeholder = RawObject {
            index: 0,
            generation: 0,
        };
        let mut rt = Self {
            heap: Vec::new(),
            free: Vec::new(),
            live: 0,
            builtins: Builtins {
                type_: placeholder,
                none: placeholder,
                bool_: placeholder,
                int: placeholder,
                float: placeholder,
                complex: placeholder,
                str_: placeholder,
                bytes: placeholder,
                list: placeholder,
                tuple: placeholder,
                dict: placeholder,
                module: placeholder,
                function: placeholder,
            },
            none: placeholder,
            true_: placeholder,
            false_: placeholder,
            pending: None,
            modules: BTreeMap::new(),
            finalizers: Vec::new(),
        };

        // `type` is its own type, so its address must be known up front.
        let type_ = rt.next_address();
        rt.insert(HeapObject {
            refcount: 1,
            immortal: true,
            ty: type_,
            kind: ObjectKind::Type(builtin_type("type")),
        });
        rt.builtins.type_ = type_;

        rt.builtins.none = rt.builtin("NoneType");
        rt.builtins.bool_ = rt.builtin("bool");
        rt.builtins.int = rt.builtin("int");
        rt.builtins.float = rt.builtin("float");
        rt.builtins.complex = rt.builtin("complex");
        rt.builtins.str_ = rt.builtin("str");
        rt.builtins.bytes = rt.builtin("bytes");
        rt.builtins.list = rt.builtin("list");
        rt.builtins.tuple = rt.builtin("tuple");
        rt.builtins.dict = rt.builtin("dict");
        rt.builtins.module = rt.builtin("module");
        rt.builtins.function = rt.builtin("builtin_function_or_method");

        rt.none = rt.immortal(rt.builtins.none, ObjectKind::None);
        rt.true_ = rt.immortal(rt.builtins.bool_, ObjectKind::Bool(true));
        rt.false_ = rt.immortal(rt.builtins.bool_, ObjectKind::Bool(false));
        rt
    }

    fn builtin(&mut self, name: &str) -> RawObject {
        self.immortal(self.builtins.type_, ObjectKind::Type(builtin_type(name)))
    }

    fn immortal(&mut self, ty: RawObject, kind: ObjectKind) -> RawObject {
        self.insert(HeapObject {
            refcount: 1,
            immortal: true,
            ty,
            kind,
        })
    }

    // ========================================================================
    // Heap management
    // ========================================================================

    fn next_address(&self) -> RawObject {
        let reused = self
            .free
            .last()
            .and_then(|&index| Some((index, self.heap.get(index as usize)?.generation)));
        match reused {
            Some((index, generation)) => RawObject { index, generation },
            None => RawObject {
                index: self.heap.len() as u32,
                generation: 0,
            },
        }
    }

    fn insert(&mut self, object: HeapObject) -> RawObject {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let Some(cell) = self.heap.get_mut(index as usize) else {
                    fatal!("free list names missing cell {index}");
                };
                cell.object = Some(object);
                RawObject {
                    index,
                    generation: cell.generation,
                }
            }
            None => {
                let index = self.heap.len() as u32;
                self.heap.push(HeapCell {
                    generation: 0,
                    object: Some(object),
                });
                RawObject {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub(crate) fn alloc_object(&mut self, ty: RawObject, kind: ObjectKind) -> RawObject {
        self.insert(HeapObject {
            refcount: 1,
            immortal: false,
            ty,
            kind,
        })
    }

    fn entry(&self, obj: RawObject) -> &HeapObject {
        match self.heap.get(obj.index as usize) {
            Some(cell) if cell.generation == obj.generation => match &cell.object {
                Some(object) => object,
                None => fatal!("use of freed object {obj}"),
            },
            _ => fatal!("use of stale object {obj}"),
        }
    }

    fn entry_mut(&mut self, obj: RawObject) -> &mut HeapObject {
        match self.heap.get_mut(obj.index as usize) {
            Some(cell) if cell.generation == obj.generation => match &mut cell.object {
                Some(object) => object,
                None => fatal!("use of freed object {obj}"),
            },
            _ => fatal!("use of stale object {obj}"),
        }
    }

    /// Whether `obj` still addresses a live object.
    pub fn is_alive(&self, obj: RawObject) -> bool {
        self.heap
            .get(obj.index as usize)
            .is_some_and(|cell| cell.generation == obj.generation && cell.object.is_some())
    }

    /// The payload of a live object.
    pub fn kind(&self, obj: RawObject) -> &ObjectKind {
        &self.entry(obj).kind
    }

    /// Number of live objects, builtins included.
    pub fn live_objects(&self) -> usize {
        self.live
    }

    pub fn refcount(&self, obj: RawObject) -> usize {
        self.entry(obj).refcount
    }

    pub fn incref(&mut self, obj: RawObject) {
        let entry = self.entry_mut(obj);
        if !entry.immortal {
            entry.refcount += 1;
        }
    }

    /// Drop one reference. Ordinary objects are freed at zero; extension
    /// instances are queued for their host's deallocator.
    pub fn decref(&mut self, obj: RawObject) {
        let entry = self.entry_mut(obj);
        if entry.immortal {
            return;
        }
        if entry.refcount == 0 {
            fatal!("reference count underflow on {obj}");
        }
        entry.refcount -= 1;
        if entry.refcount > 0 {
            return;
        }

        let instance_type = match &entry.kind {
            ObjectKind::Instance(instance) => Some(instance.ty),
            _ => None,
        };
        let finalize = instance_type
            .and_then(|ty| self.type_object(ty))
            .is_some_and(|ty| ty.dealloc);
        if finalize {
            trace!(object = %obj, "queueing instance for deallocation");
            self.finalizers.push(obj);
        } else {
            self.free_object(obj);
        }
    }

    /// Release the storage of `obj` and drop the references it holds.
    ///
    /// Hosts call this at the end of [`ExtensionHost::dealloc`].
    pub fn free_object(&mut self, obj: RawObject) {
        let cell = match self.heap.get_mut(obj.index as usize) {
            Some(cell) if cell.generation == obj.generation => cell,
            _ => fatal!("use of stale object {obj}"),
        };
        let Some(object) = cell.object.take() else {
            fatal!("double free of {obj}");
        };
        cell.generation = cell.generation.wrapping_add(1);
        self.free.push(obj.index);
        self.live -= 1;
        for child in object.kind.children() {
            self.decref(child);
        }
    }

    /// Instances waiting for their host's deallocator.
    pub fn pending_finalizers(&self) -> usize {
        self.finalizers.len()
    }

    /// Run the host deallocator for every queued instance.
    pub fn drain_finalizers(&mut self, host: &mut dyn ExtensionHost) {
        while let Some(obj) = self.finalizers.pop() {
            host.dealloc(self, obj);
        }
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    /// Set the pending exception and return the failure marker.
    pub fn raise(&mut self, kind: ExceptionKind, message: impl Into<String>) -> Raised {
        let error = RuntimeError::new(kind, message);
        trace!(error = %error, "exception raised");
        self.pending = Some(error);
        Raised
    }

    pub fn raise_type_error(&mut self, message: impl Into<String>) -> Raised {
        self.raise(ExceptionKind::TypeError, message)
    }

    /// Fetch and clear the pending exception.
    pub fn take_error(&mut self) -> Option<RuntimeError> {
        self.pending.take()
    }

    pub fn pending_error(&self) -> Option<&RuntimeError> {
        self.pending.as_ref()
    }

    pub fn error_pending(&self) -> bool {
        self.pending.is_some()
    }

    // ========================================================================
    // Types and instances
    // ========================================================================

    /// Create a heap type object.
    pub fn new_type(&mut self, object: TypeObject) -> RawObject {
        self.alloc_object(self.builtins.type_, ObjectKind::Type(object))
    }

    pub fn type_object(&self, ty: RawObject) -> Option<&TypeObject> {
        match self.kind(ty) {
            ObjectKind::Type(object) => Some(object),
            _ => None,
        }
    }

    pub fn type_object_mut(&mut self, ty: RawObject) -> Option<&mut TypeObject> {
        match &mut self.entry_mut(ty).kind {
            ObjectKind::Type(object) => Some(object),
            _ => None,
        }
    }

    pub fn type_of(&self, obj: RawObject) -> RawObject {
        self.entry(obj).ty
    }

    /// Name of the type of `obj`.
    pub fn type_name(&self, obj: RawObject) -> String {
        self.type_object(self.type_of(obj))
            .map(|ty| ty.name.clone())
            .unwrap_or_else(|| "object".to_string())
    }

    pub fn is_type(&self, obj: RawObject) -> bool {
        matches!(self.kind(obj), ObjectKind::Type(_))
    }

    pub fn is_instance_of(&self, obj: RawObject, ty: RawObject) -> bool {
        self.type_of(obj) == ty
    }

    /// Allocate an instance of extension type `ty` carrying `payload`.
    pub fn alloc_instance(&mut self, ty: RawObject, payload: Box<dyn Any>) -> RawObject {
        self.incref(ty);
        self.alloc_object(
            ty,
            ObjectKind::Instance(InstanceObject {
                ty,
                payload: Some(payload),
            }),
        )
    }

    /// The host payload of an extension instance, if it has one of type `T`.
    pub fn instance_payload<T: Any>(&self, obj: RawObject) -> Option<&T> {
        match self.kind(obj) {
            ObjectKind::Instance(instance) => instance.payload.as_ref()?.downcast_ref::<T>(),
            _ => None,
        }
    }

    // ========================================================================
    // Modules and functions
    // ========================================================================

    /// Create a module and record it in the module table.
    ///
    /// The table owns the module; the returned reference is borrowed.
    pub fn create_module(&mut self, name: &str) -> RawObject {
        let module = self.alloc_object(
            self.builtins.module,
            ObjectKind::Module(ModuleObject {
                name: name.to_string(),
                dict: BTreeMap::new(),
            }),
        );
        if let Some(previous) = self.modules.insert(name.to_string(), module) {
            self.decref(previous);
        }
        module
    }

    /// Look up a module created earlier (borrowed reference).
    pub fn get_module(&self, name: &str) -> Option<RawObject> {
        self.modules.get(name).copied()
    }

    pub fn is_module(&self, obj: RawObject) -> bool {
        matches!(self.kind(obj), ObjectKind::Module(_))
    }

    pub fn module_name(&self, module: RawObject) -> Option<&str> {
        match self.kind(module) {
            ObjectKind::Module(m) => Some(&m.name),
            _ => None,
        }
    }

    /// Bind `name` to `obj` in a module namespace.
    pub fn add_object(&mut self, module: RawObject, name: &str, obj: RawObject) -> Result<(), Raised> {
        if !self.is_module(module) {
            let type_name = self.type_name(module);
            return Err(self.raise_type_error(format!(
                "cannot add '{name}' to a '{type_name}' object"
            )));
        }
        self.incref(obj);
        let previous = match &mut self.entry_mut(module).kind {
            ObjectKind::Module(m) => m.dict.insert(name.to_string(), obj),
            _ => None,
        };
        if let Some(previous) = previous {
            self.decref(previous);
        }
        Ok(())
    }

    /// Borrowed lookup in a module namespace.
    pub fn module_get(&self, module: RawObject, name: &str) -> Option<RawObject> {
        match self.kind(module) {
            ObjectKind::Module(m) => m.dict.get(name).copied(),
            _ => None,
        }
    }

    /// Create a function object for `def`.
    pub fn new_function(&mut self, def: MethodDef, binding: Binding) -> RawObject {
        match binding {
            Binding::Module(owner) | Binding::Instance(owner) | Binding::Unbound(owner) => {
                self.incref(owner)
            }
        }
        self.alloc_object(
            self.builtins.function,
            ObjectKind::Function(FunctionObject { def, binding }),
        )
    }

    // ========================================================================
    // Attribute access and calls
    // ========================================================================

    /// Names visible on `obj`, in slot order.
    pub fn attributes(&self, obj: RawObject) -> Vec<String> {
        match self.kind(obj) {
            ObjectKind::Instance(instance) => match self.type_object(instance.ty) {
                Some(ty) => ty
                    .getsets
                    .iter()
                    .map(|g| g.name.clone())
                    .chain(ty.methods.iter().map(|m| m.name.clone()))
                    .collect(),
                None => Vec::new(),
            },
            ObjectKind::Module(module) => module.dict.keys().cloned().collect(),
            ObjectKind::Type(ty) => ty.methods.iter().map(|m| m.name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    /// Read attribute `name` of `obj` (new reference).
    pub fn get_attr(
        &mut self,
        host: &mut dyn ExtensionHost,
        obj: RawObject,
        name: &str,
    ) -> Result<RawObject, Raised> {
        enum Found {
            Getter(SlotId),
            Method(MethodDef, Binding),
            Value(RawObject),
            Missing(String),
        }

        let found = match self.kind(obj) {
            ObjectKind::Instance(instance) => match self.type_object(instance.ty) {
                Some(ty) => {
                    if let Some(getset) = ty.getset(name) {
                        Found::Getter(getset.getter)
                    } else if let Some(method) = ty.method(name) {
                        Found::Method(method.clone(), Binding::Instance(obj))
                    } else {
                        Found::Missing(format!("'{}' object has no attribute '{name}'", ty.name))
                    }
                }
                None => fatal!("instance {obj} has no type object"),
            },
            ObjectKind::Module(module) => match module.dict.get(name) {
                Some(value) => Found::Value(*value),
                None => Found::Missing(format!(
                    "module '{}' has no attribute '{name}'",
                    module.name
                )),
            },
            ObjectKind::Type(ty) => match ty.method(name) {
                Some(method) => Found::Method(method.clone(), Binding::Unbound(obj)),
                None => Found::Missing(format!(
                    "type object '{}' has no attribute '{name}'",
                    ty.name
                )),
            },
            _ => Found::Missing(format!(
                "'{}' object has no attribute '{name}'",
                self.type_name(obj)
            )),
        };

        match found {
            Found::Getter(slot) => host.get(self, obj, slot),
            Found::Method(def, binding) => Ok(self.new_function(def, binding)),
            Found::Value(value) => {
                self.incref(value);
                Ok(value)
            }
            Found::Missing(message) => Err(self.raise(ExceptionKind::AttributeError, message)),
        }
    }

    /// Assign attribute `name` of `obj`.
    pub fn set_attr(
        &mut self,
        host: &mut dyn ExtensionHost,
        obj: RawObject,
        name: &str,
        value: RawObject,
    ) -> Result<(), Raised> {
        let setter = match self.kind(obj) {
            ObjectKind::Instance(instance) => match self.type_object(instance.ty) {
                Some(ty) => match ty.getset(name) {
                    Some(getset) => Ok(getset.setter),
                    None if ty.method(name).is_some() => Err(format!(
                        "'{}' object attribute '{name}' is read-only",
                        ty.name
                    )),
                    None => Err(format!("'{}' object has no attribute '{name}'", ty.name)),
                },
                None => fatal!("instance {obj} has no type object"),
            },
            ObjectKind::Module(_) => return self.add_object(obj, name, value),
            _ => Err(format!(
                "'{}' object has no attribute '{name}'",
                self.type_name(obj)
            )),
        };
        match setter {
            Ok(slot) => host.set(self, obj, value, slot),
            Err(message) => Err(self.raise(ExceptionKind::AttributeError, message)),
        }
    }

    /// Call `callable` with positional and keyword arguments.
    pub fn call(
        &mut self,
        host: &mut dyn ExtensionHost,
        callable: RawObject,
        args: &[RawObject],
        kwargs: &[(&str, RawObject)],
    ) -> Result<RawObject, Raised> {
        match self.kind(callable) {
            ObjectKind::Function(function) => {
                let function = function.clone();
                self.call_function(host, &function, args, kwargs)
            }
            ObjectKind::Type(_) => self.instantiate(host, callable, args, kwargs),
            _ => {
                let type_name = self.type_name(callable);
                Err(self.raise_type_error(format!("'{type_name}' object is not callable")))
            }
        }
    }

    /// Look up method `name` on `obj` and call it.
    pub fn call_method(
        &mut self,
        host: &mut dyn ExtensionHost,
        obj: RawObject,
        name: &str,
        args: &[RawObject],
        kwargs: &[(&str, RawObject)],
    ) -> Result<RawObject, Raised> {
        let method = self.get_attr(host, obj, name)?;
        let result = self.call(host, method, args, kwargs);
        self.decref(method);
        result
    }

    fn call_function(
        &mut self,
        host: &mut dyn ExtensionHost,
        function: &FunctionObject,
        args: &[RawObject],
        kwargs: &[(&str, RawObject)],
    ) -> Result<RawObject, Raised> {
        let name = &function.def.name;
        if !kwargs.is_empty() && !function.def.keywords {
            return Err(self.raise_type_error(format!("{name}() takes no keyword arguments")));
        }

        let (owner, args) = match function.binding {
            Binding::Module(owner) | Binding::Instance(owner) => (owner, args),
            Binding::Unbound(ty) => match args.split_first() {
                Some((first, rest)) if self.is_instance_of(*first, ty) => (*first, rest),
                _ => {
                    let type_name = self
                        .type_object(ty)
                        .map(|t| t.name.clone())
                        .unwrap_or_default();
                    return Err(self.raise_type_error(format!(
                        "descriptor '{name}' requires a '{type_name}' object"
                    )));
                }
            },
        };

        let tuple = self.new_tuple(args);
        let dict = self.kwargs_dict(kwargs);
        trace!(function = %name, slot = function.def.slot, "calling extension function");
        let result = host.call(self, owner, tuple, dict, function.def.slot);
        self.decref(tuple);
        if let Some(dict) = dict {
            self.decref(dict);
        }
        result
    }

    /// Create an instance of `ty`: allocate, then initialize.
    pub fn instantiate(
        &mut self,
        host: &mut dyn ExtensionHost,
        ty: RawObject,
        args: &[RawObject],
        kwargs: &[(&str, RawObject)],
    ) -> Result<RawObject, Raised> {
        let (name, alloc, init) = match self.type_object(ty) {
            Some(t) => (t.name.clone(), t.alloc, t.init),
            None => {
                let type_name = self.type_name(ty);
                return Err(self.raise_type_error(format!("'{type_name}' object is not callable")));
            }
        };
        if !alloc {
            return Err(self.raise_type_error(format!("cannot create '{name}' instances")));
        }

        let obj = host.alloc(self, ty)?;
        if init {
            let tuple = self.new_tuple(args);
            let dict = self.kwargs_dict(kwargs);
            let result = host.init(self, obj, tuple, dict);
            self.decref(tuple);
            if let Some(dict) = dict {
                self.decref(dict);
            }
            if result.is_err() {
                self.decref(obj);
                return Err(Raised);
            }
        } else if !args.is_empty() || !kwargs.is_empty() {
            self.decref(obj);
            return Err(self.raise_type_error(format!("{name}() takes no arguments")));
        }
        Ok(obj)
    }

    fn kwargs_dict(&mut self, kwargs: &[(&str, RawObject)]) -> Option<RawObject> {
        if kwargs.is_empty() {
            return None;
        }
        let dict = self.new_dict();
        for (key, value) in kwargs {
            let key = self.new_str(*key);
            self.dict_insert(dict, key, *value);
            self.decref(key);
        }
        Some(dict)
    }
}

fn builtin_type(name: &str) -> TypeObject {
    TypeObject {
        name: name.to_string(),
        ..TypeObject::default()
    }
}
