//! The bridge context: registration, dispatch and the host-side object API.
//!
//! A [`Bridge`] owns one embedded [`Runtime`] and the registry of bridged
//! types, functions and pinned instance storage. Every entry point of the
//! runtime that lands in host code goes through the registry, which
//! implements [`ExtensionHost`](crate::runtime::ExtensionHost).
//!
//! # Example
//!
//! ```ignore
//! use objbridge::prelude::*;
//!
//! let mut bridge = Bridge::new();
//! let point = RecordShape::new("geo.Point")
//!     .field("X", Shape::Int(IntWidth::W64))
//!     .field("Y", Shape::Int(IntWidth::W64))
//!     .build();
//! let main = bridge.main_module();
//! let ty = bridge.register_type(main, &point, None, "Point", "A point.")?;
//!
//! let p = bridge.call(ty, &[], &[])?;
//! let seven = bridge.from_host(&Value::Int(7));
//! bridge.set_attr(p, "x", seven)?;
//! ```

mod dispatch;
mod function;
mod registry;
mod types;

pub use function::FunctionHandle;
pub(crate) use registry::Registry;

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::handle::ObjectHandle;
use crate::logging::{debug, info};
use crate::runtime::{ExceptionKind, Raised, RawObject, Runtime, RuntimeError};
use crate::shape::{HostFn, Shape};
use crate::value::Value;

/// An embedded runtime together with everything bridged into it.
///
/// Handles returned by `call`, `call_method`, `get_attr` and `from_host`
/// are new references; give them back with [`Bridge::release`]. Handles
/// returned by `main_module`, `create_module`, `type_of`, `register_type`
/// and in [`FunctionHandle`] are borrowed from their namespace.
pub struct Bridge {
    runtime: Runtime,
    registry: Registry,
    main: RawObject,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    /// Start a runtime with an empty registry and the main module.
    pub fn with_config(config: BridgeConfig) -> Self {
        let mut runtime = Runtime::new();
        let main = runtime.create_module(&config.main_module);
        info!(
            main_module = %config.main_module,
            max_slots = config.max_slots,
            "bridge initialized"
        );
        Self {
            runtime,
            registry: Registry::new(config),
            main,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.registry.config
    }

    /// The embedded runtime, for primitive operations on raw objects.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub fn main_module(&self) -> ObjectHandle {
        ObjectHandle::from_raw(self.main)
    }

    /// The module called `name`, created on first use.
    pub fn create_module(&mut self, name: &str) -> ObjectHandle {
        let module = match self.runtime.get_module(name) {
            Some(module) => module,
            None => {
                debug!(module = %name, "creating module");
                self.runtime.create_module(name)
            }
        };
        ObjectHandle::from_raw(module)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Expose a record shape as a type named `name` in `module`.
    ///
    /// `shape` must be a record or a pointer to one. Registering the same
    /// host type twice returns the type created the first time.
    pub fn register_type(
        &mut self,
        module: ObjectHandle,
        shape: &Shape,
        init: Option<HostFn>,
        name: &str,
        doc: &str,
    ) -> Result<ObjectHandle> {
        let module = object(module)?;
        let ty = self
            .registry
            .register_type(&mut self.runtime, module, shape, init, name, doc)?;
        Ok(ObjectHandle::from_raw(ty))
    }

    /// Publish `function` in a module or a bridged type.
    ///
    /// An empty `name` derives the exposed name from the function.
    pub fn register_function(
        &mut self,
        namespace: ObjectHandle,
        name: &str,
        function: HostFn,
        doc: &str,
    ) -> Result<FunctionHandle> {
        let namespace = object(namespace)?;
        Ok(self
            .registry
            .register_function(&mut self.runtime, namespace, name, function, doc)?)
    }

    /// Publish `function` in the main module.
    pub fn create_function(&mut self, name: &str, function: HostFn, doc: &str) -> Result<FunctionHandle> {
        self.register_function(self.main_module(), name, function, doc)
    }

    /// Publish `function` in the main module under its own name.
    pub fn function_of(&mut self, function: HostFn) -> Result<FunctionHandle> {
        self.create_function("", function, "")
    }

    /// Runtime type bridging the host type `host_name`, if registered.
    pub fn registered_type(&self, host_name: &str) -> Option<ObjectHandle> {
        self.registry
            .host_types
            .get(host_name)
            .map(|&ty| ObjectHandle::from_raw(ty))
    }

    // ========================================================================
    // Object API
    // ========================================================================

    /// Call `callable`. Calling a type creates an instance.
    pub fn call(
        &mut self,
        callable: ObjectHandle,
        args: &[ObjectHandle],
        kwargs: &[(&str, ObjectHandle)],
    ) -> Result<ObjectHandle> {
        let callable = object(callable)?;
        let args = objects(args)?;
        let kwargs = keyword_objects(kwargs)?;
        let result = self
            .runtime
            .call(&mut self.registry, callable, &args, &kwargs);
        self.finish(result).map(ObjectHandle::from_raw)
    }

    pub fn call_method(
        &mut self,
        obj: ObjectHandle,
        name: &str,
        args: &[ObjectHandle],
        kwargs: &[(&str, ObjectHandle)],
    ) -> Result<ObjectHandle> {
        let obj = object(obj)?;
        let args = objects(args)?;
        let kwargs = keyword_objects(kwargs)?;
        let result = self
            .runtime
            .call_method(&mut self.registry, obj, name, &args, &kwargs);
        self.finish(result).map(ObjectHandle::from_raw)
    }

    pub fn get_attr(&mut self, obj: ObjectHandle, name: &str) -> Result<ObjectHandle> {
        let obj = object(obj)?;
        let result = self.runtime.get_attr(&mut self.registry, obj, name);
        self.finish(result).map(ObjectHandle::from_raw)
    }

    pub fn set_attr(&mut self, obj: ObjectHandle, name: &str, value: ObjectHandle) -> Result<()> {
        let obj = object(obj)?;
        let value = object(value)?;
        let result = self.runtime.set_attr(&mut self.registry, obj, name, value);
        self.finish(result)
    }

    /// Convert `obj` to a host value of `shape`.
    ///
    /// Objects inside the result (`Value::Object`, keyword argument values)
    /// are borrowed from `obj`.
    pub fn to_host(&self, obj: ObjectHandle, shape: &Shape) -> Result<Value> {
        let obj = object(obj)?;
        Ok(self.registry.to_host(&self.runtime, obj, shape)?)
    }

    /// Build a runtime object from a host value (new reference).
    pub fn from_host(&mut self, value: &Value) -> ObjectHandle {
        ObjectHandle::from_raw(self.registry.from_host(&mut self.runtime, value))
    }

    /// Take a reference to `obj`. Null handles are ignored.
    pub fn retain(&mut self, obj: ObjectHandle) {
        if let Some(raw) = obj.raw() {
            self.runtime.incref(raw);
        }
    }

    /// Give back a reference to `obj`. Null handles are ignored.
    pub fn release(&mut self, obj: ObjectHandle) {
        if let Some(raw) = obj.raw() {
            self.runtime.decref(raw);
            self.runtime.drain_finalizers(&mut self.registry);
        }
    }

    pub fn repr(&self, obj: ObjectHandle) -> Result<String> {
        Ok(self.runtime.repr(object(obj)?))
    }

    pub fn str(&self, obj: ObjectHandle) -> Result<String> {
        Ok(self.runtime.str(object(obj)?))
    }

    /// Value equality as the runtime defines it.
    pub fn equals(&self, a: ObjectHandle, b: ObjectHandle) -> Result<bool> {
        Ok(self.runtime.objects_equal(object(a)?, object(b)?))
    }

    pub fn type_of(&self, obj: ObjectHandle) -> Result<ObjectHandle> {
        Ok(ObjectHandle::from_raw(self.runtime.type_of(object(obj)?)))
    }

    /// Attribute names visible on `obj`.
    pub fn attributes(&self, obj: ObjectHandle) -> Result<Vec<String>> {
        Ok(self.runtime.attributes(object(obj)?))
    }

    /// Fetch and clear the runtime's pending exception.
    pub fn take_error(&mut self) -> Option<RuntimeError> {
        self.runtime.take_error()
    }

    /// Number of pinned instance storages.
    pub fn holder_count(&self) -> usize {
        self.registry.holders.len()
    }

    /// Tear down: drop every holder and all registration metadata.
    pub fn shutdown(mut self) {
        self.runtime.drain_finalizers(&mut self.registry);
        info!(
            holders = self.registry.holders.len(),
            types = self.registry.host_types.len(),
            "bridge shutting down"
        );
        self.registry.reset();
    }

    /// Run pending finalizers, then turn a runtime failure into the pending
    /// exception.
    fn finish<T>(&mut self, result: std::result::Result<T, Raised>) -> Result<T> {
        self.runtime.drain_finalizers(&mut self.registry);
        result.map_err(|Raised| {
            let error = self.runtime.take_error().unwrap_or_else(|| {
                RuntimeError::new(ExceptionKind::RuntimeError, "call failed without an exception")
            });
            Error::Runtime(error)
        })
    }
}

fn object(handle: ObjectHandle) -> Result<RawObject> {
    handle.raw().ok_or(Error::NullHandle)
}

fn objects(handles: &[ObjectHandle]) -> Result<Vec<RawObject>> {
    handles.iter().map(|&handle| object(handle)).collect()
}

fn keyword_objects<'a>(kwargs: &[(&'a str, ObjectHandle)]) -> Result<Vec<(&'a str, RawObject)>> {
    kwargs
        .iter()
        .map(|&(name, handle)| Ok((name, object(handle)?)))
        .collect()
}
