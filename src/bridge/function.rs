//! Publishing host functions in module and type namespaces.

use std::rc::Rc;

use super::registry::{MethodSlot, Registry, SlotMetadata, TypeMetadata};
use crate::error::RegistrationError;
use crate::handle::ObjectHandle;
use crate::logging::{debug, fatal};
use crate::runtime::{Binding, MethodDef, RawObject, Runtime};
use crate::shape::{HostFn, Receiver, Shape, to_snake_name};

/// A host function published in a namespace.
///
/// For module functions the handle is borrowed from the module. For type
/// methods it is the unbound method descriptor, kept alive by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionHandle {
    handle: ObjectHandle,
    name: String,
    doc: Option<String>,
}

impl FunctionHandle {
    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    /// Name the runtime sees.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

/// Call signature in the runtime's doc convention, for example
/// `(arg0, arg1, /, **kwargs)`.
fn signature(params: usize, keywords: bool) -> String {
    let mut parts: Vec<String> = (0..params).map(|i| format!("arg{i}")).collect();
    if !parts.is_empty() {
        parts.push("/".to_string());
    }
    if keywords {
        parts.push("**kwargs".to_string());
    }
    format!("({})", parts.join(", "))
}

impl Registry {
    /// Name a function is published under: the explicit name, else the
    /// function's own name without its path, snake-cased. Nameless
    /// functions are numbered.
    fn exposed_name(&mut self, explicit: &str, function: &HostFn) -> String {
        let source = if explicit.is_empty() {
            function.name.as_str()
        } else {
            explicit
        };
        if source.is_empty() {
            let name = format!("anonymous_func_{}", self.anonymous);
            self.anonymous += 1;
            return name;
        }
        let tail = source.rsplit("::").next().unwrap_or(source);
        let tail = tail.rsplit('.').next().unwrap_or(tail);
        to_snake_name(tail)
    }

    /// Publish `function` in a module or a bridged type.
    ///
    /// In a type namespace a first parameter of the type itself (or a
    /// pointer to it) binds the instance. In a module every parameter is
    /// positional.
    pub(crate) fn register_function(
        &mut self,
        rt: &mut Runtime,
        namespace: RawObject,
        name: &str,
        function: HostFn,
        doc: &str,
    ) -> Result<FunctionHandle, RegistrationError> {
        let is_module = rt.is_module(namespace);
        let record = match self.types.get(&namespace) {
            Some(meta) if !is_module => meta.shape.clone(),
            _ => None,
        };
        if !is_module && record.is_none() {
            return Err(RegistrationError::InvalidNamespace(rt.repr(namespace)));
        }
        let namespace_name = match (&record, rt.module_name(namespace)) {
            (Some(record), _) => record.name.clone(),
            (None, Some(module)) => module.to_string(),
            (None, None) => rt.repr(namespace),
        };

        let exposed = self.exposed_name(name, &function);
        let positional = function.positional_params();
        let (receiver, params) = match (&record, function.receiver) {
            (None, Some(_)) => {
                return Err(RegistrationError::InvalidMethod {
                    type_name: namespace_name,
                    name: exposed,
                    reason: "module functions cannot take a receiver".to_string(),
                });
            }
            (None, None) => (None, positional.to_vec()),
            (Some(_), Some(receiver)) => (Some(receiver), positional.to_vec()),
            (Some(record), None) => {
                let is_self = |shape: &Shape| shape.record().is_some_and(|r| r.name == record.name);
                match positional.split_first() {
                    Some((Shape::Ptr(target), rest)) if is_self(&**target) => {
                        (Some(Receiver::Pointer), rest.to_vec())
                    }
                    Some((first, rest)) if is_self(first) => (Some(Receiver::Value), rest.to_vec()),
                    _ => (None, positional.to_vec()),
                }
            }
        };
        let keywords = function.accepts_kwargs();

        let slot = match self.types.get(&namespace) {
            Some(meta) if meta.exposes(&exposed) => {
                return Err(RegistrationError::DuplicateName {
                    namespace: namespace_name,
                    name: exposed,
                });
            }
            Some(meta) => meta.slots.len(),
            None => 0,
        };
        if slot >= self.config.max_slots {
            return Err(RegistrationError::SlotCapacity {
                namespace: namespace_name,
                capacity: self.config.max_slots,
            });
        }

        let doc = if self.config.signature_docs {
            Some(format!("{exposed}{}\n--\n\n{doc}", signature(params.len(), keywords)))
        } else {
            (!doc.is_empty()).then(|| doc.to_string())
        };
        let def = MethodDef {
            name: exposed.clone(),
            slot,
            keywords,
            doc: doc.clone(),
        };

        debug!(
            namespace = %namespace_name,
            function = %exposed,
            slot = slot,
            receiver = ?receiver,
            keywords = keywords,
            "registering function"
        );
        self.types
            .entry(namespace)
            .or_insert_with(|| TypeMetadata {
                name: namespace_name,
                shape: None,
                init: None,
                slots: Vec::new(),
            })
            .slots
            .push(SlotMetadata::Method(Rc::new(MethodSlot {
                name: exposed.clone(),
                function,
                receiver,
                params,
                keywords,
            })));

        let object = if is_module {
            let object = rt.new_function(def, Binding::Module(namespace));
            if rt.add_object(namespace, &exposed, object).is_err() {
                fatal!("failed to add function {exposed} to its module");
            }
            rt.decref(object);
            object
        } else {
            if let Some(ty) = rt.type_object_mut(namespace) {
                ty.methods.push(def.clone());
            }
            let object = rt.new_function(def, Binding::Unbound(namespace));
            self.descriptors.push(object);
            object
        };

        Ok(FunctionHandle {
            handle: ObjectHandle::from_raw(object),
            name: exposed,
            doc,
        })
    }
}
