//! Extension types backed by host records.
//!
//! Registration turns a [`RecordShape`] into a runtime type object and a
//! [`TypeMetadata`] dispatch table. The runtime then drives the type through
//! the [`ExtensionHost`] entry points implemented here: allocation pins a
//! zeroed record, deallocation unpins it, field access goes through the
//! getter/setter slots, and initialization and methods go through dispatch.

use std::collections::HashSet;
use std::rc::Rc;

use super::registry::{FieldAccessor, MethodSlot, Registry, SlotMetadata, TypeMetadata, WrapperData};
use crate::error::RegistrationError;
use crate::logging::{debug, fatal, info, trace, warn};
use crate::runtime::{
    ExtensionHost, GetSetDef, MethodDef, Raised, RawObject, Runtime, SlotId, TypeObject,
};
use crate::shape::{HostFn, Receiver, RecordShape, Shape, to_snake_name};
use crate::value::{Pointer, RecordValue, Value};

/// Validated layout of one type, ready to be installed.
struct TypePlan {
    record: Rc<RecordShape>,
    slots: Vec<SlotMetadata>,
    getsets: Vec<GetSetDef>,
    methods: Vec<MethodDef>,
}

impl Registry {
    /// Register `shape` as an extension type named `name` in `module`.
    ///
    /// Registering the same host type again returns the existing type.
    /// Every check runs before any runtime object is created.
    pub(crate) fn register_type(
        &mut self,
        rt: &mut Runtime,
        module: RawObject,
        shape: &Shape,
        init: Option<HostFn>,
        name: &str,
        doc: &str,
    ) -> Result<RawObject, RegistrationError> {
        let record = shape
            .record_target()
            .cloned()
            .ok_or_else(|| RegistrationError::NotARecord {
                shape: shape.to_string(),
            })?;
        if !rt.is_module(module) {
            return Err(RegistrationError::InvalidNamespace(rt.repr(module)));
        }
        if let Some(&ty) = self.host_types.get(&record.name) {
            trace!(type_name = %record.name, "type already registered");
            return Ok(ty);
        }

        let init = init.map(|f| init_slot(&record, f)).transpose()?;
        let plan = self.plan_type(&record)?;
        let mut nested = Vec::new();
        self.plan_nested(&record, &mut HashSet::from([record.name.clone()]), &mut nested)?;

        let ty = self.install(rt, module, plan, init, name, doc);
        for plan in nested {
            let bare = plan.record.bare_name().to_string();
            self.install(rt, module, plan, None, &bare, "");
        }
        Ok(ty)
    }

    /// Slot layout for `record`: one getter and one setter slot per exported
    /// field, then one slot per method.
    fn plan_type(&self, record: &Rc<RecordShape>) -> Result<TypePlan, RegistrationError> {
        let mut seen = HashSet::new();
        let mut slots = Vec::new();
        let mut getsets = Vec::new();
        let mut methods = Vec::new();
        let mut claim = |name: &str| {
            if seen.insert(name.to_string()) {
                Ok(())
            } else {
                Err(RegistrationError::DuplicateName {
                    namespace: record.name.clone(),
                    name: name.to_string(),
                })
            }
        };

        if let Some(field) = record.fields.iter().find(|f| f.shape.carries_handles()) {
            return Err(RegistrationError::UnsupportedField {
                type_name: record.name.clone(),
                field: field.name.clone(),
                shape: field.shape.to_string(),
            });
        }

        for (index, field) in record.exported_fields() {
            let name = field.exposed_name();
            claim(&name)?;
            let accessor = Rc::new(FieldAccessor {
                name: name.clone(),
                field_index: index,
                shape: field.shape.clone(),
            });
            let getter = slots.len();
            slots.push(SlotMetadata::Field(Rc::clone(&accessor)));
            let setter = slots.len();
            slots.push(SlotMetadata::Field(accessor));
            getsets.push(GetSetDef {
                name,
                getter,
                setter,
                doc: None,
            });
        }

        for function in &record.methods {
            let name = to_snake_name(&function.name);
            let Some(receiver) = function.receiver else {
                return Err(RegistrationError::InvalidMethod {
                    type_name: record.name.clone(),
                    name: function.name.clone(),
                    reason: "record methods must declare a receiver".to_string(),
                });
            };
            claim(&name)?;
            let keywords = function.accepts_kwargs();
            methods.push(MethodDef {
                name: name.clone(),
                slot: slots.len(),
                keywords,
                doc: None,
            });
            slots.push(SlotMetadata::Method(Rc::new(MethodSlot {
                name,
                params: function.positional_params().to_vec(),
                function: function.clone(),
                receiver: Some(receiver),
                keywords,
            })));
        }

        if slots.len() > self.config.max_slots {
            return Err(RegistrationError::SlotCapacity {
                namespace: record.name.clone(),
                capacity: self.config.max_slots,
            });
        }
        Ok(TypePlan {
            record: Rc::clone(record),
            slots,
            getsets,
            methods,
        })
    }

    /// Plans for every unregistered record reachable through exported
    /// record or record-pointer fields, parents before children.
    fn plan_nested(
        &self,
        record: &RecordShape,
        visited: &mut HashSet<String>,
        plans: &mut Vec<TypePlan>,
    ) -> Result<(), RegistrationError> {
        for (_, field) in record.exported_fields() {
            let Some(nested) = field.shape.record_target() else {
                continue;
            };
            if self.host_types.contains_key(&nested.name) || !visited.insert(nested.name.clone()) {
                continue;
            }
            plans.push(self.plan_type(nested)?);
            self.plan_nested(nested, visited, plans)?;
        }
        Ok(())
    }

    fn install(
        &mut self,
        rt: &mut Runtime,
        module: RawObject,
        plan: TypePlan,
        init: Option<MethodSlot>,
        name: &str,
        doc: &str,
    ) -> RawObject {
        let module_name = rt.module_name(module).unwrap_or_default().to_string();
        let qualified = format!("{module_name}.{name}");
        let ty = rt.new_type(TypeObject {
            name: qualified.clone(),
            doc: (!doc.is_empty()).then(|| doc.to_string()),
            alloc: true,
            dealloc: true,
            init: init.is_some(),
            getsets: plan.getsets,
            methods: plan.methods,
        });
        if rt.add_object(module, name, ty).is_err() {
            fatal!("failed to add type {qualified} to module {module_name}");
        }

        info!(
            type_name = %qualified,
            host_type = %plan.record.name,
            slots = plan.slots.len(),
            "registered extension type"
        );
        self.host_types.insert(plan.record.name.clone(), ty);
        self.types.insert(
            ty,
            TypeMetadata {
                name: qualified,
                shape: Some(plan.record),
                init: init.map(Rc::new),
                slots: plan.slots,
            },
        );
        ty
    }

    // ========================================================================
    // Field access
    // ========================================================================

    /// Getter entry point. Registered record fields come back as views that
    /// alias the parent's storage; everything else is converted.
    fn get_field(&mut self, rt: &mut Runtime, obj: RawObject, slot: SlotId) -> RawObject {
        let accessor = self.field_accessor(rt, obj, slot);
        let place = self.place_of(rt, obj).field(accessor.field_index);
        trace!(field = %accessor.name, "get field");

        match &accessor.shape {
            Shape::Ptr(target) => {
                if let Some(record) = target.record() {
                    match place.get() {
                        Value::Ptr(None) => return rt.none(),
                        Value::Ptr(Some(pointee)) => {
                            if let Some(&ty) = self.host_types.get(&record.name) {
                                return self.new_instance(rt, ty, pointee);
                            }
                        }
                        other => fatal!(
                            "field '{}' holds a {} value, expected a pointer",
                            accessor.name,
                            other.kind_name()
                        ),
                    }
                }
            }
            Shape::Record(record) => {
                if let Some(&ty) = self.host_types.get(&record.name) {
                    return self.new_instance(rt, ty, place);
                }
            }
            _ => {}
        }
        let value = place.get();
        self.from_host(rt, &value)
    }

    /// Setter entry point.
    fn set_field(&mut self, rt: &mut Runtime, obj: RawObject, value: RawObject, slot: SlotId) -> Result<(), Raised> {
        let accessor = self.field_accessor(rt, obj, slot);
        let place = self.place_of(rt, obj).field(accessor.field_index);
        trace!(field = %accessor.name, "set field");

        if let Some(record) = accessor.shape.record_target() {
            return if accessor.shape.is_record_ptr() {
                self.set_record_ptr(rt, &place, value, record)
            } else {
                self.set_record(rt, &place, value, record)
            };
        }

        match self.to_host(rt, value, &accessor.shape) {
            Ok(converted) => {
                place.set(converted);
                Ok(())
            }
            Err(e) => {
                warn!(field = %accessor.name, error = %e, "rejected field value");
                Err(rt.raise_type_error(format!("failed to convert value to {}: {e}", accessor.shape)))
            }
        }
    }

    fn set_record_ptr(
        &self,
        rt: &mut Runtime,
        place: &Pointer,
        value: RawObject,
        record: &Rc<RecordShape>,
    ) -> Result<(), Raised> {
        if rt.is_none(value) {
            place.set(Value::Ptr(None));
            return Ok(());
        }
        if rt.is_dict(value) {
            let converted = self
                .to_host(rt, value, &Shape::Record(Rc::clone(record)))
                .map_err(|e| rt.raise_type_error(format!("failed to convert dict to {}: {e}", record.name)))?;
            match place.get() {
                Value::Ptr(Some(pointee)) => pointee.set(converted),
                _ => place.set(Value::Ptr(Some(Pointer::new(converted)))),
            }
            return Ok(());
        }
        match self.compatible_place(rt, value, record) {
            Some(pointee) => {
                place.set(Value::Ptr(Some(pointee)));
                Ok(())
            }
            None => {
                let type_name = rt.type_name(value);
                Err(rt.raise_type_error(format!(
                    "invalid value of type {type_name} for record pointer field"
                )))
            }
        }
    }

    fn set_record(
        &self,
        rt: &mut Runtime,
        place: &Pointer,
        value: RawObject,
        record: &Rc<RecordShape>,
    ) -> Result<(), Raised> {
        if rt.is_dict(value) {
            let converted = self
                .to_host(rt, value, &Shape::Record(Rc::clone(record)))
                .map_err(|e| rt.raise_type_error(format!("failed to convert dict to {}: {e}", record.name)))?;
            place.set(converted);
            return Ok(());
        }
        // Copies the record; pointers inside it stay shared.
        match self.compatible_place(rt, value, record) {
            Some(source) => {
                place.set(source.get());
                Ok(())
            }
            None => {
                let type_name = rt.type_name(value);
                Err(rt.raise_type_error(format!(
                    "invalid value of type {type_name} for record field"
                )))
            }
        }
    }
}

/// Validate an initializer and describe how dispatch calls it.
///
/// Receiver style: a pointer-receiver method, or a free function whose first
/// parameter points to the record. It mutates the allocated instance and
/// returns nothing. Constructor style: a free function returning the record
/// or a pointer to it; its result is copied into the instance.
fn init_slot(record: &RecordShape, function: HostFn) -> Result<MethodSlot, RegistrationError> {
    let invalid = |reason: &str| RegistrationError::InvalidInit {
        type_name: record.name.clone(),
        reason: reason.to_string(),
    };
    let is_self = |shape: &Shape| shape.record().is_some_and(|r| r.name == record.name);
    let points_to_self = |shape: &Shape| matches!(shape, Shape::Ptr(target) if is_self(&**target));

    let positional = function.positional_params();
    let (receiver, params) = match function.receiver {
        Some(Receiver::Pointer) => (Some(Receiver::Pointer), positional.to_vec()),
        Some(Receiver::Value) => return Err(invalid("a value receiver cannot initialize an instance")),
        None => match positional.split_first() {
            Some((first, rest)) if points_to_self(first) => (Some(Receiver::Pointer), rest.to_vec()),
            _ => {
                let constructs = matches!(function.results.as_slice(), [result] if is_self(result) || points_to_self(result));
                if !constructs {
                    return Err(invalid(
                        "must take a pointer to the record or return the record",
                    ));
                }
                (None, positional.to_vec())
            }
        },
    };
    if receiver.is_some() && !function.results.is_empty() {
        return Err(invalid("a receiver-style initializer must not return values"));
    }

    let name = if function.name.is_empty() {
        "__init__".to_string()
    } else {
        function.name.clone()
    };
    debug!(type_name = %record.name, init = %name, constructor = receiver.is_none(), "validated initializer");
    Ok(MethodSlot {
        name,
        keywords: function.accepts_kwargs(),
        receiver,
        params,
        function,
    })
}

impl ExtensionHost for Registry {
    fn alloc(&mut self, rt: &mut Runtime, ty: RawObject) -> Result<RawObject, Raised> {
        let Some(record) = self.types.get(&ty).and_then(|meta| meta.shape.clone()) else {
            fatal!("type {} not registered", rt.repr(ty));
        };
        let place = Pointer::new(Value::Record(RecordValue::zero(&record)));
        let obj = self.new_instance(rt, ty, place);
        trace!(type_name = %record.name, object = %obj, "allocated instance");
        Ok(obj)
    }

    fn dealloc(&mut self, rt: &mut Runtime, obj: RawObject) {
        let Some(data) = rt.instance_payload::<WrapperData>(obj).copied() else {
            fatal!("deallocating {obj}, which is not a bridged instance");
        };
        self.holders.unpin(data.holder);
        trace!(object = %obj, pinned = self.holders.len(), "deallocated instance");
        rt.free_object(obj);
    }

    fn init(
        &mut self,
        rt: &mut Runtime,
        obj: RawObject,
        args: RawObject,
        kwargs: Option<RawObject>,
    ) -> Result<(), Raised> {
        self.dispatch_init(rt, obj, args, kwargs)
    }

    fn get(&mut self, rt: &mut Runtime, obj: RawObject, slot: SlotId) -> Result<RawObject, Raised> {
        Ok(self.get_field(rt, obj, slot))
    }

    fn set(
        &mut self,
        rt: &mut Runtime,
        obj: RawObject,
        value: RawObject,
        slot: SlotId,
    ) -> Result<(), Raised> {
        self.set_field(rt, obj, value, slot)
    }

    fn call(
        &mut self,
        rt: &mut Runtime,
        owner: RawObject,
        args: RawObject,
        kwargs: Option<RawObject>,
        slot: SlotId,
    ) -> Result<RawObject, Raised> {
        self.dispatch_call(rt, owner, args, kwargs, slot)
    }
}
