//! Registration metadata and the state shared by every bridge entry point.

use std::collections::HashMap;
use std::rc::Rc;

use crate::config::BridgeConfig;
use crate::holder::{HolderId, HolderRegistry};
use crate::logging::fatal;
use crate::runtime::{ObjectKind, RawObject, Runtime, SlotId};
use crate::shape::{HostFn, Receiver, RecordShape, Shape};
use crate::value::Pointer;

/// One callable exposed in a namespace.
#[derive(Debug)]
pub(crate) struct MethodSlot {
    /// Name seen by the runtime.
    pub name: String,
    pub function: HostFn,
    /// How the instance is passed, if it is passed at all.
    pub receiver: Option<Receiver>,
    /// Positional parameters supplied by the caller; no receiver, no kwargs.
    pub params: Vec<Shape>,
    pub keywords: bool,
}

/// Getter/setter pair for one exported record field.
#[derive(Debug)]
pub(crate) struct FieldAccessor {
    pub name: String,
    pub field_index: usize,
    pub shape: Shape,
}

#[derive(Debug, Clone)]
pub(crate) enum SlotMetadata {
    Method(Rc<MethodSlot>),
    Field(Rc<FieldAccessor>),
}

/// Dispatch table of one bridged type or module.
#[derive(Debug)]
pub(crate) struct TypeMetadata {
    /// Name used in error messages and logs.
    pub name: String,
    /// Record backing each instance; `None` for modules.
    pub shape: Option<Rc<RecordShape>>,
    pub init: Option<Rc<MethodSlot>>,
    pub slots: Vec<SlotMetadata>,
}

impl TypeMetadata {
    pub(crate) fn exposes(&self, name: &str) -> bool {
        self.slots.iter().any(|slot| match slot {
            SlotMetadata::Method(method) => method.name == name,
            SlotMetadata::Field(field) => field.name == name,
        })
    }
}

/// Payload stored in every bridged instance.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WrapperData {
    pub holder: HolderId,
}

/// Everything the bridge knows about registered types, plus the holders
/// pinning instance storage.
pub(crate) struct Registry {
    /// Keyed by runtime type object, or by module for module functions.
    pub types: HashMap<RawObject, TypeMetadata>,
    /// Host type name to runtime type object.
    pub host_types: HashMap<String, RawObject>,
    pub holders: HolderRegistry,
    pub config: BridgeConfig,
    /// Numbers nameless functions.
    pub anonymous: usize,
    /// Unbound method objects handed out for type methods; one reference each.
    pub descriptors: Vec<RawObject>,
}

impl Registry {
    pub(crate) fn new(config: BridgeConfig) -> Self {
        Self {
            types: HashMap::new(),
            host_types: HashMap::new(),
            holders: HolderRegistry::new(),
            config,
            anonymous: 0,
            descriptors: Vec::new(),
        }
    }

    /// Metadata for the namespace an owner dispatches through: the module
    /// itself, or the type of an instance.
    pub(crate) fn namespace_of(&self, rt: &Runtime, owner: RawObject) -> (RawObject, &TypeMetadata) {
        let key = if rt.is_module(owner) {
            owner
        } else {
            rt.type_of(owner)
        };
        match self.types.get(&key) {
            Some(meta) => (key, meta),
            None => fatal!("type {} not registered", rt.repr(key)),
        }
    }

    pub(crate) fn slot(&self, rt: &Runtime, owner: RawObject, slot: SlotId) -> SlotMetadata {
        let (_, meta) = self.namespace_of(rt, owner);
        match meta.slots.get(slot) {
            Some(found) => found.clone(),
            None => fatal!("slot {slot} not found on {}", meta.name),
        }
    }

    pub(crate) fn field_accessor(&self, rt: &Runtime, obj: RawObject, slot: SlotId) -> Rc<FieldAccessor> {
        match self.slot(rt, obj, slot) {
            SlotMetadata::Field(field) => field,
            SlotMetadata::Method(method) => {
                fatal!("slot {slot} is method '{}', not a field accessor", method.name)
            }
        }
    }

    /// Storage behind a bridged instance.
    pub(crate) fn place_of(&self, rt: &Runtime, obj: RawObject) -> Pointer {
        let Some(data) = rt.instance_payload::<WrapperData>(obj) else {
            fatal!("object {} is not a bridged instance", rt.repr(obj));
        };
        match self.holders.get(data.holder) {
            Some(place) => place.clone(),
            None => fatal!("instance {obj} lost its holder"),
        }
    }

    /// Record shape and storage of `obj` if it is a bridged instance.
    pub(crate) fn instance_record(&self, rt: &Runtime, obj: RawObject) -> Option<(Rc<RecordShape>, Pointer)> {
        if !matches!(rt.kind(obj), ObjectKind::Instance(_)) {
            return None;
        }
        let shape = self.types.get(&rt.type_of(obj))?.shape.clone()?;
        let data = rt.instance_payload::<WrapperData>(obj)?;
        let place = self.holders.get(data.holder)?.clone();
        Some((shape, place))
    }

    /// Storage of `obj` if it is an instance of a type bridging `record`.
    pub(crate) fn compatible_place(&self, rt: &Runtime, obj: RawObject, record: &RecordShape) -> Option<Pointer> {
        self.instance_record(rt, obj)
            .filter(|(shape, _)| shape.name == record.name)
            .map(|(_, place)| place)
    }

    /// The registered shape for `record`'s host type, or `record` itself.
    /// Self-referential records name themselves through a fieldless
    /// placeholder; this swaps in the full shape.
    pub(crate) fn resolve_record(&self, record: &Rc<RecordShape>) -> Rc<RecordShape> {
        self.host_types
            .get(&record.name)
            .and_then(|ty| self.types.get(ty)?.shape.clone())
            .unwrap_or_else(|| Rc::clone(record))
    }

    /// Create an instance of `ty` whose holder pins `place`.
    pub(crate) fn new_instance(&mut self, rt: &mut Runtime, ty: RawObject, place: Pointer) -> RawObject {
        let holder = self.holders.pin(place);
        rt.alloc_instance(ty, Box::new(WrapperData { holder }))
    }

    /// Drop all metadata and holders.
    pub(crate) fn reset(&mut self) {
        self.descriptors.clear();
        self.types.clear();
        self.host_types.clear();
        self.holders.clear();
        self.anonymous = 0;
    }
}
