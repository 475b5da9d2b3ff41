//! Value marshaling between host values and runtime objects.
//!
//! [`Registry::to_host`] walks a target [`Shape`] and converts a runtime
//! object into a [`Value`]; [`Registry::from_host`] walks a value and builds
//! the matching runtime object. Conversions live on the registry because
//! bridged instances convert differently from plain data: a compatible
//! instance converts to its own storage, and a record of a registered type
//! becomes an instance rather than a dict.
//!
//! Conversion failures are soft: `to_host` returns [`ConvertError`] and never
//! raises on its own. Map entries and record fields read from a dict are the
//! exception. A partially converted map or record has no defined meaning, so
//! those failures are fatal.

use std::rc::Rc;

use crate::bridge::Registry;
use crate::error::ConvertError;
use crate::handle::ObjectHandle;
use crate::logging::{fatal, trace};
use crate::runtime::{RawObject, Runtime};
use crate::shape::{ComplexWidth, FloatWidth, IntWidth, RecordShape, Shape};
use crate::value::{KwArgs, Pointer, RecordValue, Value};

/// Two's complement truncation of a runtime integer to a signed width.
pub(crate) fn truncate_int(value: i128, width: IntWidth) -> i64 {
    match width {
        IntWidth::W8 => value as i8 as i64,
        IntWidth::W16 => value as i16 as i64,
        IntWidth::W32 => value as i32 as i64,
        IntWidth::W64 => value as i64,
    }
}

/// Two's complement truncation of a runtime integer to an unsigned width.
pub(crate) fn truncate_uint(value: i128, width: IntWidth) -> u64 {
    match width {
        IntWidth::W8 => value as u8 as u64,
        IntWidth::W16 => value as u16 as u64,
        IntWidth::W32 => value as u32 as u64,
        IntWidth::W64 => value as u64,
    }
}

fn round_float(value: f64, width: FloatWidth) -> f64 {
    match width {
        FloatWidth::W32 => value as f32 as f64,
        FloatWidth::W64 => value,
    }
}

impl Registry {
    /// Convert `obj` to a host value of `shape`.
    ///
    /// Runtime objects embedded in the result (`Shape::Object` and keyword
    /// argument values) are borrowed handles, valid while `obj` is alive.
    pub fn to_host(&self, rt: &Runtime, obj: RawObject, shape: &Shape) -> Result<Value, ConvertError> {
        let mismatch = || ConvertError::mismatch(shape, rt.type_name(obj));
        match shape {
            Shape::Bool => rt.as_bool(obj).map(Value::Bool).ok_or_else(mismatch),
            Shape::Int(width) => rt
                .as_int(obj)
                .map(|v| Value::Int(truncate_int(v, *width)))
                .ok_or_else(mismatch),
            Shape::Uint(width) => rt
                .as_int(obj)
                .map(|v| Value::Uint(truncate_uint(v, *width)))
                .ok_or_else(mismatch),
            Shape::Float(width) => rt
                .as_float(obj)
                .or_else(|| rt.as_int(obj).map(|v| v as f64))
                .map(|v| Value::Float(round_float(v, *width)))
                .ok_or_else(mismatch),
            Shape::Complex(width) => {
                let (re, im) = rt.as_complex(obj).ok_or_else(mismatch)?;
                Ok(match width {
                    ComplexWidth::W64 => Value::Complex(re as f32 as f64, im as f32 as f64),
                    ComplexWidth::W128 => Value::Complex(re, im),
                })
            }
            Shape::Str => rt
                .as_str(obj)
                .map(|s| Value::Str(s.to_string()))
                .ok_or_else(mismatch),
            Shape::Bytes => rt
                .as_bytes(obj)
                .map(|b| Value::Bytes(b.to_vec()))
                .ok_or_else(mismatch),
            Shape::List(element) => {
                let items = rt
                    .list_items(obj)
                    .or_else(|| rt.tuple_items(obj))
                    .ok_or_else(mismatch)?;
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.to_host(rt, *item, element)
                            .map_err(|e| ConvertError::Element {
                                index,
                                source: Box::new(e),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            Shape::Map(key_shape, value_shape) => {
                let entries = rt.dict_items(obj).ok_or_else(mismatch)?;
                let mut map = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let converted = self
                        .to_host(rt, key, key_shape)
                        .and_then(|k| Ok((k, self.to_host(rt, value, value_shape)?)));
                    match converted {
                        Ok(entry) => map.push(entry),
                        Err(e) => fatal!(
                            "failed to convert entry {}: {} of {shape}: {e}",
                            rt.repr(key),
                            rt.repr(value)
                        ),
                    }
                }
                Ok(Value::Map(map))
            }
            Shape::Record(record) => self.record_to_host(rt, obj, record),
            Shape::Ptr(target) => {
                if rt.is_none(obj) {
                    return Ok(Value::Ptr(None));
                }
                if let Some(record) = target.record() {
                    if let Some(place) = self.compatible_place(rt, obj, record) {
                        return Ok(Value::Ptr(Some(place)));
                    }
                }
                let value = self.to_host(rt, obj, target)?;
                Ok(Value::Ptr(Some(Pointer::new(value))))
            }
            Shape::Object => Ok(Value::Object(ObjectHandle::from_raw(obj))),
            Shape::KwArgs => {
                let entries = rt.dict_items(obj).ok_or_else(mismatch)?;
                let mut kwargs = KwArgs::default();
                for (key, value) in entries {
                    let name = rt
                        .as_str(key)
                        .ok_or_else(|| ConvertError::mismatch("str keyword", rt.type_name(key)))?;
                    kwargs.insert(name.to_string(), ObjectHandle::from_raw(value));
                }
                Ok(Value::KwArgs(kwargs))
            }
        }
    }

    fn record_to_host(
        &self,
        rt: &Runtime,
        obj: RawObject,
        record: &Rc<RecordShape>,
    ) -> Result<Value, ConvertError> {
        let record = &self.resolve_record(record);
        if let Some(place) = self.compatible_place(rt, obj, record) {
            return Ok(place.get());
        }
        if !rt.is_dict(obj) {
            return Err(ConvertError::mismatch(&record.name, rt.type_name(obj)));
        }

        let mut value = RecordValue::zero(record);
        for (index, field) in record.exported_fields() {
            let key = field.exposed_name();
            // Keys missing from the dict leave the field at its zero value.
            let (Some(item), Some(slot)) = (rt.dict_get_str(obj, &key), value.fields.get_mut(index)) else {
                continue;
            };
            match self.to_host(rt, item, &field.shape) {
                Ok(converted) => *slot = converted,
                Err(e) => fatal!(
                    "failed to convert field '{key}' ({}) of {}: {e}",
                    rt.repr(item),
                    record.name
                ),
            }
        }
        Ok(Value::Record(value))
    }

    /// Build a runtime object for `value`. Returns a new reference.
    pub fn from_host(&mut self, rt: &mut Runtime, value: &Value) -> RawObject {
        match value {
            Value::Bool(v) => rt.new_bool(*v),
            Value::Int(v) => rt.new_int(*v),
            Value::Uint(v) => rt.new_int(*v),
            Value::Float(v) => rt.new_float(*v),
            Value::Complex(re, im) => rt.new_complex(*re, *im),
            Value::Str(v) => rt.new_str(v.as_str()),
            Value::Bytes(v) => rt.new_bytes(v.as_slice()),
            Value::List(items) => {
                let objects: Vec<RawObject> = items.iter().map(|item| self.from_host(rt, item)).collect();
                let list = rt.new_list(&objects);
                for obj in objects {
                    rt.decref(obj);
                }
                list
            }
            Value::Map(entries) => {
                let dict = rt.new_dict();
                for (key, value) in entries {
                    let key = self.from_host(rt, key);
                    let value = self.from_host(rt, value);
                    rt.dict_insert(dict, key, value);
                    rt.decref(key);
                    rt.decref(value);
                }
                dict
            }
            Value::Record(record) => self.record_from_host(rt, record),
            Value::Ptr(None) => rt.none(),
            Value::Ptr(Some(pointer)) => {
                let target = pointer.get();
                self.from_host(rt, &target)
            }
            Value::Object(handle) => match handle.raw() {
                Some(obj) => {
                    rt.incref(obj);
                    obj
                }
                None => rt.none(),
            },
            Value::KwArgs(kwargs) => {
                let dict = rt.new_dict();
                for (name, handle) in kwargs.iter() {
                    let Some(obj) = handle.raw() else { continue };
                    let key = rt.new_str(name.as_str());
                    rt.dict_insert(dict, key, obj);
                    rt.decref(key);
                }
                dict
            }
        }
    }

    fn record_from_host(&mut self, rt: &mut Runtime, record: &RecordValue) -> RawObject {
        let shape = &self.resolve_record(&record.shape);
        let exported = shape
            .exported_fields()
            .filter_map(|(index, field)| Some((index, field, record.fields.get(index)?)));
        if let Some(&ty) = self.host_types.get(&shape.name) {
            trace!(type_name = %shape.name, "building instance from record");
            let storage = RecordValue::zero(shape);
            let place = Pointer::new(Value::Record(storage));
            for (index, _, value) in exported {
                place.field(index).set(value.clone());
            }
            return self.new_instance(rt, ty, place);
        }

        let dict = rt.new_dict();
        for (_, field, value) in exported {
            let key = rt.new_str(field.exposed_name());
            let value = self.from_host(rt, value);
            rt.dict_insert(dict, key, value);
            rt.decref(key);
            rt.decref(value);
        }
        dict
    }
}
