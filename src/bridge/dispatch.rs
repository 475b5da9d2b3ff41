//! Call dispatch: from a runtime call to a host callable and back.
//!
//! Every call runs the same sequence. Resolve the slot, check arity, bind
//! the receiver, convert positional arguments, collect keyword arguments,
//! invoke, then convert the results. Errors the caller can fix (arity,
//! argument kinds, a failing host body) are raised in the runtime; a broken
//! registration invariant is fatal.
//!
//! Argument conversion is not transactional. When argument `k` fails,
//! arguments before it have already been converted, and conversions that
//! alias instance storage stay in place, but the callable is never invoked.

use super::registry::{MethodSlot, Registry, SlotMetadata};
use crate::logging::{fatal, trace, warn};
use crate::runtime::{ExceptionKind, Raised, RawObject, Runtime, SlotId};
use crate::shape::{Receiver, Shape};
use crate::value::{KwArgs, Pointer, Value};

impl Registry {
    /// Method and function entry point.
    pub(crate) fn dispatch_call(
        &mut self,
        rt: &mut Runtime,
        owner: RawObject,
        args: RawObject,
        kwargs: Option<RawObject>,
        slot: SlotId,
    ) -> Result<RawObject, Raised> {
        let method = match self.slot(rt, owner, slot) {
            SlotMetadata::Method(method) => method,
            SlotMetadata::Field(field) => {
                fatal!("slot {slot} is field accessor '{}', not a method", field.name)
            }
        };
        let place = if method.receiver.is_some() {
            Some(self.place_of(rt, owner))
        } else {
            None
        };
        trace!(method = %method.name, slot = slot, "dispatching call");

        let results = self.invoke(rt, &method, place.as_ref(), args, kwargs)?;
        Ok(self.pack_results(rt, results))
    }

    /// Initializer entry point.
    ///
    /// Receiver-style initializers mutate the instance in place.
    /// Constructor-style initializers return a fresh record, which replaces
    /// the instance's zeroed storage.
    pub(crate) fn dispatch_init(
        &mut self,
        rt: &mut Runtime,
        obj: RawObject,
        args: RawObject,
        kwargs: Option<RawObject>,
    ) -> Result<(), Raised> {
        let (_, meta) = self.namespace_of(rt, obj);
        let Some(init) = meta.init.clone() else {
            fatal!("type {} has no initializer", meta.name);
        };
        let Some(record) = meta.shape.clone() else {
            fatal!("namespace {} cannot be instantiated", meta.name);
        };
        let place = self.place_of(rt, obj);
        trace!(type_name = %record.name, init = %init.name, "dispatching initializer");

        if init.receiver.is_some() {
            self.invoke(rt, &init, Some(&place), args, kwargs)?;
            return Ok(());
        }

        let mut results = self.invoke(rt, &init, None, args, kwargs)?;
        let built = match results.pop() {
            Some(Value::Ptr(Some(pointer))) => pointer.get(),
            Some(value) => value,
            None => fatal!("initializer {} returned no value", init.name),
        };
        let conforms = matches!(&built, Value::Record(value) if value.shape.name == record.name);
        if !conforms {
            fatal!(
                "initializer {} must return {}, got {}",
                init.name,
                record.name,
                built.kind_name()
            );
        }
        place.set(built);
        Ok(())
    }

    /// Convert arguments, call the host function, and check its result
    /// count. Any failure is raised in the runtime.
    fn invoke(
        &self,
        rt: &mut Runtime,
        method: &MethodSlot,
        place: Option<&Pointer>,
        args: RawObject,
        kwargs: Option<RawObject>,
    ) -> Result<Vec<Value>, Raised> {
        let argv = match rt.tuple_items(args) {
            Some(items) => items.to_vec(),
            None => fatal!("call arguments for {} are not a tuple", method.name),
        };
        if argv.len() != method.params.len() {
            return Err(rt.raise_type_error(format!(
                "method {} expects {} arguments, got {}",
                method.name,
                method.params.len(),
                argv.len()
            )));
        }
        let has_kwargs = kwargs.is_some_and(|dict| rt.dict_len(dict).unwrap_or(0) > 0);
        if has_kwargs && !method.keywords {
            return Err(rt.raise_type_error(format!(
                "{}() takes no keyword arguments",
                method.name
            )));
        }

        let mut host_args = Vec::with_capacity(argv.len() + 2);
        match (method.receiver, place) {
            (Some(Receiver::Pointer), Some(place)) => host_args.push(Value::Ptr(Some(place.clone()))),
            (Some(Receiver::Value), Some(place)) => host_args.push(place.get()),
            (Some(_), None) => fatal!("method {} needs a receiver", method.name),
            (None, _) => {}
        }

        for (index, (arg, shape)) in argv.iter().zip(&method.params).enumerate() {
            match self.to_host(rt, *arg, shape) {
                Ok(value) => host_args.push(value),
                Err(e) => {
                    warn!(method = %method.name, argument = index, error = %e, "argument conversion failed");
                    let repr = rt.repr(*arg);
                    return Err(rt.raise_type_error(format!(
                        "failed to convert argument {index} ({repr}) to {shape}: {e}"
                    )));
                }
            }
        }

        if method.keywords {
            let collected = match kwargs {
                Some(dict) => match self.to_host(rt, dict, &Shape::KwArgs) {
                    Ok(value) => value,
                    Err(e) => {
                        return Err(rt.raise_type_error(format!(
                            "invalid keyword arguments for {}: {e}",
                            method.name
                        )));
                    }
                },
                None => Value::KwArgs(KwArgs::default()),
            };
            host_args.push(collected);
        }

        let results = match method.function.invoke(host_args) {
            Ok(results) => results,
            Err(e) => {
                warn!(method = %method.name, error = %e, "host function failed");
                return Err(rt.raise(ExceptionKind::RuntimeError, format!("{e:#}")));
            }
        };
        if results.len() != method.function.results.len() {
            fatal!(
                "{} returned {} results, declared {}",
                method.name,
                results.len(),
                method.function.results.len()
            );
        }
        Ok(results)
    }

    /// No results become `None`, one result converts directly, several
    /// become a tuple in declared order.
    fn pack_results(&mut self, rt: &mut Runtime, results: Vec<Value>) -> RawObject {
        match results.as_slice() {
            [] => rt.none(),
            [single] => self.from_host(rt, single),
            many => {
                let items: Vec<RawObject> = many.iter().map(|value| self.from_host(rt, value)).collect();
                let tuple = rt.new_tuple(&items);
                for item in items {
                    rt.decref(item);
                }
                tuple
            }
        }
    }
}
