//! Common test utilities and fixtures.
//!
//! Record shapes, host functions and small helpers shared by the
//! integration tests.

#![allow(dead_code)]

use anyhow::anyhow;
use objbridge::prelude::*;

// =============================================================================
// Shapes
// =============================================================================

pub fn int() -> Shape {
    Shape::Int(IntWidth::W64)
}

/// `Pair { A int, B string, hidden int }`; only `A` and `B` are exported.
pub fn pair_shape() -> Shape {
    RecordShape::new("test.Pair")
        .field("A", int())
        .field("B", Shape::Str)
        .field("hidden", int())
        .build()
}

/// `Inner { Value int }`
pub fn inner_shape() -> Shape {
    RecordShape::new("test.Inner").field("Value", int()).build()
}

/// `Outer { Inner Inner, Link *Inner, Label string }`
pub fn outer_shape() -> Shape {
    RecordShape::new("test.Outer")
        .field("Inner", inner_shape())
        .field("Link", Shape::ptr(inner_shape()))
        .field("Label", Shape::Str)
        .build()
}

/// `Node { Value int, Next *Node }`; `Next` names the record through a
/// fieldless placeholder.
pub fn node_shape() -> Shape {
    RecordShape::new("test.Node")
        .field("Value", int())
        .field("Next", Shape::ptr(RecordShape::new("test.Node").build()))
        .build()
}

/// `Counter { Count int, Label string }` with pointer and value receiver
/// methods.
pub fn counter_shape() -> Shape {
    let bump = HostFn::method("Bump", Receiver::Pointer, vec![int()], vec![], |args| {
        let counter = args[0].as_ptr()?;
        let count = counter.get_field("Count")?.as_i64()?;
        counter.set_field("Count", Value::Int(count + args[1].as_i64()?))?;
        Ok(vec![])
    });
    let peek = HostFn::method("Peek", Receiver::Value, vec![], vec![int()], |args| {
        let count = args[0].as_record()?.get("Count").cloned();
        count.map(|c| vec![c]).ok_or_else(|| anyhow!("missing Count"))
    });
    let reset_copy = HostFn::method("ResetCopy", Receiver::Value, vec![], vec![], |args| {
        let mut copy = args[0].as_record()?.clone();
        if let Some(count) = copy.get_mut("Count") {
            *count = Value::Int(0);
        }
        Ok(vec![])
    });
    let split = HostFn::method(
        "Split",
        Receiver::Pointer,
        vec![],
        vec![int(), Shape::Str],
        |args| {
            let counter = args[0].as_ptr()?;
            Ok(vec![counter.get_field("Count")?, counter.get_field("Label")?])
        },
    );

    RecordShape::new("test.Counter")
        .field("Count", int())
        .field("Label", Shape::Str)
        .method(bump)
        .method(peek)
        .method(reset_copy)
        .method(split)
        .build()
}

// =============================================================================
// Functions
// =============================================================================

/// `Add(a, b int) int`
pub fn add_fn() -> HostFn {
    HostFn::new("Add", vec![int(), int()], vec![int()], |args| {
        Ok(vec![Value::Int(args[0].as_i64()? + args[1].as_i64()?)])
    })
}

/// `CountKwargs(a int, kwargs) int`: the number of keyword arguments.
pub fn count_kwargs_fn() -> HostFn {
    HostFn::new("CountKwargs", vec![int(), Shape::KwArgs], vec![int()], |args| {
        let kwargs = args[1].as_kwargs()?;
        Ok(vec![Value::Int(kwargs.len() as i64)])
    })
}

/// `Fail()`: always returns an error.
pub fn failing_fn() -> HostFn {
    HostFn::new("Fail", vec![], vec![], |_| Err(anyhow!("disk on fire")))
}

// =============================================================================
// Helpers
// =============================================================================

pub fn int_obj(bridge: &mut Bridge, value: i64) -> ObjectHandle {
    bridge.from_host(&Value::Int(value))
}

pub fn str_obj(bridge: &mut Bridge, value: &str) -> ObjectHandle {
    bridge.from_host(&Value::Str(value.to_string()))
}

/// Read an integer attribute and release the intermediate object.
pub fn get_int(bridge: &mut Bridge, obj: ObjectHandle, name: &str) -> anyhow::Result<i64> {
    let attr = bridge.get_attr(obj, name)?;
    let value = bridge.to_host(attr, &int())?;
    bridge.release(attr);
    Ok(value.as_i64()?)
}

/// Read a string attribute and release the intermediate object.
pub fn get_str(bridge: &mut Bridge, obj: ObjectHandle, name: &str) -> anyhow::Result<String> {
    let attr = bridge.get_attr(obj, name)?;
    let value = bridge.to_host(attr, &Shape::Str)?;
    bridge.release(attr);
    Ok(value.as_str()?.to_string())
}

/// Assign an integer attribute.
pub fn set_int(bridge: &mut Bridge, obj: ObjectHandle, name: &str, value: i64) -> anyhow::Result<()> {
    let value = int_obj(bridge, value);
    let result = bridge.set_attr(obj, name, value);
    bridge.release(value);
    Ok(result?)
}

/// Register `shape` in the main module under `name`.
pub fn register(bridge: &mut Bridge, shape: &Shape, name: &str) -> anyhow::Result<ObjectHandle> {
    let main = bridge.main_module();
    Ok(bridge.register_type(main, shape, None, name, "")?)
}

/// The runtime exception behind a failed bridge call.
pub fn runtime_error(result: objbridge::Result<ObjectHandle>) -> RuntimeError {
    match result {
        Err(Error::Runtime(e)) => e,
        Err(other) => panic!("expected a runtime exception, got {other}"),
        Ok(obj) => panic!("expected a runtime exception, got object {obj}"),
    }
}

pub use objbridge::RuntimeError;
