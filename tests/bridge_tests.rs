//! Integration tests for type registration, field access and call dispatch,
//! driven from the runtime side through the public bridge API.

mod common;

use common::*;
use objbridge::prelude::*;
use objbridge::{ExceptionKind, RegistrationError};

// =============================================================================
// Registration
// =============================================================================

#[test]
fn test_register_type_is_idempotent() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let first = register(&mut bridge, &pair_shape(), "Pair")?;
    let second = register(&mut bridge, &pair_shape(), "Pair")?;
    assert!(first.is(second));
    assert!(bridge.registered_type("test.Pair").is_some_and(|ty| ty.is(first)));
    assert_eq!(bridge.repr(first)?, "<class '__main__.Pair'>");
    Ok(())
}

#[test]
fn test_pointer_to_record_registers_the_record() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &Shape::ptr(pair_shape()), "Pair")?;
    assert!(bridge.registered_type("test.Pair").is_some_and(|t| t.is(ty)));
    Ok(())
}

#[test]
fn test_non_record_shape_is_rejected() {
    let mut bridge = Bridge::new();
    let main = bridge.main_module();
    let err = bridge
        .register_type(main, &Shape::list(int()), None, "Numbers", "")
        .unwrap_err();
    assert!(err.is_registration());
    assert!(matches!(
        err,
        Error::Registration(RegistrationError::NotARecord { .. })
    ));
}

#[test]
fn test_nested_records_are_registered() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    register(&mut bridge, &outer_shape(), "Outer")?;
    let inner = bridge
        .registered_type("test.Inner")
        .ok_or_else(|| anyhow::anyhow!("Inner not registered"))?;
    let main = bridge.main_module();
    let by_name = bridge.get_attr(main, "Inner")?;
    assert!(by_name.is(inner));
    bridge.release(by_name);
    Ok(())
}

#[test]
fn test_failed_registration_installs_nothing() {
    let bad = HostFn::new("Bad", vec![], vec![], |_| Ok(vec![]));
    let shape = RecordShape::new("test.Broken")
        .field("Inner", inner_shape())
        .method(bad)
        .build();

    let mut bridge = Bridge::new();
    let main = bridge.main_module();
    let err = bridge.register_type(main, &shape, None, "Broken", "").unwrap_err();
    assert!(matches!(
        err,
        Error::Registration(RegistrationError::InvalidMethod { .. })
    ));
    assert!(bridge.registered_type("test.Broken").is_none());
    assert!(bridge.registered_type("test.Inner").is_none());
}

#[test]
fn test_fields_holding_objects_are_rejected() {
    let boxed = RecordShape::new("test.Boxed").field("Item", Shape::Object).build();
    let nested = RecordShape::new("test.Bag")
        .field("Label", Shape::Str)
        .field("Items", Shape::list(boxed.clone()))
        .build();

    let mut bridge = Bridge::new();
    let main = bridge.main_module();
    for (shape, name) in [(&boxed, "Boxed"), (&nested, "Bag")] {
        let err = bridge.register_type(main, shape, None, name, "").unwrap_err();
        assert!(matches!(
            err,
            Error::Registration(RegistrationError::UnsupportedField { .. })
        ));
    }
    assert!(bridge.registered_type("test.Boxed").is_none());
    assert!(bridge.registered_type("test.Bag").is_none());
}

// =============================================================================
// Field access
// =============================================================================

#[test]
fn test_fields_round_trip() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &pair_shape(), "Pair")?;
    let pair = bridge.call(ty, &[], &[])?;

    set_int(&mut bridge, pair, "a", 7)?;
    let x = str_obj(&mut bridge, "x");
    bridge.set_attr(pair, "b", x)?;
    bridge.release(x);

    assert_eq!(get_int(&mut bridge, pair, "a")?, 7);
    assert_eq!(get_str(&mut bridge, pair, "b")?, "x");

    let Value::Record(record) = bridge.to_host(pair, &pair_shape())? else {
        panic!("expected a record");
    };
    assert_eq!(record.get("A"), Some(&Value::Int(7)));
    assert_eq!(record.get("B"), Some(&Value::Str("x".to_string())));
    bridge.release(pair);
    Ok(())
}

#[test]
fn test_unexported_fields_are_hidden() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &pair_shape(), "Pair")?;
    let pair = bridge.call(ty, &[], &[])?;

    assert_eq!(bridge.attributes(pair)?, vec!["a", "b"]);
    let err = runtime_error(bridge.get_attr(pair, "hidden"));
    assert_eq!(err.kind, ExceptionKind::AttributeError);
    assert_eq!(err.message, "'__main__.Pair' object has no attribute 'hidden'");
    bridge.release(pair);
    Ok(())
}

#[test]
fn test_setter_rejects_wrong_kind() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &pair_shape(), "Pair")?;
    let pair = bridge.call(ty, &[], &[])?;
    set_int(&mut bridge, pair, "a", 1)?;

    let text = str_obj(&mut bridge, "seven");
    let err = bridge.set_attr(pair, "a", text).unwrap_err();
    match err {
        Error::Runtime(e) => {
            assert!(e.is_type_error());
            assert_eq!(e.message, "failed to convert value to i64: expected i64, got str");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(get_int(&mut bridge, pair, "a")?, 1);
    bridge.release(text);
    bridge.release(pair);
    Ok(())
}

#[test]
fn test_nested_view_aliases_parent() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &outer_shape(), "Outer")?;
    let outer = bridge.call(ty, &[], &[])?;

    let inner = bridge.get_attr(outer, "inner")?;
    set_int(&mut bridge, inner, "value", 5)?;

    let again = bridge.get_attr(outer, "inner")?;
    assert_eq!(get_int(&mut bridge, again, "value")?, 5);

    let Value::Record(record) = bridge.to_host(outer, &outer_shape())? else {
        panic!("expected a record");
    };
    let Some(Value::Record(nested)) = record.get("Inner") else {
        panic!("expected a nested record");
    };
    assert_eq!(nested.get("Value"), Some(&Value::Int(5)));

    for obj in [again, inner, outer] {
        bridge.release(obj);
    }
    assert_eq!(bridge.holder_count(), 0);
    Ok(())
}

#[test]
fn test_view_outlives_parent() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &outer_shape(), "Outer")?;
    let outer = bridge.call(ty, &[], &[])?;
    let inner = bridge.get_attr(outer, "inner")?;
    bridge.release(outer);

    set_int(&mut bridge, inner, "value", 3)?;
    assert_eq!(get_int(&mut bridge, inner, "value")?, 3);
    bridge.release(inner);
    Ok(())
}

#[test]
fn test_record_pointer_field() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let outer_ty = register(&mut bridge, &outer_shape(), "Outer")?;
    let outer = bridge.call(outer_ty, &[], &[])?;

    // Starts out null.
    let link = bridge.get_attr(outer, "link")?;
    assert!(bridge.runtime().is_none(link.raw().unwrap()));

    // A dict populates a fresh pointee.
    let dict = bridge.from_host(&Value::Map(vec![(
        Value::Str("value".to_string()),
        Value::Int(9),
    )]));
    bridge.set_attr(outer, "link", dict)?;
    bridge.release(dict);
    let link = bridge.get_attr(outer, "link")?;
    assert_eq!(get_int(&mut bridge, link, "value")?, 9);
    bridge.release(link);

    // An instance is stored by reference.
    let inner_ty = bridge
        .registered_type("test.Inner")
        .ok_or_else(|| anyhow::anyhow!("Inner not registered"))?;
    let inner = bridge.call(inner_ty, &[], &[])?;
    bridge.set_attr(outer, "link", inner)?;
    set_int(&mut bridge, inner, "value", 11)?;
    let link = bridge.get_attr(outer, "link")?;
    assert_eq!(get_int(&mut bridge, link, "value")?, 11);
    bridge.release(link);

    // None clears it.
    let none = bridge.from_host(&Value::Ptr(None));
    bridge.set_attr(outer, "link", none)?;
    let link = bridge.get_attr(outer, "link")?;
    assert!(bridge.runtime().is_none(link.raw().unwrap()));

    // Anything else is a type error.
    let number = int_obj(&mut bridge, 1);
    let err = bridge.set_attr(outer, "link", number).unwrap_err();
    assert!(matches!(err, Error::Runtime(e) if e.message == "invalid value of type int for record pointer field"));

    for obj in [number, inner, outer] {
        bridge.release(obj);
    }
    Ok(())
}

#[test]
fn test_self_referential_record() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &node_shape(), "Node")?;
    let head = bridge.call(ty, &[], &[])?;
    let tail = bridge.call(ty, &[], &[])?;

    set_int(&mut bridge, tail, "value", 3)?;
    bridge.set_attr(head, "next", tail)?;
    let next = bridge.get_attr(head, "next")?;
    assert!(bridge.type_of(next)?.is(ty));
    assert_eq!(get_int(&mut bridge, next, "value")?, 3);
    set_int(&mut bridge, next, "value", 4)?;
    assert_eq!(get_int(&mut bridge, tail, "value")?, 4);
    bridge.release(next);

    // A dict builds a full node behind the placeholder.
    let dict = bridge.from_host(&Value::Map(vec![(
        Value::Str("value".to_string()),
        Value::Int(9),
    )]));
    bridge.set_attr(tail, "next", dict)?;
    bridge.release(dict);
    let last = bridge.get_attr(tail, "next")?;
    assert_eq!(get_int(&mut bridge, last, "value")?, 9);
    let end = bridge.get_attr(last, "next")?;
    assert!(bridge.runtime().is_none(end.raw().unwrap()));

    let host = bridge.to_host(head, &node_shape())?;
    let link = host.as_record()?.get("Next").cloned().unwrap_or(Value::Ptr(None));
    assert_eq!(link.as_ptr()?.get_field("Value")?, Value::Int(4));

    for obj in [last, tail, head] {
        bridge.release(obj);
    }
    Ok(())
}

#[test]
fn test_record_field_copies_instance() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let outer_ty = register(&mut bridge, &outer_shape(), "Outer")?;
    let inner_ty = bridge
        .registered_type("test.Inner")
        .ok_or_else(|| anyhow::anyhow!("Inner not registered"))?;
    let outer = bridge.call(outer_ty, &[], &[])?;
    let inner = bridge.call(inner_ty, &[], &[])?;

    set_int(&mut bridge, inner, "value", 4)?;
    bridge.set_attr(outer, "inner", inner)?;
    set_int(&mut bridge, inner, "value", 40)?;

    let view = bridge.get_attr(outer, "inner")?;
    assert_eq!(get_int(&mut bridge, view, "value")?, 4);
    for obj in [view, inner, outer] {
        bridge.release(obj);
    }
    Ok(())
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_add_function() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let add = bridge.function_of(add_fn())?;
    assert_eq!(add.name(), "add");
    assert_eq!(add.doc(), Some("add(arg0, arg1, /)\n--\n\n"));

    let (three, four) = (int_obj(&mut bridge, 3), int_obj(&mut bridge, 4));
    let sum = bridge.call(add.handle(), &[three, four], &[])?;
    assert_eq!(bridge.to_host(sum, &int())?, Value::Int(7));

    let err = runtime_error(bridge.call(add.handle(), &[three], &[]));
    assert!(err.is_type_error());
    assert_eq!(err.message, "method add expects 2 arguments, got 1");
    assert!(bridge.take_error().is_none());

    let err = runtime_error(bridge.call(add.handle(), &[three, four], &[("c", four)]));
    assert_eq!(err.message, "add() takes no keyword arguments");

    for obj in [sum, three, four] {
        bridge.release(obj);
    }
    Ok(())
}

#[test]
fn test_argument_conversion_error_names_argument() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let add = bridge.function_of(add_fn())?;
    let one = int_obj(&mut bridge, 1);
    let text = str_obj(&mut bridge, "two");

    let err = runtime_error(bridge.call(add.handle(), &[one, text], &[]));
    assert!(err.is_type_error());
    assert!(err.message.starts_with("failed to convert argument 1 ('two') to i64"));
    Ok(())
}

#[test]
fn test_keyword_arguments_default_to_empty() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let count = bridge.function_of(count_kwargs_fn())?;
    assert_eq!(count.doc(), Some("count_kwargs(arg0, /, **kwargs)\n--\n\n"));
    let one = int_obj(&mut bridge, 1);

    let none_given = bridge.call(count.handle(), &[one], &[])?;
    assert_eq!(bridge.to_host(none_given, &int())?, Value::Int(0));

    let two_given = bridge.call(count.handle(), &[one], &[("x", one), ("y", one)])?;
    assert_eq!(bridge.to_host(two_given, &int())?, Value::Int(2));
    Ok(())
}

#[test]
fn test_host_failure_raises_runtime_error() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let fail = bridge.create_function("explode", failing_fn(), "Always fails.")?;
    assert_eq!(fail.name(), "explode");
    assert_eq!(fail.doc(), Some("explode()\n--\n\nAlways fails."));

    let err = runtime_error(bridge.call(fail.handle(), &[], &[]));
    assert_eq!(err.kind, ExceptionKind::RuntimeError);
    assert_eq!(err.message, "disk on fire");
    Ok(())
}

#[test]
fn test_functions_in_other_modules() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let math = bridge.create_module("math");
    let add = bridge.register_function(math, "plus", add_fn(), "")?;
    let found = bridge.get_attr(math, "plus")?;
    assert!(found.is(add.handle()));
    bridge.release(found);

    let main = bridge.main_module();
    assert!(bridge.get_attr(main, "plus").is_err());
    Ok(())
}

#[test]
fn test_duplicate_function_name() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    bridge.function_of(add_fn())?;
    let err = bridge.function_of(add_fn()).unwrap_err();
    assert!(matches!(
        err,
        Error::Registration(RegistrationError::DuplicateName { .. })
    ));
    Ok(())
}

#[test]
fn test_anonymous_functions_are_numbered() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let first = bridge.function_of(HostFn::new("", vec![], vec![], |_| Ok(vec![])))?;
    let second = bridge.function_of(HostFn::new("", vec![], vec![], |_| Ok(vec![])))?;
    assert_eq!(first.name(), "anonymous_func_0");
    assert_eq!(second.name(), "anonymous_func_1");
    Ok(())
}

// =============================================================================
// Methods
// =============================================================================

#[test]
fn test_pointer_and_value_receivers() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &counter_shape(), "Counter")?;
    let counter = bridge.call(ty, &[], &[])?;

    let three = int_obj(&mut bridge, 3);
    let result = bridge.call_method(counter, "bump", &[three], &[])?;
    assert!(bridge.runtime().is_none(result.raw().unwrap()));
    assert_eq!(get_int(&mut bridge, counter, "count")?, 3);

    bridge.call_method(counter, "reset_copy", &[], &[])?;
    assert_eq!(get_int(&mut bridge, counter, "count")?, 3);

    let peeked = bridge.call_method(counter, "peek", &[], &[])?;
    assert_eq!(bridge.to_host(peeked, &int())?, Value::Int(3));

    for obj in [peeked, three, counter] {
        bridge.release(obj);
    }
    Ok(())
}

#[test]
fn test_multiple_results_become_tuple() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &counter_shape(), "Counter")?;
    let counter = bridge.call(ty, &[], &[])?;
    set_int(&mut bridge, counter, "count", 2)?;
    let label = str_obj(&mut bridge, "hits");
    bridge.set_attr(counter, "label", label)?;

    let split = bridge.call_method(counter, "split", &[], &[])?;
    assert_eq!(bridge.repr(split)?, "(2, 'hits')");
    for obj in [split, label, counter] {
        bridge.release(obj);
    }
    Ok(())
}

#[test]
fn test_unbound_method_needs_instance() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &counter_shape(), "Counter")?;
    let counter = bridge.call(ty, &[], &[])?;

    let peek = bridge.get_attr(ty, "peek")?;
    set_int(&mut bridge, counter, "count", 8)?;
    let peeked = bridge.call(peek, &[counter], &[])?;
    assert_eq!(bridge.to_host(peeked, &int())?, Value::Int(8));

    let err = runtime_error(bridge.call(peek, &[], &[]));
    assert_eq!(err.message, "descriptor 'peek' requires a '__main__.Counter' object");
    Ok(())
}

#[test]
fn test_function_in_type_namespace_binds_receiver() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let shape = counter_shape();
    let ty = register(&mut bridge, &shape, "Counter")?;

    let double = HostFn::new("Double", vec![Shape::ptr(shape.clone())], vec![], |args| {
        let counter = args[0].as_ptr()?;
        let count = counter.get_field("Count")?.as_i64()?;
        counter.set_field("Count", Value::Int(count * 2))?;
        Ok(vec![])
    });
    let registered = bridge.register_function(ty, "", double, "")?;
    assert_eq!(registered.doc(), Some("double()\n--\n\n"));

    let counter = bridge.call(ty, &[], &[])?;
    set_int(&mut bridge, counter, "count", 21)?;
    bridge.call_method(counter, "double", &[], &[])?;
    assert_eq!(get_int(&mut bridge, counter, "count")?, 42);
    bridge.release(counter);
    Ok(())
}

// =============================================================================
// Initializers
// =============================================================================

#[test]
fn test_constructor_initializer() -> anyhow::Result<()> {
    let shape = pair_shape();
    let record = shape.record().cloned().unwrap();
    let new_pair = HostFn::new("NewPair", vec![int(), Shape::Str], vec![shape.clone()], move |args| {
        let value = RecordValue::zero(&record)
            .with("A", args[0].clone())
            .with("B", args[1].clone());
        Ok(vec![Value::Record(value)])
    });

    let mut bridge = Bridge::new();
    let main = bridge.main_module();
    let ty = bridge.register_type(main, &shape, Some(new_pair), "Pair", "")?;

    let (one, y) = (int_obj(&mut bridge, 1), str_obj(&mut bridge, "y"));
    let pair = bridge.call(ty, &[one, y], &[])?;
    assert_eq!(get_int(&mut bridge, pair, "a")?, 1);
    assert_eq!(get_str(&mut bridge, pair, "b")?, "y");

    let err = runtime_error(bridge.call(ty, &[one], &[]));
    assert_eq!(err.message, "method NewPair expects 2 arguments, got 1");
    assert_eq!(bridge.holder_count(), 1);
    Ok(())
}

#[test]
fn test_receiver_initializer() -> anyhow::Result<()> {
    let shape = pair_shape();
    let init = HostFn::new("Init", vec![Shape::ptr(shape.clone()), int()], vec![], |args| {
        args[0].as_ptr()?.set_field("A", args[1].clone())?;
        Ok(vec![])
    });

    let mut bridge = Bridge::new();
    let main = bridge.main_module();
    let ty = bridge.register_type(main, &shape, Some(init), "Pair", "")?;
    let five = int_obj(&mut bridge, 5);
    let pair = bridge.call(ty, &[five], &[])?;
    assert_eq!(get_int(&mut bridge, pair, "a")?, 5);
    Ok(())
}

#[test]
fn test_initializer_must_build_the_record() {
    let shape = pair_shape();
    let wrong = HostFn::new("Wrong", vec![], vec![int()], |_| Ok(vec![Value::Int(0)]));
    let mut bridge = Bridge::new();
    let main = bridge.main_module();
    let err = bridge.register_type(main, &shape, Some(wrong), "Pair", "").unwrap_err();
    assert!(matches!(
        err,
        Error::Registration(RegistrationError::InvalidInit { .. })
    ));
}

#[test]
fn test_types_without_initializer_reject_arguments() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &pair_shape(), "Pair")?;
    let one = int_obj(&mut bridge, 1);
    let err = runtime_error(bridge.call(ty, &[one], &[]));
    assert_eq!(err.message, "__main__.Pair() takes no arguments");
    assert_eq!(bridge.holder_count(), 0);
    Ok(())
}

// =============================================================================
// Marshaling through the bridge
// =============================================================================

#[test]
fn test_registered_record_becomes_instance() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &pair_shape(), "Pair")?;
    let record = pair_shape().record().cloned().unwrap();
    let value = RecordValue::zero(&record)
        .with("A", Value::Int(3))
        .with("B", Value::Str("z".to_string()));

    let obj = bridge.from_host(&Value::Record(value));
    let obj_type = bridge.type_of(obj)?;
    assert!(obj_type.is(ty));
    assert_eq!(get_int(&mut bridge, obj, "a")?, 3);
    assert_eq!(get_str(&mut bridge, obj, "b")?, "z");
    bridge.release(obj);
    Ok(())
}

#[test]
fn test_unregistered_record_becomes_dict() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let record = pair_shape().record().cloned().unwrap();
    let value = RecordValue::zero(&record).with("A", Value::Int(3));

    let obj = bridge.from_host(&Value::Record(value));
    assert_eq!(bridge.repr(obj)?, "{'a': 3, 'b': ''}");

    // A dict converts back field by field.
    let Value::Record(back) = bridge.to_host(obj, &pair_shape())? else {
        panic!("expected a record");
    };
    assert_eq!(back.get("A"), Some(&Value::Int(3)));
    bridge.release(obj);
    Ok(())
}

#[test]
fn test_instance_converts_to_pointer_alias() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &pair_shape(), "Pair")?;
    let pair = bridge.call(ty, &[], &[])?;

    let pointer = bridge.to_host(pair, &Shape::ptr(pair_shape()))?;
    pointer.as_ptr()?.set_field("A", Value::Int(12))?;
    assert_eq!(get_int(&mut bridge, pair, "a")?, 12);
    bridge.release(pair);
    Ok(())
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_dealloc_unpins_exactly_one_holder() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &pair_shape(), "Pair")?;
    let a = bridge.call(ty, &[], &[])?;
    let b = bridge.call(ty, &[], &[])?;
    assert_eq!(bridge.holder_count(), 2);

    bridge.retain(a);
    bridge.release(a);
    assert_eq!(bridge.holder_count(), 2);

    bridge.release(a);
    assert_eq!(bridge.holder_count(), 1);
    bridge.release(b);
    assert_eq!(bridge.holder_count(), 0);
    Ok(())
}

#[test]
fn test_shutdown_clears_registry() -> anyhow::Result<()> {
    let mut bridge = Bridge::new();
    let ty = register(&mut bridge, &pair_shape(), "Pair")?;
    let _live = bridge.call(ty, &[], &[])?;
    assert_eq!(bridge.holder_count(), 1);
    bridge.shutdown();
    Ok(())
}
