//! Primitive objects: constructors, accessors and container operations.
//!
//! These are the thin wrappers the bridge reaches for when converting
//! values. Each forwards one operation to the heap and keeps the usual
//! ownership rules: constructors return new references, stores take a
//! reference to the stored item, lookups are borrowed.

use super::{ExceptionKind, ObjectKind, Raised, RawObject, Runtime};
use crate::logging::fatal;

impl Runtime {
    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn none(&self) -> RawObject {
        self.none
    }

    pub fn new_bool(&self, value: bool) -> RawObject {
        if value { self.true_ } else { self.false_ }
    }

    pub fn new_int(&mut self, value: impl Into<i128>) -> RawObject {
        self.alloc_object(self.builtins.int, ObjectKind::Int(value.into()))
    }

    pub fn new_float(&mut self, value: f64) -> RawObject {
        self.alloc_object(self.builtins.float, ObjectKind::Float(value))
    }

    pub fn new_complex(&mut self, re: f64, im: f64) -> RawObject {
        self.alloc_object(self.builtins.complex, ObjectKind::Complex(re, im))
    }

    pub fn new_str(&mut self, value: impl Into<String>) -> RawObject {
        self.alloc_object(self.builtins.str_, ObjectKind::Str(value.into()))
    }

    pub fn new_bytes(&mut self, value: impl Into<Vec<u8>>) -> RawObject {
        self.alloc_object(self.builtins.bytes, ObjectKind::Bytes(value.into()))
    }

    /// New list holding a reference to each item.
    pub fn new_list(&mut self, items: &[RawObject]) -> RawObject {
        for item in items {
            self.incref(*item);
        }
        self.alloc_object(self.builtins.list, ObjectKind::List(items.to_vec()))
    }

    /// New tuple holding a reference to each item.
    pub fn new_tuple(&mut self, items: &[RawObject]) -> RawObject {
        for item in items {
            self.incref(*item);
        }
        self.alloc_object(self.builtins.tuple, ObjectKind::Tuple(items.to_vec()))
    }

    pub fn new_dict(&mut self) -> RawObject {
        self.alloc_object(self.builtins.dict, ObjectKind::Dict(Vec::new()))
    }

    // ========================================================================
    // Predicates and scalar accessors
    // ========================================================================

    pub fn is_none(&self, obj: RawObject) -> bool {
        obj == self.none
    }

    pub fn is_str(&self, obj: RawObject) -> bool {
        matches!(self.kind(obj), ObjectKind::Str(_))
    }

    pub fn is_list(&self, obj: RawObject) -> bool {
        matches!(self.kind(obj), ObjectKind::List(_))
    }

    pub fn is_tuple(&self, obj: RawObject) -> bool {
        matches!(self.kind(obj), ObjectKind::Tuple(_))
    }

    pub fn is_dict(&self, obj: RawObject) -> bool {
        matches!(self.kind(obj), ObjectKind::Dict(_))
    }

    /// Exact `bool` objects only.
    pub fn as_bool(&self, obj: RawObject) -> Option<bool> {
        match self.kind(obj) {
            ObjectKind::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Exact `int` objects only; booleans are not integers here.
    pub fn as_int(&self, obj: RawObject) -> Option<i128> {
        match self.kind(obj) {
            ObjectKind::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self, obj: RawObject) -> Option<f64> {
        match self.kind(obj) {
            ObjectKind::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_complex(&self, obj: RawObject) -> Option<(f64, f64)> {
        match self.kind(obj) {
            ObjectKind::Complex(re, im) => Some((*re, *im)),
            _ => None,
        }
    }

    pub fn as_str(&self, obj: RawObject) -> Option<&str> {
        match self.kind(obj) {
            ObjectKind::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self, obj: RawObject) -> Option<&[u8]> {
        match self.kind(obj) {
            ObjectKind::Bytes(value) => Some(value),
            _ => None,
        }
    }

    // ========================================================================
    // Sequences
    // ========================================================================

    /// Items of a list (borrowed).
    pub fn list_items(&self, list: RawObject) -> Option<&[RawObject]> {
        match self.kind(list) {
            ObjectKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Items of a tuple (borrowed).
    pub fn tuple_items(&self, tuple: RawObject) -> Option<&[RawObject]> {
        match self.kind(tuple) {
            ObjectKind::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn list_len(&self, list: RawObject) -> Option<usize> {
        self.list_items(list).map(<[RawObject]>::len)
    }

    /// Borrowed item at `index`.
    pub fn list_get(&self, list: RawObject, index: usize) -> Option<RawObject> {
        self.list_items(list)?.get(index).copied()
    }

    pub fn list_set(&mut self, list: RawObject, index: usize, item: RawObject) -> Result<(), Raised> {
        match self.list_len(list) {
            Some(len) if index < len => {}
            Some(_) => {
                return Err(self.raise(ExceptionKind::IndexError, "list assignment index out of range"));
            }
            None => {
                let type_name = self.type_name(list);
                return Err(self.raise_type_error(format!(
                    "'{type_name}' object does not support item assignment"
                )));
            }
        }
        self.incref(item);
        let previous = match &mut self.entry_mut(list).kind {
            ObjectKind::List(items) => match items.get_mut(index) {
                Some(slot) => std::mem::replace(slot, item),
                None => fatal!("list {list} shrank during assignment"),
            },
            _ => fatal!("list {list} changed kind"),
        };
        self.decref(previous);
        Ok(())
    }

    pub fn list_append(&mut self, list: RawObject, item: RawObject) -> Result<(), Raised> {
        if !self.is_list(list) {
            let type_name = self.type_name(list);
            return Err(self.raise(
                ExceptionKind::AttributeError,
                format!("'{type_name}' object has no attribute 'append'"),
            ));
        }
        self.incref(item);
        if let ObjectKind::List(items) = &mut self.entry_mut(list).kind {
            items.push(item);
        }
        Ok(())
    }

    // ========================================================================
    // Dicts
    // ========================================================================

    fn dict_position(&self, dict: RawObject, key: RawObject) -> Option<usize> {
        match self.kind(dict) {
            ObjectKind::Dict(entries) => entries.iter().position(|(k, _)| self.objects_equal(*k, key)),
            _ => None,
        }
    }

    /// Store `value` under `key`, replacing an equal key.
    pub fn dict_set(&mut self, dict: RawObject, key: RawObject, value: RawObject) -> Result<(), Raised> {
        if !self.is_dict(dict) {
            let type_name = self.type_name(dict);
            return Err(self.raise_type_error(format!(
                "'{type_name}' object does not support item assignment"
            )));
        }
        self.dict_insert(dict, key, value);
        Ok(())
    }

    pub(crate) fn dict_insert(&mut self, dict: RawObject, key: RawObject, value: RawObject) {
        let position = self.dict_position(dict, key);
        self.incref(value);
        let previous = match &mut self.entry_mut(dict).kind {
            ObjectKind::Dict(entries) => match position {
                Some(i) => entries.get_mut(i).map(|entry| std::mem::replace(&mut entry.1, value)),
                None => {
                    entries.push((key, value));
                    None
                }
            },
            _ => fatal!("dict_insert on non-dict {dict}"),
        };
        match previous {
            Some(previous) => self.decref(previous),
            None => self.incref(key),
        }
    }

    /// Borrowed value stored under `key`.
    pub fn dict_get(&self, dict: RawObject, key: RawObject) -> Option<RawObject> {
        let position = self.dict_position(dict, key)?;
        match self.kind(dict) {
            ObjectKind::Dict(entries) => entries.get(position).map(|(_, v)| *v),
            _ => None,
        }
    }

    /// Borrowed value stored under the string key `key`.
    pub fn dict_get_str(&self, dict: RawObject, key: &str) -> Option<RawObject> {
        match self.kind(dict) {
            ObjectKind::Dict(entries) => entries
                .iter()
                .find(|(k, _)| self.as_str(*k) == Some(key))
                .map(|(_, v)| *v),
            _ => None,
        }
    }

    /// Borrowed key/value pairs in insertion order.
    pub fn dict_items(&self, dict: RawObject) -> Option<Vec<(RawObject, RawObject)>> {
        match self.kind(dict) {
            ObjectKind::Dict(entries) => Some(entries.clone()),
            _ => None,
        }
    }

    pub fn dict_len(&self, dict: RawObject) -> Option<usize> {
        match self.kind(dict) {
            ObjectKind::Dict(entries) => Some(entries.len()),
            _ => None,
        }
    }

    // ========================================================================
    // Equality and text
    // ========================================================================

    /// Value equality as used for dict keys; identity for everything else.
    pub fn objects_equal(&self, a: RawObject, b: RawObject) -> bool {
        if a == b {
            return true;
        }
        match (self.kind(a), self.kind(b)) {
            (ObjectKind::Int(x), ObjectKind::Int(y)) => x == y,
            (ObjectKind::Float(x), ObjectKind::Float(y)) => x == y,
            (ObjectKind::Int(x), ObjectKind::Float(y)) | (ObjectKind::Float(y), ObjectKind::Int(x)) => {
                *x as f64 == *y
            }
            (ObjectKind::Complex(a, b), ObjectKind::Complex(c, d)) => a == c && b == d,
            (ObjectKind::Str(x), ObjectKind::Str(y)) => x == y,
            (ObjectKind::Bytes(x), ObjectKind::Bytes(y)) => x == y,
            (ObjectKind::Tuple(x), ObjectKind::Tuple(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(p, q)| self.objects_equal(*p, *q))
            }
            _ => false,
        }
    }

    /// Developer-facing representation, in the runtime's own syntax.
    pub fn repr(&self, obj: RawObject) -> String {
        match self.kind(obj) {
            ObjectKind::None => "None".to_string(),
            ObjectKind::Bool(true) => "True".to_string(),
            ObjectKind::Bool(false) => "False".to_string(),
            ObjectKind::Int(value) => value.to_string(),
            ObjectKind::Float(value) => format_float(*value),
            ObjectKind::Complex(re, im) => format_complex(*re, *im),
            ObjectKind::Str(value) => quote_str(value),
            ObjectKind::Bytes(value) => quote_bytes(value),
            ObjectKind::List(items) => format!("[{}]", self.join_repr(items)),
            ObjectKind::Tuple(items) if items.len() == 1 => format!("({},)", self.join_repr(items)),
            ObjectKind::Tuple(items) => format!("({})", self.join_repr(items)),
            ObjectKind::Dict(entries) => {
                let body: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", self.repr(*k), self.repr(*v)))
                    .collect();
                format!("{{{}}}", body.join(", "))
            }
            ObjectKind::Module(module) => format!("<module '{}'>", module.name),
            ObjectKind::Type(ty) => format!("<class '{}'>", ty.name),
            ObjectKind::Instance(_) => format!("<{} object at {obj}>", self.type_name(obj)),
            ObjectKind::Function(function) => format!("<built-in function {}>", function.def.name),
        }
    }

    /// User-facing text: strings render unquoted, everything else as `repr`.
    pub fn str(&self, obj: RawObject) -> String {
        match self.kind(obj) {
            ObjectKind::Str(value) => value.clone(),
            _ => self.repr(obj),
        }
    }

    fn join_repr(&self, items: &[RawObject]) -> String {
        items
            .iter()
            .map(|item| self.repr(*item))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{value:?}")
    }
}

fn format_complex(re: f64, im: f64) -> String {
    let imag = if im.is_nan() || im >= 0.0 {
        format!("+{}j", format_float(im))
    } else {
        format!("-{}j", format_float(-im))
    };
    if re == 0.0 && re.is_sign_positive() {
        format!("{}j", format_float(im))
    } else {
        format!("({}{imag})", format_float(re))
    }
}

fn quote_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn quote_bytes(value: &[u8]) -> String {
    let mut out = String::from("b'");
    for b in value {
        match b {
            b'\'' => out.push_str("\\'"),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(*b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_constructors() {
        let mut rt = Runtime::new();
        let int = rt.new_int(-42i64);
        let float = rt.new_float(2.5);
        let text = rt.new_str("hi");
        let bytes = rt.new_bytes(vec![1u8, 2]);
        let complex = rt.new_complex(1.0, -2.0);

        assert_eq!(rt.as_int(int), Some(-42));
        assert_eq!(rt.as_float(float), Some(2.5));
        assert_eq!(rt.as_str(text), Some("hi"));
        assert_eq!(rt.as_bytes(bytes), Some(&[1u8, 2][..]));
        assert_eq!(rt.as_complex(complex), Some((1.0, -2.0)));
        assert_eq!(rt.as_int(rt.new_bool(true)), None);
        assert_eq!(rt.as_bool(rt.new_bool(true)), Some(true));
    }

    #[test]
    fn test_list_operations() {
        let mut rt = Runtime::new();
        let list = rt.new_list(&[]);
        let one = rt.new_int(1);
        let two = rt.new_int(2);
        rt.list_append(list, one).unwrap();
        rt.list_append(list, one).unwrap();
        rt.list_set(list, 1, two).unwrap();

        assert_eq!(rt.list_len(list), Some(2));
        assert_eq!(rt.list_get(list, 1), Some(two));
        assert_eq!(rt.refcount(one), 2);
        assert_eq!(rt.refcount(two), 2);

        assert!(rt.list_set(list, 5, two).is_err());
        assert_eq!(rt.take_error().unwrap().kind, ExceptionKind::IndexError);
    }

    #[test]
    fn test_dict_replaces_equal_keys() {
        let mut rt = Runtime::new();
        let dict = rt.new_dict();
        let key_a = rt.new_str("a");
        let key_b = rt.new_str("a");
        let first = rt.new_int(1);
        let second = rt.new_int(2);
        rt.dict_set(dict, key_a, first).unwrap();
        rt.dict_set(dict, key_b, second).unwrap();

        assert_eq!(rt.dict_len(dict), Some(1));
        assert_eq!(rt.dict_get_str(dict, "a"), Some(second));
        assert_eq!(rt.dict_get(dict, key_b), Some(second));
        assert_eq!(rt.refcount(first), 1);
        assert_eq!(rt.refcount(key_b), 1);
    }

    #[test]
    fn test_int_and_float_keys_compare_equal() {
        let mut rt = Runtime::new();
        let int = rt.new_int(3);
        let float = rt.new_float(3.0);
        let other = rt.new_float(3.5);
        assert!(rt.objects_equal(int, float));
        assert!(!rt.objects_equal(int, other));
    }

    #[test]
    fn test_repr() {
        let mut rt = Runtime::new();
        let text = rt.new_str("it's");
        let float = rt.new_float(3.0);
        let single = rt.new_tuple(&[float]);
        let list = rt.new_list(&[text, float]);
        let bytes = rt.new_bytes(b"a\x00".to_vec());
        let complex = rt.new_complex(1.0, -2.0);
        let imag = rt.new_complex(0.0, 2.0);
        let dict = rt.new_dict();
        rt.dict_set(dict, text, float).unwrap();

        assert_eq!(rt.repr(rt.none()), "None");
        assert_eq!(rt.repr(rt.new_bool(false)), "False");
        assert_eq!(rt.repr(text), "'it\\'s'");
        assert_eq!(rt.str(text), "it's");
        assert_eq!(rt.repr(single), "(3.0,)");
        assert_eq!(rt.repr(list), "['it\\'s', 3.0]");
        assert_eq!(rt.repr(bytes), "b'a\\x00'");
        assert_eq!(rt.repr(complex), "(1.0-2.0j)");
        assert_eq!(rt.repr(imag), "2.0j");
        assert_eq!(rt.repr(dict), "{'it\\'s': 3.0}");
    }
}
