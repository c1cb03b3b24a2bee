//! Uniform, read-only access to JSON values.
//!
//! The validator never touches a concrete JSON library directly. Instead it
//! goes through the [`Adapter`](trait.Adapter.html) trait, which exposes type
//! predicates, accessors, member and element iteration, comparison and
//! freezing. Two adapters ship with this crate:
//!
//! * [`ValueAdapter`](struct.ValueAdapter.html), over a `serde_json::Value`.
//! * [`StringAdapter`](struct.StringAdapter.html), over a bare string whose
//!   type is only known loosely (for example, a query parameter).
//!
//! Every adapter distinguishes *authoritative* types (`is_*`) from *possible*
//! types (`maybe_*`). A validator in strict mode only looks at the former.

use serde_json::{Number, Value};
use std::borrow::Cow;

/// The capability set the validator needs from a JSON value.
///
/// Strict accessors (`get_*`) return `None` unless the authoritative type
/// matches. Loose accessors (`as_*`) also succeed when the value can be
/// coerced, that is, whenever the corresponding `maybe_*` predicate holds.
/// Implementations only need to override the loose methods if they support
/// coercion at all; by default they fall back to the strict ones.
pub trait Adapter: Clone {
    fn is_array(&self) -> bool;
    fn is_bool(&self) -> bool;
    fn is_double(&self) -> bool;
    fn is_integer(&self) -> bool;
    fn is_null(&self) -> bool;
    fn is_object(&self) -> bool;
    fn is_string(&self) -> bool;

    fn is_number(&self) -> bool {
        self.is_integer() || self.is_double()
    }

    fn maybe_array(&self) -> bool {
        self.is_array()
    }

    fn maybe_bool(&self) -> bool {
        self.is_bool()
    }

    fn maybe_double(&self) -> bool {
        self.is_number()
    }

    fn maybe_integer(&self) -> bool {
        self.is_integer()
    }

    fn maybe_null(&self) -> bool {
        self.is_null()
    }

    fn maybe_object(&self) -> bool {
        self.is_object()
    }

    fn maybe_string(&self) -> bool {
        self.is_string()
    }

    fn get_array(&self) -> Option<Vec<Self>>;
    fn get_bool(&self) -> Option<bool>;
    fn get_integer(&self) -> Option<i64>;
    fn get_number(&self) -> Option<f64>;
    fn get_object(&self) -> Option<Vec<(Cow<'_, str>, Self)>>;
    fn get_string(&self) -> Option<Cow<'_, str>>;

    fn as_array(&self) -> Option<Vec<Self>> {
        self.get_array()
    }

    fn as_bool(&self) -> Option<bool> {
        self.get_bool()
    }

    fn as_double(&self) -> Option<f64> {
        self.get_number()
    }

    fn as_integer(&self) -> Option<i64> {
        self.get_integer()
    }

    fn as_object(&self) -> Option<Vec<(Cow<'_, str>, Self)>> {
        self.get_object()
    }

    fn as_string(&self) -> Option<Cow<'_, str>> {
        self.get_string()
    }

    /// Look up an object member by name.
    ///
    /// Returns `None` if the value is not an object or has no such member.
    fn find(&self, name: &str) -> Option<Self> {
        self.get_object()?
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Compare with a value from any adapter. See [`equal`](fn.equal.html).
    fn equal_to<B: Adapter>(&self, other: &B, strict: bool) -> bool {
        equal(self, other, strict)
    }

    /// Deep-copy this value into an adapter-independent snapshot.
    fn freeze(&self) -> FrozenValue {
        FrozenValue(to_value(self))
    }
}

/// Compare two values that may come from different adapters.
///
/// In strict mode, both sides must have the same authoritative type. Numbers
/// are compared by value, so `1` and `1.0` are equal. In loose mode, the
/// `maybe_*` coercions of either side take part in the comparison, so the
/// string `"1"` equals the number `1`.
pub fn equal<A: Adapter, B: Adapter>(a: &A, b: &B, strict: bool) -> bool {
    if a.is_null() || (!strict && a.maybe_null()) {
        return b.is_null() || (!strict && b.maybe_null());
    }

    if a.is_bool() || (!strict && a.maybe_bool()) {
        return (b.is_bool() || (!strict && b.maybe_bool())) && a.as_bool() == b.as_bool();
    }

    if strict && a.is_number() {
        return b.is_number() && numbers_equal(a, b);
    }

    if !strict && a.maybe_double() {
        return b.maybe_double() && a.as_double() == b.as_double();
    }

    if !strict && a.maybe_integer() {
        return b.maybe_integer() && a.as_integer() == b.as_integer();
    }

    if a.is_string() || (!strict && a.maybe_string()) {
        return (b.is_string() || (!strict && b.maybe_string())) && a.as_string() == b.as_string();
    }

    if a.is_array() {
        if !(b.is_array() || (!strict && b.maybe_array())) {
            return false;
        }
        return match (a.as_array(), b.as_array()) {
            (Some(xs), Some(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(&ys).all(|(x, y)| equal(x, y, strict))
            }
            _ => false,
        };
    }

    if a.is_object() {
        if !(b.is_object() || (!strict && b.maybe_object())) {
            return false;
        }
        return match (a.as_object(), b.as_object()) {
            (Some(xs), Some(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().all(|(key, x)| {
                        ys.iter()
                            .find(|(other, _)| other == key)
                            .map_or(false, |(_, y)| equal(x, y, strict))
                    })
            }
            _ => false,
        };
    }

    false
}

fn numbers_equal<A: Adapter, B: Adapter>(a: &A, b: &B) -> bool {
    match (a.get_integer(), b.get_integer()) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.get_number(), b.get_number()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn to_value<A: Adapter>(adapter: &A) -> Value {
    if adapter.is_null() {
        return Value::Null;
    }

    if let Some(b) = adapter.get_bool() {
        return Value::Bool(b);
    }

    if let Some(i) = adapter.get_integer() {
        return Value::from(i);
    }

    if let Some(n) = adapter.get_number() {
        return Number::from_f64(n).map_or(Value::Null, Value::Number);
    }

    if let Some(s) = adapter.get_string() {
        return Value::String(s.into_owned());
    }

    if let Some(items) = adapter.get_array() {
        return Value::Array(items.iter().map(to_value).collect());
    }

    if let Some(members) = adapter.get_object() {
        return Value::Object(
            members
                .iter()
                .map(|(key, value)| (key.to_string(), to_value(value)))
                .collect(),
        );
    }

    Value::Null
}

/// An adapter-independent snapshot of a JSON value.
///
/// Frozen values are what `enum` and `const` constraints hold: they outlive
/// the schema document they were parsed from, and they compare against any
/// adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct FrozenValue(Value);

impl FrozenValue {
    pub fn new(value: Value) -> Self {
        FrozenValue(value)
    }

    /// Get the underlying `serde_json::Value`.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Same as [`as_value`](#method.as_value), but moves ownership.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// View the snapshot through an adapter.
    pub fn adapter(&self) -> ValueAdapter<'_> {
        ValueAdapter::new(&self.0)
    }

    pub fn equal_to<A: Adapter>(&self, other: &A, strict: bool) -> bool {
        equal(&self.adapter(), other, strict)
    }
}

impl From<Value> for FrozenValue {
    fn from(value: Value) -> Self {
        FrozenValue(value)
    }
}

/// An adapter over a borrowed `serde_json::Value`.
///
/// Authoritative types follow the value exactly; in particular `1.0` is a
/// double, not an integer. The loose coercions accept:
///
/// * `"true"` and `"false"` as booleans,
/// * strings that parse in full as numbers or integers,
/// * integral doubles as integers,
/// * the empty string as null,
/// * an empty array as an object and an empty object as an array,
/// * booleans, numbers, and empty containers as strings.
#[derive(Clone, Copy, Debug)]
pub struct ValueAdapter<'a> {
    value: &'a Value,
}

impl<'a> ValueAdapter<'a> {
    pub fn new(value: &'a Value) -> Self {
        ValueAdapter { value }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    fn is_empty_array(&self) -> bool {
        self.value.as_array().map_or(false, |items| items.is_empty())
    }

    fn is_empty_object(&self) -> bool {
        self.value.as_object().map_or(false, |members| members.is_empty())
    }
}

impl<'a> From<&'a Value> for ValueAdapter<'a> {
    fn from(value: &'a Value) -> Self {
        ValueAdapter::new(value)
    }
}

impl<'a> Adapter for ValueAdapter<'a> {
    fn is_array(&self) -> bool {
        self.value.is_array()
    }

    fn is_bool(&self) -> bool {
        self.value.is_boolean()
    }

    fn is_double(&self) -> bool {
        self.value.is_f64()
    }

    fn is_integer(&self) -> bool {
        self.value.is_i64() || self.value.is_u64()
    }

    fn is_null(&self) -> bool {
        self.value.is_null()
    }

    fn is_object(&self) -> bool {
        self.value.is_object()
    }

    fn is_string(&self) -> bool {
        self.value.is_string()
    }

    fn maybe_array(&self) -> bool {
        self.is_array() || self.is_empty_object()
    }

    fn maybe_bool(&self) -> bool {
        match self.value {
            Value::Bool(_) => true,
            Value::String(s) => s == "true" || s == "false",
            _ => false,
        }
    }

    fn maybe_double(&self) -> bool {
        self.as_double().is_some()
    }

    fn maybe_integer(&self) -> bool {
        self.as_integer().is_some()
    }

    fn maybe_null(&self) -> bool {
        match self.value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    fn maybe_object(&self) -> bool {
        self.is_object() || self.is_empty_array()
    }

    fn maybe_string(&self) -> bool {
        match self.value {
            Value::String(_) | Value::Bool(_) | Value::Number(_) => true,
            Value::Array(items) => items.is_empty(),
            Value::Object(members) => members.is_empty(),
            Value::Null => false,
        }
    }

    fn get_array(&self) -> Option<Vec<Self>> {
        self.value
            .as_array()
            .map(|items| items.iter().map(ValueAdapter::new).collect())
    }

    fn get_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    fn get_integer(&self) -> Option<i64> {
        self.value.as_i64()
    }

    fn get_number(&self) -> Option<f64> {
        self.value.as_f64()
    }

    fn get_object(&self) -> Option<Vec<(Cow<'_, str>, Self)>> {
        self.value.as_object().map(|members| {
            members
                .iter()
                .map(|(key, value)| (Cow::Borrowed(key.as_str()), ValueAdapter::new(value)))
                .collect()
        })
    }

    fn get_string(&self) -> Option<Cow<'_, str>> {
        self.value.as_str().map(Cow::Borrowed)
    }

    fn as_array(&self) -> Option<Vec<Self>> {
        if self.is_empty_object() {
            return Some(vec![]);
        }
        self.get_array()
    }

    fn as_bool(&self) -> Option<bool> {
        match self.value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s == "true" => Some(true),
            Value::String(s) if s == "false" => Some(false),
            _ => None,
        }
    }

    fn as_double(&self) -> Option<f64> {
        match self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_double(s),
            _ => None,
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self.value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn as_object(&self) -> Option<Vec<(Cow<'_, str>, Self)>> {
        if self.is_empty_array() {
            return Some(vec![]);
        }
        self.get_object()
    }

    fn as_string(&self) -> Option<Cow<'_, str>> {
        match self.value {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Array(items) if items.is_empty() => Some(Cow::Borrowed("")),
            Value::Object(members) if members.is_empty() => Some(Cow::Borrowed("")),
            _ => None,
        }
    }

    fn find(&self, name: &str) -> Option<Self> {
        self.value.as_object()?.get(name).map(ValueAdapter::new)
    }

    fn freeze(&self) -> FrozenValue {
        FrozenValue(self.value.clone())
    }
}

/// An adapter over a bare string.
///
/// The value is always authoritatively a string. Through coercion it may
/// also be a boolean (`"true"`, `"false"`), a number or integer (when it
/// parses in full), or null and an empty object (when it is empty).
#[derive(Clone, Copy, Debug)]
pub struct StringAdapter<'a> {
    value: &'a str,
}

impl<'a> StringAdapter<'a> {
    pub fn new(value: &'a str) -> Self {
        StringAdapter { value }
    }
}

impl<'a> Adapter for StringAdapter<'a> {
    fn is_array(&self) -> bool {
        false
    }

    fn is_bool(&self) -> bool {
        false
    }

    fn is_double(&self) -> bool {
        false
    }

    fn is_integer(&self) -> bool {
        false
    }

    fn is_null(&self) -> bool {
        false
    }

    fn is_object(&self) -> bool {
        false
    }

    fn is_string(&self) -> bool {
        true
    }

    fn maybe_bool(&self) -> bool {
        self.value == "true" || self.value == "false"
    }

    fn maybe_double(&self) -> bool {
        parse_double(self.value).is_some()
    }

    fn maybe_integer(&self) -> bool {
        self.value.parse::<i64>().is_ok()
    }

    fn maybe_null(&self) -> bool {
        self.value.is_empty()
    }

    fn maybe_object(&self) -> bool {
        self.value.is_empty()
    }

    fn get_array(&self) -> Option<Vec<Self>> {
        None
    }

    fn get_bool(&self) -> Option<bool> {
        None
    }

    fn get_integer(&self) -> Option<i64> {
        None
    }

    fn get_number(&self) -> Option<f64> {
        None
    }

    fn get_object(&self) -> Option<Vec<(Cow<'_, str>, Self)>> {
        None
    }

    fn get_string(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.value))
    }

    fn as_bool(&self) -> Option<bool> {
        match self.value {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn as_double(&self) -> Option<f64> {
        parse_double(self.value)
    }

    fn as_integer(&self) -> Option<i64> {
        self.value.parse().ok()
    }

    fn as_object(&self) -> Option<Vec<(Cow<'_, str>, Self)>> {
        if self.value.is_empty() {
            Some(vec![])
        } else {
            None
        }
    }
}

fn parse_double(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|d| d.is_finite())
}

fn integral(d: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; the nearest double is 2^63.
    if d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64 {
        Some(d as i64)
    } else {
        None
    }
}
