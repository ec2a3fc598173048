//! Attribute values and their wire representation.
//!
//! [`Value`] is the intermediate form every attribute passes through. Native
//! field types convert into it with [`ToValue`] and out of it with
//! [`FromValue`]; [`Value::to_wire`] and [`Value::from_wire`] cross the JSON
//! boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Number;

/// A dynamically-typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer that does not fit in `i64`.
    UInt(u64),
    /// Floating point.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// UTC timestamp, ISO-8601 on the wire.
    Timestamp(DateTime<Utc>),
    /// Arbitrary nested JSON (arrays, objects).
    Json(serde_json::Value),
}

/// Why a value could not be converted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("invalid timestamp `{input}`: {reason}")]
    Timestamp { input: String, reason: String },

    #[error("{0} cannot be represented in JSON")]
    NonFinite(f64),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::UInt(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Json(serde_json::Value::Array(_)) => "array",
            Value::Json(serde_json::Value::Object(_)) => "object",
            Value::Json(_) => "json",
        }
    }

    /// True for `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for the zero value of the variant: null, `false`, `0`, `""`, `[]`, `{}`.
    ///
    /// Drives `omitempty` attributes.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::UInt(u) => *u == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty(),
            Value::Timestamp(_) => false,
            Value::Json(serde_json::Value::Null) => true,
            Value::Json(serde_json::Value::Array(a)) => a.is_empty(),
            Value::Json(serde_json::Value::Object(o)) => o.is_empty(),
            Value::Json(_) => false,
        }
    }

    /// Get as string slice if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Encode for the wire.
    pub fn to_wire(&self) -> Result<serde_json::Value, ValueError> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::UInt(u) => serde_json::Value::Number((*u).into()),
            Value::Float(f) => {
                serde_json::Value::Number(Number::from_f64(*f).ok_or(ValueError::NonFinite(*f))?)
            }
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(ts) => {
                serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Json(v) => v.clone(),
        })
    }

    /// Decode a wire value without knowing the target type.
    ///
    /// Numbers prefer `Int`, then `UInt`, then `Float`. Strings stay `Text` even
    /// when they look like timestamps; [`FromValue`] for `DateTime<Utc>` parses them.
    pub fn from_wire(wire: &serde_json::Value) -> Value {
        match wire {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Json(other.clone()),
        }
    }
}

/// Convert a native field value into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Convert a [`Value`] back into a native field value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

fn mismatch(expected: &'static str, found: &Value) -> ValueError {
    ValueError::Mismatch {
        expected,
        found: found.kind(),
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                let out_of_range = |v: String| ValueError::OutOfRange { value: v, target: stringify!($ty) };
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range(i.to_string())),
                    Value::UInt(u) => <$ty>::try_from(u).map_err(|_| out_of_range(u.to_string())),
                    Value::Float(f) => integral_float(f)
                        .and_then(|i| <$ty>::try_from(i).ok())
                        .ok_or_else(|| out_of_range(f.to_string())),
                    other => Err(mismatch("integer", &other)),
                }
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                let wide = u64::from(*self);
                i64::try_from(wide).map_or(Value::UInt(wide), Value::Int)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                let out_of_range = |v: String| ValueError::OutOfRange { value: v, target: stringify!($ty) };
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range(i.to_string())),
                    Value::UInt(u) => <$ty>::try_from(u).map_err(|_| out_of_range(u.to_string())),
                    Value::Float(f) => integral_float(f)
                        .and_then(|i| <$ty>::try_from(i).ok())
                        .ok_or_else(|| out_of_range(f.to_string())),
                    other => Err(mismatch("integer", &other)),
                }
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64);
impl_unsigned!(u8, u16, u32, u64);

/// `1.0` coerces to `1`; `1.5` does not.
#[allow(clippy::cast_possible_truncation)]
fn integral_float(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::UInt(u) => Ok(u as f64),
            other => Err(mismatch("number", &other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            Value::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| ValueError::Timestamp {
                    reason: e.to_string(),
                    input: s,
                }),
            Value::Int(secs) => DateTime::from_timestamp(secs, 0).ok_or(ValueError::OutOfRange {
                value: secs.to_string(),
                target: "timestamp",
            }),
            other => Err(mismatch("timestamp", &other)),
        }
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Json(v) => Ok(v),
            other => other.to_wire(),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}
