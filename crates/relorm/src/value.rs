//! Dynamically typed SQL values and the conversions between them and
//! record field types.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Format used for string columns that receive automatic timestamps.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A bound parameter or a decoded column value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Json(serde_json::Value),
    /// Expanded into `?, ?, ...` when bound to a single placeholder.
    List(Vec<Value>),
}

/// Hashable projection of a [`Value`], used to match relation keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
}

impl Value {
    /// Build a list value, typically for `col IN (?)`.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Key used for equality when stitching related rows together.
    ///
    /// Integers of either signedness compare equal when they hold the same
    /// number. `Null`, floats, JSON and lists are never keys.
    pub fn key(&self) -> Option<ValueKey> {
        match self {
            Value::Bool(b) => Some(ValueKey::Bool(*b)),
            Value::Int(i) => Some(ValueKey::Int(*i)),
            Value::UInt(u) => Some(match i64::try_from(*u) {
                Ok(i) => ValueKey::Int(i),
                Err(_) => ValueKey::UInt(*u),
            }),
            Value::Text(s) => Some(ValueKey::Text(s.clone())),
            Value::Bytes(b) => Some(ValueKey::Bytes(b.clone())),
            Value::Timestamp(t) => Some(ValueKey::Timestamp(*t)),
            Value::Date(d) => Some(ValueKey::Date(*d)),
            Value::Null | Value::Float(_) | Value::Json(_) | Value::List(_) => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Json(_) => "json",
            Value::List(_) => "list",
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        }
    )*};
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.naive_utc())
    }
}

impl From<DateTime<Local>> for Value {
    fn from(v: DateTime<Local>) -> Self {
        Value::Timestamp(v.naive_local())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Build a `Vec<Value>` of positional arguments.
///
/// ```ignore
/// let args = relorm::args![1, "alice", Value::list([1, 2, 3])];
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}

/// A Rust type that can be stored in a record column.
///
/// Implemented for the scalar types relorm knows how to bind. `Option<T>` is
/// the nullable wrapper: `None` is its zero value and maps to `NULL`.
pub trait ColumnValue: Sized {
    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, String>;

    /// Whether this is the type-specific zero value.
    fn is_zero(&self) -> bool;

    /// Current-time value for automatic timestamp columns, when the type can
    /// hold one.
    fn now(_now: &DateTime<Local>) -> Option<Self> {
        None
    }
}

fn mismatch(expected: &str, got: &Value) -> String {
    format!("expected {expected}, got {}", got.kind())
}

macro_rules! impl_column_int {
    ($($t:ty),*) => {$(
        impl ColumnValue for $t {
            fn to_value(&self) -> Value {
                Value::from(*self)
            }

            fn from_value(value: Value) -> Result<Self, String> {
                match value {
                    Value::Int(i) => <$t>::try_from(i).map_err(|e| e.to_string()),
                    Value::UInt(u) => <$t>::try_from(u).map_err(|e| e.to_string()),
                    Value::Bool(b) => Ok(b as $t),
                    Value::Text(s) => s.trim().parse::<$t>().map_err(|e| e.to_string()),
                    other => Err(mismatch(stringify!($t), &other)),
                }
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }
        }
    )*};
}

impl_column_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_column_float {
    ($($t:ty),*) => {$(
        impl ColumnValue for $t {
            fn to_value(&self) -> Value {
                Value::from(*self)
            }

            fn from_value(value: Value) -> Result<Self, String> {
                match value {
                    Value::Float(f) => Ok(f as $t),
                    Value::Int(i) => Ok(i as $t),
                    Value::UInt(u) => Ok(u as $t),
                    Value::Text(s) => s.trim().parse::<$t>().map_err(|e| e.to_string()),
                    other => Err(mismatch(stringify!($t), &other)),
                }
            }

            fn is_zero(&self) -> bool {
                *self == 0.0
            }
        }
    )*};
}

impl_column_float!(f32, f64);

impl ColumnValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            Value::UInt(u) => Ok(u != 0),
            other => Err(mismatch("bool", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl ColumnValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bytes(b) => String::from_utf8(b).map_err(|e| e.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::UInt(u) => Ok(u.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Timestamp(t) => Ok(t.format(TIME_FORMAT).to_string()),
            Value::Date(d) => Ok(d.to_string()),
            Value::Json(j) => Ok(j.to_string()),
            other => Err(mismatch("text", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn now(now: &DateTime<Local>) -> Option<Self> {
        Some(now.format(TIME_FORMAT).to_string())
    }
}

impl ColumnValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch("bytes", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| s.parse::<NaiveDateTime>())
        .map_err(|e| e.to_string())
}

impl ColumnValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
            Value::Text(s) => parse_timestamp(&s),
            other => Err(mismatch("timestamp", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        *self == NaiveDateTime::default()
    }

    fn now(now: &DateTime<Local>) -> Option<Self> {
        Some(now.naive_local())
    }
}

impl ColumnValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Date(d) => Ok(d),
            Value::Timestamp(t) => Ok(t.date()),
            Value::Text(s) => s.parse::<NaiveDate>().map_err(|e| e.to_string()),
            other => Err(mismatch("date", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        *self == NaiveDate::default()
    }
}

impl ColumnValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.naive_utc())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        NaiveDateTime::from_value(value).map(|t| Utc.from_utc_datetime(&t))
    }

    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }

    fn now(now: &DateTime<Local>) -> Option<Self> {
        Some(now.with_timezone(&Utc))
    }
}

impl ColumnValue for DateTime<Local> {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.naive_local())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let naive = NaiveDateTime::from_value(value)?;
        Local
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| format!("ambiguous local time {naive}"))
    }

    fn is_zero(&self) -> bool {
        *self == DateTime::<Local>::default()
    }

    fn now(now: &DateTime<Local>) -> Option<Self> {
        Some(*now)
    }
}

impl ColumnValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Null => Ok(serde_json::Value::Null),
            Value::Text(s) => serde_json::from_str(&s).map_err(|e| e.to_string()),
            Value::Bytes(b) => serde_json::from_slice(&b).map_err(|e| e.to_string()),
            other => Err(mismatch("json", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ColumnValue::to_value)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn now(now: &DateTime<Local>) -> Option<Self> {
        T::now(now).map(Some)
    }
}
