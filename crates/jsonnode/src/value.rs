//! Typed values accepted by [`JsonNodeWriter::write_value`].
//!
//! [`JsonNodeWriter::write_value`]: crate::JsonNodeWriter::write_value

use base64::Engine as _;
use uuid::Uuid;

use crate::{
    codec::{DateTime, Decimal, TimeSpan, ToJsonText, UniqueId, append_f32, append_f64},
    json_type::JsonType,
};

/// A primitive value, borrowed where it carries a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A JSON number.
    Int8(i8),
    /// A JSON number.
    Int16(i16),
    /// A JSON number.
    Int32(i32),
    /// A JSON number.
    Int64(i64),
    /// A JSON number.
    UInt64(u64),
    /// A number, or the string `NaN`, `INF` or `-INF`.
    Float32(f32),
    /// A number, or the string `NaN`, `INF` or `-INF`.
    Float64(f64),
    /// A number keeping its scale.
    Decimal(Decimal),
    /// A string in the fixed date-time format.
    DateTime(DateTime),
    /// An ISO-8601 duration string.
    TimeSpan(TimeSpan),
    /// A hyphenated GUID string.
    Guid(Uuid),
    /// A `urn:uuid:` or opaque string.
    UniqueId(&'a UniqueId),
    /// Written as standard base64.
    Bytes(&'a [u8]),
    /// A one-character string.
    Char(char),
    /// UTF-16 code units. Unpaired surrogates are written as `\uXXXX`
    /// escapes.
    Utf16(&'a [u16]),
    /// A string.
    Str(&'a str),
}

impl Value<'_> {
    /// The JSON type an element gets when this value is its first content
    /// and no `type` attribute was written.
    ///
    /// Non-finite floats have no JSON number spelling and are strings.
    #[must_use]
    pub fn natural_type(&self) -> JsonType {
        match self {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Int8(_)
            | Value::Int16(_)
            | Value::Int32(_)
            | Value::Int64(_)
            | Value::UInt64(_)
            | Value::Decimal(_) => JsonType::Number,
            Value::Float32(f) if f.is_finite() => JsonType::Number,
            Value::Float64(f) if f.is_finite() => JsonType::Number,
            _ => JsonType::String,
        }
    }

    /// Appends the text form of the value. `Null` has none.
    pub fn append_text(&self, out: &mut String) {
        match *self {
            Value::Null => {}
            Value::Bool(b) => b.append_json_text(out),
            Value::Int8(n) => n.append_json_text(out),
            Value::Int16(n) => n.append_json_text(out),
            Value::Int32(n) => n.append_json_text(out),
            Value::Int64(n) => n.append_json_text(out),
            Value::UInt64(n) => n.append_json_text(out),
            Value::Float32(f) => append_f32(f, out),
            Value::Float64(f) => append_f64(f, out),
            Value::Decimal(d) => d.append_json_text(out),
            Value::DateTime(d) => d.append_json_text(out),
            Value::TimeSpan(t) => t.append_json_text(out),
            Value::Guid(g) => g.append_json_text(out),
            Value::UniqueId(id) => id.append_json_text(out),
            Value::Bytes(bytes) => base64::engine::general_purpose::STANDARD.encode_string(bytes, out),
            Value::Char(c) => out.push(c),
            Value::Utf16(units) => out.extend(
                char::decode_utf16(units.iter().copied())
                    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)),
            ),
            Value::Str(s) => out.push_str(s),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for Value<'_> {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }
    )*};
}

impl_from! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
    DateTime => DateTime,
    TimeSpan => TimeSpan,
    Uuid => Guid,
    char => Char,
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Str(value)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(value: &'a [u8]) -> Self {
        Value::Bytes(value)
    }
}

impl<'a> From<&'a UniqueId> for Value<'a> {
    fn from(value: &'a UniqueId) -> Self {
        Value::UniqueId(value)
    }
}

impl<T> From<Option<T>> for Value<'_>
where
    T: Into<Value<'static>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
