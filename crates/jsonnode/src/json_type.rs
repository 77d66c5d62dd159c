use core::{fmt, str::FromStr};

/// The JSON type carried by the synthetic `type` attribute of every element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum JsonType {
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `null`.
    Null,
    /// A JSON object; its members are child elements.
    Object,
    /// A JSON array; its items are `item` child elements.
    Array,
}

impl JsonType {
    /// All six type tags, in attribute-value order.
    pub const ALL: [JsonType; 6] = [
        JsonType::String,
        JsonType::Number,
        JsonType::Boolean,
        JsonType::Null,
        JsonType::Object,
        JsonType::Array,
    ];

    /// The value written in the `type` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
            JsonType::Object => "object",
            JsonType::Array => "array",
        }
    }

    /// Deduces the type of a JSON value from its first byte.
    #[must_use]
    pub const fn from_first_byte(b: u8) -> Option<JsonType> {
        match b {
            b'"' => Some(JsonType::String),
            b'{' => Some(JsonType::Object),
            b'[' => Some(JsonType::Array),
            b't' | b'f' => Some(JsonType::Boolean),
            b'n' => Some(JsonType::Null),
            b'-' | b'0'..=b'9' => Some(JsonType::Number),
            _ => None,
        }
    }

    pub(crate) fn from_bytes(text: &[u8]) -> Option<JsonType> {
        JsonType::ALL
            .into_iter()
            .find(|t| t.as_str().as_bytes() == text)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JsonType {
    type Err = crate::ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonType::from_bytes(s.as_bytes())
            .ok_or_else(|| crate::ConvertError::invalid("JSON type", s.as_bytes()))
    }
}
