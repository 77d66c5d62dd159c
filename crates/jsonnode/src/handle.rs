//! Deferred references to names and values inside the byte window.
//!
//! A handle stores where a token lives, not its decoded text. The reader
//! resolves it against the window only when a caller asks, so documents
//! whose values are never inspected are never decoded.

use std::borrow::Cow;

use crate::{json_type::JsonType, reader::escape::unescape_into};

/// Names the codec synthesizes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstantName {
    Root,
    Item,
    Type,
    ServerType,
}

impl ConstantName {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            ConstantName::Root => "root",
            ConstantName::Item => "item",
            ConstantName::Type => "type",
            ConstantName::ServerType => "__type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum NameHandle {
    #[default]
    Empty,
    /// Raw UTF-8 without escapes at `buffer[offset..offset + len]`.
    Utf8Slice { offset: usize, len: usize },
    /// Raw JSON string content containing at least one escape.
    EscapedUtf8Slice { offset: usize, len: usize },
    Constant(ConstantName),
    /// The name was copied out of the window into the owning element.
    Detached,
}

impl NameHandle {
    pub(crate) fn slice(offset: usize, len: usize, escaped: bool) -> Self {
        if escaped {
            NameHandle::EscapedUtf8Slice { offset, len }
        } else {
            NameHandle::Utf8Slice { offset, len }
        }
    }

    pub(crate) fn is_slice(self) -> bool {
        matches!(
            self,
            NameHandle::Utf8Slice { .. } | NameHandle::EscapedUtf8Slice { .. }
        )
    }

    pub(crate) fn resolve<'a>(self, bytes: &'a [u8], detached: &'a str) -> Cow<'a, str> {
        match self {
            NameHandle::Empty => Cow::Borrowed(""),
            NameHandle::Utf8Slice { offset, len } => {
                String::from_utf8_lossy(&bytes[offset..offset + len])
            }
            NameHandle::EscapedUtf8Slice { offset, len } => {
                let mut out = String::with_capacity(len);
                unescape_into(&bytes[offset..offset + len], &mut out);
                Cow::Owned(out)
            }
            NameHandle::Constant(name) => Cow::Borrowed(name.as_str()),
            NameHandle::Detached => Cow::Borrowed(detached),
        }
    }

    /// Compares without materializing unescaped names.
    pub(crate) fn equals(self, bytes: &[u8], detached: &str, name: &str) -> bool {
        match self {
            NameHandle::Utf8Slice { offset, len } => &bytes[offset..offset + len] == name.as_bytes(),
            _ => self.resolve(bytes, detached) == name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ValueHandle {
    #[default]
    Empty,
    Utf8Slice { offset: usize, len: usize },
    EscapedUtf8Slice { offset: usize, len: usize },
    Constant(JsonType),
    Bool(bool),
    /// The literals `0` and `1`.
    SmallInt(u8),
    /// A canonical integer literal accumulated while lexing.
    Int64(i64),
}

impl ValueHandle {
    pub(crate) fn slice(offset: usize, len: usize, escaped: bool) -> Self {
        if escaped {
            ValueHandle::EscapedUtf8Slice { offset, len }
        } else {
            ValueHandle::Utf8Slice { offset, len }
        }
    }

    pub(crate) fn is_empty(self) -> bool {
        matches!(self, ValueHandle::Empty)
    }

    pub(crate) fn resolve(self, bytes: &[u8]) -> Cow<'_, str> {
        match self {
            ValueHandle::Empty => Cow::Borrowed(""),
            ValueHandle::Utf8Slice { offset, len } => {
                String::from_utf8_lossy(&bytes[offset..offset + len])
            }
            ValueHandle::EscapedUtf8Slice { offset, len } => {
                let mut out = String::with_capacity(len);
                unescape_into(&bytes[offset..offset + len], &mut out);
                Cow::Owned(out)
            }
            ValueHandle::Constant(t) => Cow::Borrowed(t.as_str()),
            ValueHandle::Bool(true) => Cow::Borrowed("true"),
            ValueHandle::Bool(false) => Cow::Borrowed("false"),
            ValueHandle::SmallInt(0) => Cow::Borrowed("0"),
            ValueHandle::SmallInt(_) => Cow::Borrowed("1"),
            ValueHandle::Int64(n) => Cow::Owned(itoa::Buffer::new().format(n).to_owned()),
        }
    }

    /// The integer value, when the lexer already computed it.
    pub(crate) fn as_i64(self) -> Option<i64> {
        match self {
            ValueHandle::SmallInt(n) => Some(i64::from(n)),
            ValueHandle::Int64(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn as_bool(self) -> Option<bool> {
        match self {
            ValueHandle::Bool(b) => Some(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUFFER: &[u8] = r#"{"café":"na\"me","plain":42}"#.as_bytes();

    #[test]
    fn names_resolve_lazily() {
        let escaped = NameHandle::slice(2, 5, true);
        assert_eq!(escaped.resolve(BUFFER, ""), "café");
        assert!(matches!(escaped.resolve(BUFFER, ""), Cow::Owned(_)));
        let plain = NameHandle::slice(19, 5, false);
        assert!(matches!(plain.resolve(BUFFER, ""), Cow::Borrowed("plain")));
        assert!(plain.equals(BUFFER, "", "plain"));
        assert!(escaped.equals(BUFFER, "", "café"));
        assert_eq!(NameHandle::Detached.resolve(BUFFER, "kept"), "kept");
        assert_eq!(
            NameHandle::Constant(ConstantName::ServerType).resolve(BUFFER, ""),
            "__type"
        );
    }

    #[test]
    fn values_resolve_lazily() {
        assert_eq!(ValueHandle::slice(10, 6, true).resolve(BUFFER), "na\"me");
        assert_eq!(ValueHandle::Int64(-42).resolve(BUFFER), "-42");
        assert_eq!(ValueHandle::SmallInt(1).resolve(BUFFER), "1");
        assert_eq!(ValueHandle::Bool(false).resolve(BUFFER), "false");
        assert_eq!(ValueHandle::Constant(JsonType::Array).resolve(BUFFER), "array");
        assert_eq!(ValueHandle::Empty.resolve(BUFFER), "");
        assert_eq!(ValueHandle::SmallInt(0).as_i64(), Some(0));
    }
}
