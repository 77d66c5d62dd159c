//! Locale-invariant conversions between JSON text and typed values.
//!
//! Every conversion uses `.` as the decimal separator, no grouping, and
//! ignores surrounding XML whitespace (space, tab, carriage return, line
//! feed) on parse. For every supported type `T`,
//! `T::from_json_text(x.to_json_text()) == x`.

mod datetime;
mod decimal;
mod number;
mod timespan;
mod unique_id;

use base64::Engine as _;
pub use datetime::{DateTime, DateTimeKind};
pub use decimal::Decimal;
pub(crate) use number::{append_f32, append_f64};
pub use timespan::TimeSpan;
pub use unique_id::UniqueId;
use uuid::Uuid;

use crate::ConvertError;

/// Parses a value out of the text content of a node.
pub trait FromJsonText: Sized {
    /// Human readable name of the target type, used in conversion errors.
    const TARGET: &'static str;

    /// Parses `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Invalid`] for malformed text and
    /// [`ConvertError::Overflow`] for well-formed text that does not fit the
    /// target type.
    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError>;
}

/// Formats a value the way [`FromJsonText`] parses it back.
pub trait ToJsonText {
    /// Appends the text form of `self` to `out`.
    fn append_json_text(&self, out: &mut String);

    /// Returns the text form of `self`.
    fn to_json_text(&self) -> String {
        let mut out = String::new();
        self.append_json_text(&mut out);
        out
    }
}

pub(crate) fn is_xml_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

pub(crate) fn trim_xml_whitespace(text: &[u8]) -> &[u8] {
    let start = text
        .iter()
        .position(|&b| !is_xml_whitespace(b))
        .unwrap_or(text.len());
    let end = text
        .iter()
        .rposition(|&b| !is_xml_whitespace(b))
        .map_or(start, |i| i + 1);
    &text[start..end]
}

impl FromJsonText for bool {
    const TARGET: &'static str = "boolean";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        match trim_xml_whitespace(text) {
            b"true" | b"1" => Ok(true),
            b"false" | b"0" => Ok(false),
            _ => Err(ConvertError::invalid(Self::TARGET, text)),
        }
    }
}

impl ToJsonText for bool {
    fn append_json_text(&self, out: &mut String) {
        out.push_str(if *self { "true" } else { "false" });
    }
}

impl FromJsonText for String {
    const TARGET: &'static str = "string";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        core::str::from_utf8(text)
            .map(String::from)
            .map_err(|_| ConvertError::invalid(Self::TARGET, text))
    }
}

impl ToJsonText for str {
    fn append_json_text(&self, out: &mut String) {
        out.push_str(self);
    }
}

/// Base64 content, standard alphabet with padding.
impl FromJsonText for Vec<u8> {
    const TARGET: &'static str = "base64 binary";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        base64::engine::general_purpose::STANDARD
            .decode(trim_xml_whitespace(text))
            .map_err(|_| ConvertError::invalid(Self::TARGET, text))
    }
}

impl ToJsonText for [u8] {
    fn append_json_text(&self, out: &mut String) {
        base64::engine::general_purpose::STANDARD.encode_string(self, out);
    }
}

impl FromJsonText for Uuid {
    const TARGET: &'static str = "guid";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        Uuid::try_parse_ascii(trim_xml_whitespace(text))
            .map_err(|_| ConvertError::invalid(Self::TARGET, text))
    }
}

impl ToJsonText for Uuid {
    fn append_json_text(&self, out: &mut String) {
        out.push_str(self.hyphenated().encode_lower(&mut Uuid::encode_buffer()));
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(b"true", true)]
    #[case(b" false\n", false)]
    #[case(b"1", true)]
    #[case(b"0", false)]
    fn booleans(#[case] text: &[u8], #[case] expected: bool) {
        assert_eq!(bool::from_json_text(text).unwrap(), expected);
    }

    #[rstest]
    #[case(b"True")]
    #[case(b"yes")]
    #[case(b"")]
    fn malformed_booleans(#[case] text: &[u8]) {
        assert!(matches!(
            bool::from_json_text(text),
            Err(ConvertError::Invalid { target: "boolean", .. })
        ));
    }

    #[test]
    fn whitespace_trimming() {
        assert_eq!(trim_xml_whitespace(b" \t\r\nab c\n"), b"ab c");
        assert_eq!(trim_xml_whitespace(b"   "), b"");
        assert_eq!(trim_xml_whitespace(b""), b"");
    }

    #[test]
    fn base64_roundtrip() {
        let bytes = vec![0u8, 1, 2, 250, 251, 252, 253];
        let text = bytes.to_json_text();
        assert_eq!(text, "AAEC+vv8/Q==");
        assert_eq!(Vec::<u8>::from_json_text(text.as_bytes()).unwrap(), bytes);
        assert!(Vec::<u8>::from_json_text(b"not base64!").is_err());
    }

    #[rstest]
    #[case("6ba7b810-9dad-11d1-80b4-00c04fd430c8")]
    #[case("6BA7B8109DAD11D180B400C04FD430C8")]
    #[case("{6ba7b810-9dad-11d1-80b4-00c04fd430c8}")]
    #[case("urn:uuid:6ba7b810-9dad-11d1-80b4-00c04fd430c8")]
    fn guid_forms(#[case] text: &str) {
        let guid = Uuid::from_json_text(text.as_bytes()).unwrap();
        assert_eq!(
            guid.to_json_text(),
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8".to_string()
        );
    }
}
