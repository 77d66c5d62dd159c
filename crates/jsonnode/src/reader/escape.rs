//! Backslash escapes inside JSON strings.
//!
//! The reader validates escapes with [`scan_escape`] while lexing and keeps
//! the raw bytes. [`unescape_into`] decodes them later, only when a caller
//! materializes the value.

use crate::error::SyntaxError;

/// Accumulates the four hexadecimal digits of a `\uXXXX` escape.
#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    code: u16,
    len: u8,
}

impl UnicodeEscapeBuffer {
    pub(crate) fn reset(&mut self) {
        self.code = 0;
        self.len = 0;
    }

    /// Feeds one byte. Returns the UTF-16 code unit once four digits were
    /// seen, `Err(b)` for a byte that is not a hex digit.
    pub(crate) fn feed(&mut self, b: u8) -> Result<Option<u16>, u8> {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(b),
        };
        self.code = self.code << 4 | u16::from(digit);
        self.len += 1;
        if self.len == 4 {
            let code = self.code;
            self.reset();
            Ok(Some(code))
        } else {
            Ok(None)
        }
    }
}

enum Hex {
    NeedMore,
    Invalid,
    Unit(u16),
}

fn hex4(bytes: &[u8], at: usize) -> Hex {
    let mut buffer = UnicodeEscapeBuffer::default();
    for i in at..at + 4 {
        let Some(&b) = bytes.get(i) else {
            return Hex::NeedMore;
        };
        match buffer.feed(b) {
            Ok(Some(unit)) => return Hex::Unit(unit),
            Ok(None) => {}
            Err(_) => return Hex::Invalid,
        }
    }
    Hex::NeedMore
}

fn invalid_reference(bytes: &[u8], at: usize) -> SyntaxError {
    let end = bytes.len().min(at + 4);
    SyntaxError::InvalidCharacterReference(String::from_utf8_lossy(&bytes[at..end]).into_owned())
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum EscapeScan {
    /// The escape needs at least this many bytes, counted from the backslash.
    NeedMore(usize),
    /// A valid escape of this many bytes.
    Complete(usize),
    Invalid(SyntaxError),
}

/// Validates the escape at the start of `bytes`, which begins with `\`.
pub(crate) fn scan_escape(bytes: &[u8]) -> EscapeScan {
    debug_assert_eq!(bytes.first(), Some(&b'\\'));
    let Some(&letter) = bytes.get(1) else {
        return EscapeScan::NeedMore(2);
    };
    match letter {
        b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => EscapeScan::Complete(2),
        b'u' => {
            let high = match hex4(bytes, 2) {
                Hex::NeedMore => return EscapeScan::NeedMore(6),
                Hex::Invalid => return EscapeScan::Invalid(invalid_reference(bytes, 2)),
                Hex::Unit(unit) => unit,
            };
            match high {
                0xD800..=0xDBFF => {
                    let lone = EscapeScan::Invalid(SyntaxError::InvalidLowSurrogate(u32::from(high)));
                    match bytes.get(6..8) {
                        Some(b"\\u") => {}
                        Some(_) => return lone,
                        None if bytes.get(6).is_some_and(|&b| b != b'\\') => return lone,
                        None => return EscapeScan::NeedMore(8),
                    }
                    match hex4(bytes, 8) {
                        Hex::NeedMore => EscapeScan::NeedMore(12),
                        Hex::Invalid => EscapeScan::Invalid(invalid_reference(bytes, 8)),
                        Hex::Unit(0xDC00..=0xDFFF) => EscapeScan::Complete(12),
                        Hex::Unit(_) => lone,
                    }
                }
                0xDC00..=0xDFFF => EscapeScan::Invalid(invalid_reference(bytes, 2)),
                _ => EscapeScan::Complete(6),
            }
        }
        other => EscapeScan::Invalid(SyntaxError::UnexpectedCharacter(other)),
    }
}

/// Decodes raw string content whose escapes were validated by
/// [`scan_escape`]. Malformed input decodes to U+FFFD instead of failing.
pub(crate) fn unescape_into(raw: &[u8], out: &mut String) {
    let mut rest = raw;
    while let Some(at) = memchr::memchr(b'\\', rest) {
        out.push_str(&String::from_utf8_lossy(&rest[..at]));
        rest = &rest[at..];
        let len = match scan_escape(rest) {
            EscapeScan::Complete(len) => len,
            _ => {
                out.push(char::REPLACEMENT_CHARACTER);
                rest = &rest[1..];
                continue;
            }
        };
        let decoded = match rest[1] {
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let unit = |at: usize| match hex4(rest, at) {
                    Hex::Unit(unit) => u32::from(unit),
                    _ => 0xFFFD,
                };
                let code = if len == 12 {
                    0x10000 + ((unit(2) - 0xD800) << 10) + (unit(8) - 0xDC00)
                } else {
                    unit(2)
                };
                char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
            }
            other => char::from(other),
        };
        out.push(decoded);
        rest = &rest[len..];
    }
    out.push_str(&String::from_utf8_lossy(rest));
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn buffer_decodes_four_digits() {
        let mut buf = UnicodeEscapeBuffer::default();
        assert_eq!(buf.feed(b'0'), Ok(None));
        assert_eq!(buf.feed(b'0'), Ok(None));
        assert_eq!(buf.feed(b'4'), Ok(None));
        assert_eq!(buf.feed(b'1'), Ok(Some(0x41)));
        // resets after a full escape
        for b in *b"AbC" {
            assert_eq!(buf.feed(b), Ok(None));
        }
        assert_eq!(buf.feed(b'd'), Ok(Some(0xABCD)));
        assert_eq!(buf.feed(b'G'), Err(b'G'));
    }

    #[rstest]
    #[case(br"\n", EscapeScan::Complete(2))]
    #[case(br"\/x", EscapeScan::Complete(2))]
    #[case(br"\u0041", EscapeScan::Complete(6))]
    #[case(br"\uD83D\uDE00", EscapeScan::Complete(12))]
    #[case(br"\", EscapeScan::NeedMore(2))]
    #[case(br"\u00", EscapeScan::NeedMore(6))]
    #[case(br"\uD83D", EscapeScan::NeedMore(8))]
    #[case(br"\uD83D\u", EscapeScan::NeedMore(12))]
    #[case(br"\x", EscapeScan::Invalid(SyntaxError::UnexpectedCharacter(b'x')))]
    #[case(br#"\uD800""#, EscapeScan::Invalid(SyntaxError::InvalidLowSurrogate(0xD800)))]
    #[case(br"\uD800\n", EscapeScan::Invalid(SyntaxError::InvalidLowSurrogate(0xD800)))]
    #[case(br"\uD800\u0041", EscapeScan::Invalid(SyntaxError::InvalidLowSurrogate(0xD800)))]
    #[case(br"\uDC00", EscapeScan::Invalid(SyntaxError::InvalidCharacterReference("DC00".into())))]
    #[case(br"\u12G4", EscapeScan::Invalid(SyntaxError::InvalidCharacterReference("12G4".into())))]
    fn escape_scanning(#[case] bytes: &[u8], #[case] expected: EscapeScan) {
        assert_eq!(scan_escape(bytes), expected);
    }

    #[rstest]
    #[case(br"\u0041", "A")]
    #[case(br"a\/b", "a/b")]
    #[case(br#"\"\\\b\f\n\r\t"#, "\"\\\u{8}\u{c}\n\r\t")]
    #[case(br"x\uD83D\uDE00y", "x\u{1F600}y")]
    #[case(br"\u00e9t\u00E9", "\u{e9}t\u{e9}")]
    fn unescaping(#[case] raw: &[u8], #[case] expected: &str) {
        let mut out = String::new();
        unescape_into(raw, &mut out);
        assert_eq!(out, expected);
    }
}
