//! Escaping of JSON string content on write.

const HEX: &[u8; 16] = b"0123456789abcdef";

fn push_unit(out: &mut Vec<u8>, unit: u16) {
    out.extend_from_slice(b"\\u");
    for shift in [12, 8, 4, 0] {
        out.push(HEX[usize::from((unit >> shift) & 0xF)]);
    }
}

/// Appends `text` to `out` as JSON string content.
///
/// `"` and `\` get their short escapes, `/` too when `escape_solidus` is
/// set. Control characters and the non-characters U+FFFE and U+FFFF are
/// written as `\uXXXX`. Everything else is copied verbatim.
pub(crate) fn escape_str(out: &mut Vec<u8>, text: &str, escape_solidus: bool) {
    let bytes = text.as_bytes();
    let mut run = 0;
    let mut i = 0;
    while i < bytes.len() {
        let width = match bytes[i] {
            b'"' | b'\\' => 1,
            b'/' if escape_solidus => 1,
            0x00..=0x1F => 1,
            0xEF if matches!(bytes.get(i + 1..i + 3), Some([0xBF, 0xBE | 0xBF])) => 3,
            _ => {
                i += 1;
                continue;
            }
        };
        out.extend_from_slice(&bytes[run..i]);
        match bytes[i] {
            b @ (b'"' | b'\\' | b'/') => out.extend_from_slice(&[b'\\', b]),
            0xEF => push_unit(out, 0xFFC0 | u16::from(bytes[i + 2] & 0x3F)),
            b => push_unit(out, u16::from(b)),
        }
        i += width;
        run = i;
    }
    out.extend_from_slice(&bytes[run..]);
}

/// Like [`escape_str`], for UTF-16 code units. Unpaired surrogates are
/// written as `\uXXXX` escapes.
pub(crate) fn escape_utf16(out: &mut Vec<u8>, units: &[u16], escape_solidus: bool) {
    let mut buf = [0u8; 4];
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(c) => escape_str(out, c.encode_utf8(&mut buf), escape_solidus),
            Err(e) => push_unit(out, e.unpaired_surrogate()),
        }
    }
}
