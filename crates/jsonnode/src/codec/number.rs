//! Integer and floating point conversions.

use super::{FromJsonText, ToJsonText, trim_xml_whitespace};
use crate::ConvertError;

/// Splits an optional leading sign off `text`.
pub(super) fn split_sign(text: &[u8]) -> (bool, &[u8]) {
    match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, text),
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $target:literal),* $(,)?) => {$(
        impl FromJsonText for $ty {
            const TARGET: &'static str = $target;

            fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
                let (negative, digits) = split_sign(trim_xml_whitespace(text));
                if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
                    return Err(ConvertError::invalid(Self::TARGET, text));
                }
                // Negative values accumulate downwards so that MIN parses.
                let mut acc: $ty = 0;
                for &d in digits {
                    #[allow(clippy::cast_lossless, clippy::cast_possible_wrap)]
                    let d = (d - b'0') as $ty;
                    acc = acc
                        .checked_mul(10)
                        .and_then(|acc| {
                            if negative {
                                acc.checked_sub(d)
                            } else {
                                acc.checked_add(d)
                            }
                        })
                        .ok_or_else(|| ConvertError::overflow(Self::TARGET, text))?;
                }
                Ok(acc)
            }
        }

        impl ToJsonText for $ty {
            fn append_json_text(&self, out: &mut String) {
                out.push_str(itoa::Buffer::new().format(*self));
            }
        }
    )*};
}

impl_integer! {
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    i64 => "int64",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
}

const POW10_F64: [f64; 11] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10,
];
const POW10_F32: [f32; 8] = [1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7];

/// A plain decimal literal `digits[.digits]` that is short enough to be
/// represented exactly as an integer mantissa.
struct ShortDecimal {
    negative: bool,
    mantissa: u64,
    fraction_digits: usize,
}

impl ShortDecimal {
    fn parse(text: &[u8], max_digits: usize) -> Option<Self> {
        let (negative, body) = split_sign(text);
        let (int, frac) = match memchr::memchr(b'.', body) {
            Some(dot) => (&body[..dot], Some(&body[dot + 1..])),
            None => (body, None),
        };
        if int.is_empty() || frac.is_some_and(<[u8]>::is_empty) {
            return None;
        }
        let frac = frac.unwrap_or_default();
        if int.len() + frac.len() > max_digits {
            return None;
        }
        let mut mantissa = 0u64;
        for &d in int.iter().chain(frac) {
            if !d.is_ascii_digit() {
                return None;
            }
            mantissa = mantissa * 10 + u64::from(d - b'0');
        }
        Some(Self {
            negative,
            mantissa,
            fraction_digits: frac.len(),
        })
    }
}

enum Special {
    PositiveInfinity,
    NegativeInfinity,
    NaN,
}

fn special(text: &[u8]) -> Option<Special> {
    match text {
        b"INF" | b"Infinity" | b"+Infinity" => Some(Special::PositiveInfinity),
        b"-INF" | b"-Infinity" => Some(Special::NegativeInfinity),
        b"NaN" => Some(Special::NaN),
        _ => None,
    }
}

/// Slow path shared by both float widths. `str::parse` alone would also
/// accept spellings like `inf` or `nan`.
fn parse_general<T: core::str::FromStr>(text: &[u8], target: &'static str) -> Result<T, ConvertError> {
    if text.is_empty()
        || !text
            .iter()
            .all(|b| matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return Err(ConvertError::invalid(target, text));
    }
    core::str::from_utf8(text)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| ConvertError::invalid(target, text))
}

impl FromJsonText for f64 {
    const TARGET: &'static str = "double";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        let trimmed = trim_xml_whitespace(text);
        if let Some(short) = ShortDecimal::parse(trimmed, 10) {
            #[allow(clippy::cast_precision_loss)]
            let magnitude = short.mantissa as f64 / POW10_F64[short.fraction_digits];
            return Ok(if short.negative { -magnitude } else { magnitude });
        }
        match special(trimmed) {
            Some(Special::PositiveInfinity) => return Ok(f64::INFINITY),
            Some(Special::NegativeInfinity) => return Ok(f64::NEG_INFINITY),
            Some(Special::NaN) => return Ok(f64::NAN),
            None => {}
        }
        let value: f64 = parse_general(trimmed, Self::TARGET)?;
        if value.is_infinite() {
            return Err(ConvertError::overflow(Self::TARGET, text));
        }
        Ok(value)
    }
}

impl FromJsonText for f32 {
    const TARGET: &'static str = "float";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        let trimmed = trim_xml_whitespace(text);
        if let Some(short) = ShortDecimal::parse(trimmed, 7) {
            #[allow(clippy::cast_precision_loss)]
            let magnitude = short.mantissa as f32 / POW10_F32[short.fraction_digits];
            return Ok(if short.negative { -magnitude } else { magnitude });
        }
        match special(trimmed) {
            Some(Special::PositiveInfinity) => return Ok(f32::INFINITY),
            Some(Special::NegativeInfinity) => return Ok(f32::NEG_INFINITY),
            Some(Special::NaN) => return Ok(f32::NAN),
            None => {}
        }
        let value: f32 = parse_general(trimmed, Self::TARGET)?;
        if value.is_infinite() {
            return Err(ConvertError::overflow(Self::TARGET, text));
        }
        Ok(value)
    }
}

macro_rules! append_float {
    ($name:ident, $ty:ty) => {
        pub(crate) fn $name(value: $ty, out: &mut String) {
            if value.is_nan() {
                out.push_str("NaN");
            } else if value.is_infinite() {
                out.push_str(if value > 0.0 { "INF" } else { "-INF" });
            } else if value == 0.0 {
                out.push_str(if value.is_sign_negative() { "-0" } else { "0" });
            } else {
                let mut buffer = ryu::Buffer::new();
                let text = buffer.format_finite(value);
                out.push_str(text.strip_suffix(".0").unwrap_or(text));
            }
        }
    };
}

append_float!(append_f64, f64);
append_float!(append_f32, f32);

impl ToJsonText for f64 {
    fn append_json_text(&self, out: &mut String) {
        append_f64(*self, out);
    }
}

impl ToJsonText for f32 {
    fn append_json_text(&self, out: &mut String) {
        append_f32(*self, out);
    }
}
