use core::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use super::{FromJsonText, ToJsonText, number::split_sign, trim_xml_whitespace};
use crate::ConvertError;

const MAX_MANTISSA: u128 = (1 << 96) - 1;

/// A base-10 fixed point number with a 96-bit mantissa and a scale of at
/// most 28 fractional digits.
///
/// The scale is part of the value's text form (`1.50` keeps two fractional
/// digits) but not of its identity: `1.50 == 1.5`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    mantissa: u128,
    scale: u8,
    negative: bool,
}

impl Decimal {
    /// Largest supported scale.
    pub const MAX_SCALE: u8 = 28;

    /// `0`.
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
        negative: false,
    };

    /// `79228162514264337593543950335`.
    pub const MAX: Decimal = Decimal {
        mantissa: MAX_MANTISSA,
        scale: 0,
        negative: false,
    };

    /// `-79228162514264337593543950335`.
    pub const MIN: Decimal = Decimal {
        mantissa: MAX_MANTISSA,
        scale: 0,
        negative: true,
    };

    /// Builds `(-1)^negative * mantissa / 10^scale`. Returns `None` when the
    /// mantissa needs more than 96 bits or the scale exceeds
    /// [`Decimal::MAX_SCALE`].
    #[must_use]
    pub const fn from_parts(mantissa: u128, scale: u8, negative: bool) -> Option<Self> {
        if mantissa > MAX_MANTISSA || scale > Self::MAX_SCALE {
            return None;
        }
        Some(Self {
            mantissa,
            scale,
            negative: negative && mantissa != 0,
        })
    }

    /// The unsigned 96-bit mantissa.
    #[must_use]
    pub const fn mantissa(&self) -> u128 {
        self.mantissa
    }

    /// Digits after the decimal point.
    #[must_use]
    pub const fn scale(&self) -> u8 {
        self.scale
    }

    /// Whether the value is below zero.
    #[must_use]
    pub const fn is_sign_negative(&self) -> bool {
        self.negative
    }

    /// Strips trailing fractional zeros.
    #[must_use]
    pub fn normalize(self) -> Self {
        let mut out = self;
        while out.scale > 0 && out.mantissa % 10 == 0 {
            out.mantissa /= 10;
            out.scale -= 1;
        }
        out
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.normalize(), other.normalize());
        a.mantissa == b.mantissa && a.scale == b.scale && a.negative == b.negative
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let n = self.normalize();
        n.mantissa.hash(state);
        n.scale.hash(state);
        n.negative.hash(state);
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self {
            mantissa: u128::from(value.unsigned_abs()),
            scale: 0,
            negative: value < 0,
        }
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self {
            mantissa: u128::from(value),
            scale: 0,
            negative: false,
        }
    }
}

/// Divides by ten, rounding half away from zero.
fn div10_round(m: u128) -> u128 {
    m / 10 + u128::from(m % 10 >= 5)
}

impl FromJsonText for Decimal {
    const TARGET: &'static str = "decimal";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        let invalid = || ConvertError::invalid(Self::TARGET, text);
        let overflow = || ConvertError::overflow(Self::TARGET, text);

        let (negative, body) = split_sign(trim_xml_whitespace(text));
        let (significand, exponent) = match body.iter().position(|&b| b == b'e' || b == b'E') {
            Some(at) => {
                let exp = i32::from_json_text(&body[at + 1..]).map_err(|e| match e {
                    ConvertError::Overflow { .. } => overflow(),
                    ConvertError::Invalid { .. } => invalid(),
                })?;
                (&body[..at], i64::from(exp))
            }
            None => (body, 0),
        };

        // value = mantissa * 10^exp10
        let mut mantissa = 0u128;
        let mut exp10 = exponent;
        let mut seen_digit = false;
        let mut seen_dot = false;
        let mut dropped = false;
        let mut round_up = false;
        for &b in significand {
            match b {
                b'.' if !seen_dot => seen_dot = true,
                b'0'..=b'9' => {
                    seen_digit = true;
                    let d = u128::from(b - b'0');
                    let next = mantissa * 10 + d;
                    if !dropped && next <= MAX_MANTISSA {
                        mantissa = next;
                        if seen_dot {
                            exp10 -= 1;
                        }
                    } else {
                        if !dropped {
                            round_up = d >= 5;
                            dropped = true;
                        }
                        if !seen_dot {
                            exp10 += 1;
                        }
                    }
                }
                _ => return Err(invalid()),
            }
        }
        if !seen_digit {
            return Err(invalid());
        }
        if round_up {
            mantissa += 1;
            if mantissa > MAX_MANTISSA {
                mantissa = div10_round(mantissa);
                exp10 += 1;
            }
        }

        if mantissa == 0 {
            exp10 = exp10.clamp(-i64::from(Self::MAX_SCALE), 0);
        }
        if exp10 > 0 {
            for _ in 0..exp10 {
                mantissa = mantissa
                    .checked_mul(10)
                    .filter(|m| *m <= MAX_MANTISSA)
                    .ok_or_else(overflow)?;
            }
            exp10 = 0;
        }
        let min_exp = -i64::from(Self::MAX_SCALE);
        if exp10 < min_exp - 40 {
            // Every digit falls below the smallest representable unit.
            mantissa = 0;
            exp10 = 0;
        }
        while exp10 < min_exp {
            mantissa = div10_round(mantissa);
            exp10 += 1;
        }

        let scale = u8::try_from(-exp10).map_err(|_| invalid())?;
        Decimal::from_parts(mantissa, scale, negative).ok_or_else(overflow)
    }
}

impl ToJsonText for Decimal {
    fn append_json_text(&self, out: &mut String) {
        if self.negative {
            out.push('-');
        }
        let mut buffer = itoa::Buffer::new();
        let digits = buffer.format(self.mantissa);
        let scale = usize::from(self.scale);
        if scale == 0 {
            out.push_str(digits);
        } else if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            out.push_str(int);
            out.push('.');
            out.push_str(frac);
        } else {
            out.push_str("0.");
            out.extend(core::iter::repeat_n('0', scale - digits.len()));
            out.push_str(digits);
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_text())
    }
}

impl FromStr for Decimal {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_text(s.as_bytes())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Decimal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Decimal {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
