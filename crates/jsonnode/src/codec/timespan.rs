use core::{fmt, str::FromStr};

use super::{FromJsonText, ToJsonText, trim_xml_whitespace};
use crate::ConvertError;

const TICKS_PER_SECOND: u64 = 10_000_000;
const TICKS_PER_MINUTE: u64 = TICKS_PER_SECOND * 60;
const TICKS_PER_HOUR: u64 = TICKS_PER_MINUTE * 60;
const TICKS_PER_DAY: u64 = TICKS_PER_HOUR * 24;

/// A signed duration counted in 100 ns ticks.
///
/// The text form is an ISO 8601 duration, `[-]P[nD][T[nH][nM][n[.fffffff]S]]`,
/// with `PT0S` for zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSpan(i64);

impl TimeSpan {
    /// The empty duration, `PT0S`.
    pub const ZERO: TimeSpan = TimeSpan(0);

    /// A duration of `ticks` 100 ns intervals.
    #[must_use]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// The duration in 100 ns intervals.
    #[must_use]
    pub const fn ticks(self) -> i64 {
        self.0
    }
}

impl From<TimeSpan> for chrono::TimeDelta {
    fn from(span: TimeSpan) -> Self {
        chrono::TimeDelta::microseconds(span.0 / 10)
            + chrono::TimeDelta::nanoseconds(span.0 % 10 * 100)
    }
}

impl ToJsonText for TimeSpan {
    fn append_json_text(&self, out: &mut String) {
        let mut itoa = itoa::Buffer::new();
        if self.0 < 0 {
            out.push('-');
        }
        out.push('P');
        let mut rest = self.0.unsigned_abs();
        if rest == 0 {
            out.push_str("T0S");
            return;
        }
        let days = rest / TICKS_PER_DAY;
        rest %= TICKS_PER_DAY;
        if days > 0 {
            out.push_str(itoa.format(days));
            out.push('D');
        }
        if rest == 0 {
            return;
        }
        out.push('T');
        let hours = rest / TICKS_PER_HOUR;
        rest %= TICKS_PER_HOUR;
        let minutes = rest / TICKS_PER_MINUTE;
        rest %= TICKS_PER_MINUTE;
        if hours > 0 {
            out.push_str(itoa.format(hours));
            out.push('H');
        }
        if minutes > 0 {
            out.push_str(itoa.format(minutes));
            out.push('M');
        }
        if rest > 0 {
            out.push_str(itoa.format(rest / TICKS_PER_SECOND));
            let fraction = rest % TICKS_PER_SECOND;
            if fraction > 0 {
                let digits = format!("{fraction:07}");
                out.push('.');
                out.push_str(digits.trim_end_matches('0'));
            }
            out.push('S');
        }
    }
}

/// Where in `P..D T..H ..M ..S` the parser is.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Designator {
    Start,
    Days,
    Time,
    Hours,
    Minutes,
    Seconds,
}

fn parse(text: &[u8]) -> Result<i64, bool> {
    // Err(false) = malformed, Err(true) = overflow
    let (negative, body) = match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, text),
    };
    let body = body.strip_prefix(b"P").ok_or(false)?;

    let mut total: u64 = 0;
    let mut last = Designator::Start;
    let mut saw_component = false;
    let mut i = 0;
    while i < body.len() {
        if body[i] == b'T' {
            if last >= Designator::Time {
                return Err(false);
            }
            last = Designator::Time;
            i += 1;
            continue;
        }

        let start = i;
        let mut value: u64 = 0;
        while i < body.len() && body[i].is_ascii_digit() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(body[i] - b'0')))
                .ok_or(true)?;
            i += 1;
        }
        if i == start {
            return Err(false);
        }
        let mut fraction = 0u64;
        if body.get(i) == Some(&b'.') {
            i += 1;
            let frac_start = i;
            while i < body.len() && body[i].is_ascii_digit() {
                if i - frac_start < 7 {
                    fraction = fraction * 10 + u64::from(body[i] - b'0');
                }
                i += 1;
            }
            let len = i - frac_start;
            if len == 0 || body.get(i) != Some(&b'S') {
                return Err(false);
            }
            fraction *= 10u64.pow(u32::try_from(7usize.saturating_sub(len)).map_err(|_| false)?);
        }

        let in_time = last >= Designator::Time;
        let (designator, unit) = match (body.get(i), in_time) {
            (Some(b'D'), false) => (Designator::Days, TICKS_PER_DAY),
            (Some(b'H'), true) => (Designator::Hours, TICKS_PER_HOUR),
            (Some(b'M'), true) => (Designator::Minutes, TICKS_PER_MINUTE),
            (Some(b'S'), true) => (Designator::Seconds, TICKS_PER_SECOND),
            _ => return Err(false),
        };
        if designator <= last {
            return Err(false);
        }
        last = designator;
        saw_component = true;
        i += 1;

        total = value
            .checked_mul(unit)
            .and_then(|v| v.checked_add(fraction))
            .and_then(|v| v.checked_add(total))
            .ok_or(true)?;
    }
    // "P" and "PT" name no component; "P1DT" ends in a dangling T.
    if !saw_component || last == Designator::Time {
        return Err(false);
    }

    if negative {
        0i64.checked_sub_unsigned(total).ok_or(true)
    } else {
        i64::try_from(total).map_err(|_| true)
    }
}

impl FromJsonText for TimeSpan {
    const TARGET: &'static str = "time span";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        parse(trim_xml_whitespace(text))
            .map(TimeSpan)
            .map_err(|overflow| {
                if overflow {
                    ConvertError::overflow(Self::TARGET, text)
                } else {
                    ConvertError::invalid(Self::TARGET, text)
                }
            })
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_text())
    }
}

impl FromStr for TimeSpan {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_text(s.as_bytes())
    }
}
