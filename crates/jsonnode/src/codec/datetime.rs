use core::{fmt, str::FromStr};

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike};

use super::{FromJsonText, ToJsonText, trim_xml_whitespace};
use crate::ConvertError;

const NANOS_PER_TICK: u32 = 100;
const MAX_OFFSET_MINUTES: i16 = 14 * 60;

/// How a [`DateTime`] relates to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DateTimeKind {
    /// No zone designator.
    Unspecified,
    /// A trailing `Z`.
    Utc,
    /// A `±hh:mm` designator, in minutes east of UTC.
    Offset(i16),
}

/// A calendar date and time of day with 100 ns resolution, years 1 to 9999.
///
/// The text form is `yyyy-MM-ddTHH:mm:ss[.fffffff][Z|±hh:mm]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    local: NaiveDateTime,
    kind: DateTimeKind,
}

impl DateTime {
    /// Sub-tick nanoseconds are truncated. Returns `None` for years outside
    /// 1..=9999, leap seconds and offsets beyond ±14:00.
    #[must_use]
    pub fn new(local: NaiveDateTime, kind: DateTimeKind) -> Option<Self> {
        if !(1..=9999).contains(&local.year()) || local.nanosecond() >= 1_000_000_000 {
            return None;
        }
        if let DateTimeKind::Offset(minutes) = kind {
            if minutes.abs() > MAX_OFFSET_MINUTES {
                return None;
            }
        }
        let nanos = local.nanosecond() / NANOS_PER_TICK * NANOS_PER_TICK;
        Some(Self {
            local: local.with_nanosecond(nanos)?,
            kind,
        })
    }

    /// The wall clock time as written.
    #[must_use]
    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    /// How the value relates to UTC.
    #[must_use]
    pub fn kind(&self) -> DateTimeKind {
        self.kind
    }

    /// The instant this value denotes, when it carries a zone designator.
    #[must_use]
    pub fn to_fixed_offset(&self) -> Option<chrono::DateTime<FixedOffset>> {
        let offset = match self.kind {
            DateTimeKind::Unspecified => return None,
            DateTimeKind::Utc => FixedOffset::east_opt(0)?,
            DateTimeKind::Offset(minutes) => FixedOffset::east_opt(i32::from(minutes) * 60)?,
        };
        offset.from_local_datetime(&self.local).single()
    }
}

struct Cursor<'a> {
    text: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn digits(&mut self, n: usize) -> Option<u32> {
        let chunk = self.text.get(self.pos..self.pos + n)?;
        let mut acc = 0u32;
        for &b in chunk {
            if !b.is_ascii_digit() {
                return None;
            }
            acc = acc * 10 + u32::from(b - b'0');
        }
        self.pos += n;
        Some(acc)
    }

    fn expect(&mut self, b: u8) -> Option<()> {
        (self.text.get(self.pos) == Some(&b)).then(|| self.pos += 1)
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }
}

fn parse(text: &[u8]) -> Option<(NaiveDateTime, DateTimeKind)> {
    let mut c = Cursor { text, pos: 0 };
    let year = c.digits(4)?;
    c.expect(b'-')?;
    let month = c.digits(2)?;
    c.expect(b'-')?;
    let day = c.digits(2)?;
    c.expect(b'T')?;
    let hour = c.digits(2)?;
    c.expect(b':')?;
    let minute = c.digits(2)?;
    c.expect(b':')?;
    let second = c.digits(2)?;

    let mut ticks = 0u32;
    if c.peek() == Some(b'.') {
        c.pos += 1;
        let start = c.pos;
        while c.peek().is_some_and(|b| b.is_ascii_digit()) && c.pos - start < 7 {
            ticks = ticks * 10 + u32::from(text[c.pos] - b'0');
            c.pos += 1;
        }
        let len = c.pos - start;
        if len == 0 {
            return None;
        }
        ticks *= 10u32.pow(u32::try_from(7 - len).ok()?);
    }

    let kind = match c.peek() {
        None => DateTimeKind::Unspecified,
        Some(b'Z') => {
            c.pos += 1;
            DateTimeKind::Utc
        }
        Some(sign @ (b'+' | b'-')) => {
            c.pos += 1;
            let hours = c.digits(2)?;
            c.expect(b':')?;
            let minutes = c.digits(2)?;
            if minutes >= 60 {
                return None;
            }
            let total = i16::try_from(hours * 60 + minutes).ok()?;
            DateTimeKind::Offset(if sign == b'-' { -total } else { total })
        }
        Some(_) => return None,
    };
    if c.pos != text.len() {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    let local = date.and_hms_nano_opt(hour, minute, second, ticks * NANOS_PER_TICK)?;
    Some((local, kind))
}

impl FromJsonText for DateTime {
    const TARGET: &'static str = "date time";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        parse(trim_xml_whitespace(text))
            .and_then(|(local, kind)| DateTime::new(local, kind))
            .ok_or_else(|| ConvertError::invalid(Self::TARGET, text))
    }
}

impl ToJsonText for DateTime {
    fn append_json_text(&self, out: &mut String) {
        use core::fmt::Write as _;

        let l = &self.local;
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            l.year(),
            l.month(),
            l.day(),
            l.hour(),
            l.minute(),
            l.second()
        );
        let ticks = l.nanosecond() / NANOS_PER_TICK;
        if ticks != 0 {
            let mut fraction = [b'0'; 7];
            let mut rest = ticks;
            for slot in fraction.iter_mut().rev() {
                *slot = b'0' + u8::try_from(rest % 10).unwrap_or(0);
                rest /= 10;
            }
            let len = fraction.iter().rposition(|&b| b != b'0').map_or(0, |i| i + 1);
            out.push('.');
            out.extend(fraction[..len].iter().map(|&b| char::from(b)));
        }
        match self.kind {
            DateTimeKind::Unspecified => {}
            DateTimeKind::Utc => out.push('Z'),
            DateTimeKind::Offset(minutes) => {
                let sign = if minutes < 0 { '-' } else { '+' };
                let minutes = minutes.unsigned_abs();
                let _ = write!(out, "{sign}{:02}:{:02}", minutes / 60, minutes % 60);
            }
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_text())
    }
}

impl FromStr for DateTime {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_text(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("2024-02-29T13:45:00")]
    #[case("0001-01-01T00:00:00Z")]
    #[case("9999-12-31T23:59:59.9999999Z")]
    #[case("2010-06-15T08:00:00.5+05:30")]
    #[case("2010-06-15T08:00:00.0000001-14:00")]
    fn canonical_text_roundtrips(#[case] text: &str) {
        let value: DateTime = text.parse().unwrap();
        assert_eq!(value.to_json_text(), text);
    }

    #[test]
    fn fraction_is_trimmed_and_truncated() {
        let value: DateTime = "2020-01-01T00:00:00.1200000".parse().unwrap();
        assert_eq!(value.to_json_text(), "2020-01-01T00:00:00.12");
        assert_eq!(value.local().nanosecond(), 120_000_000);
        assert!("2020-01-01T00:00:00.12345678".parse::<DateTime>().is_err());
    }

    #[rstest]
    #[case("2023-02-29T00:00:00")]
    #[case("2020-13-01T00:00:00")]
    #[case("2020-01-01T24:00:00")]
    #[case("2020-01-01T00:00:60")]
    #[case("2020-01-01 00:00:00")]
    #[case("2020-01-01T00:00:00.")]
    #[case("2020-01-01T00:00:00+15:00")]
    #[case("2020-01-01T00:00:00+01:60")]
    #[case("2020-01-01T00:00:00Zjunk")]
    #[case("0000-01-01T00:00:00")]
    #[case("20-01-01T00:00:00")]
    fn malformed_or_out_of_range(#[case] text: &str) {
        assert!(matches!(
            text.parse::<DateTime>(),
            Err(ConvertError::Invalid { .. })
        ));
    }

    #[test]
    fn offsets_resolve_to_instants() {
        let value: DateTime = "2010-06-15T08:00:00+02:00".parse().unwrap();
        let instant = value.to_fixed_offset().unwrap();
        assert_eq!(instant.naive_utc().hour(), 6);
        let unspecified: DateTime = "2010-06-15T08:00:00".parse().unwrap();
        assert!(unspecified.to_fixed_offset().is_none());
    }

    #[quickcheck]
    fn roundtrip(days: u32, seconds: u32, ticks: u32, kind: u8, offset: i16) -> bool {
        let Some(date) = NaiveDate::from_num_days_from_ce_opt(
            i32::try_from(1 + days % 3_652_058).unwrap_or(1),
        ) else {
            return true;
        };
        let Some(local) = date.and_hms_nano_opt(
            seconds % 86_400 / 3600,
            seconds % 3600 / 60,
            seconds % 60,
            ticks % 10_000_000 * NANOS_PER_TICK,
        ) else {
            return true;
        };
        let kind = match kind % 3 {
            0 => DateTimeKind::Unspecified,
            1 => DateTimeKind::Utc,
            _ => DateTimeKind::Offset(offset % (MAX_OFFSET_MINUTES + 1)),
        };
        let Some(value) = DateTime::new(local, kind) else {
            return true;
        };
        value.to_json_text().parse::<DateTime>().unwrap() == value
    }
}
