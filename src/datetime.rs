//! PDF date strings (`D:YYYYMMDDHHmmSSOHH'mm'`, PDF 32000-1 §7.9.4) as
//! `chrono` timestamps, for populating and reading `/CreationDate`,
//! `/ModDate`, and similar `/Info` entries. Gated behind the `chrono`
//! feature (on by default) since it's the only part of the object model
//! that needs a calendar rather than plain bytes.
use chrono::{DateTime, Datelike, FixedOffset, Offset, TimeZone, Timelike};

use crate::{Object, StringFormat};

impl Object {
    /// Parse this string object as a PDF date, if it looks like one.
    /// Trailing fields (month day hour minute second, timezone) may be
    /// absent; absent calendar fields default to their minimum, and an
    /// absent timezone is treated as UTC.
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let bytes = self.as_str().ok()?;
        let text = std::str::from_utf8(bytes).ok()?;
        let text = text.strip_prefix("D:").unwrap_or(text);
        let digits_len = text.chars().take_while(|c| c.is_ascii_digit()).count();
        let digits = &text[..digits_len];
        if digits.len() < 4 {
            return None;
        }

        let field = |start: usize, len: usize, default: u32| -> u32 {
            digits.get(start..start + len).and_then(|s| s.parse().ok()).unwrap_or(default)
        };
        let year: i32 = digits[0..4].parse().ok()?;
        let month = if digits.len() >= 6 { field(4, 2, 1) } else { 1 }.max(1);
        let day = if digits.len() >= 8 { field(6, 2, 1) } else { 1 }.max(1);
        let hour = field(8, 2, 0);
        let minute = field(10, 2, 0);
        let second = field(12, 2, 0);

        let offset_seconds = parse_offset(&text[digits.len()..]).unwrap_or(0);
        let tz = FixedOffset::east_opt(offset_seconds)?;
        tz.with_ymd_and_hms(year, month, day, hour, minute, second).single()
    }
}

/// The trailing `O HH'mm'` of a PDF date string (a bare `Z` means UTC),
/// in seconds east of UTC.
fn parse_offset(rest: &str) -> Option<i32> {
    let mut chars = rest.chars();
    let sign = match chars.next()? {
        '+' => 1,
        '-' => -1,
        'Z' => return Some(0),
        _ => return None,
    };
    let rest: String = chars.collect();
    let hours: i32 = rest.get(0..2)?.parse().ok()?;
    let minutes: i32 = rest.get(3..5).and_then(|s| s.parse().ok()).unwrap_or(0);
    Some(sign * (hours * 3600 + minutes * 60))
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Object {
    fn from(value: DateTime<Tz>) -> Self {
        let fixed_offset = value.offset().fix();
        let value = value.with_timezone(&fixed_offset);
        let total_minutes = fixed_offset.local_minus_utc() / 60;
        let sign = if total_minutes < 0 { '-' } else { '+' };
        let total_minutes = total_minutes.abs();

        let text = format!(
            "D:{:04}{:02}{:02}{:02}{:02}{:02}{}{:02}'{:02}'",
            value.year(),
            value.month(),
            value.day(),
            value.hour(),
            value.minute(),
            value.second(),
            sign,
            total_minutes / 60,
            total_minutes % 60,
        );
        Object::String(text.into_bytes(), StringFormat::Literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn round_trips_through_pdf_date_string() {
        let now = Utc::now().with_nanosecond(0).unwrap();
        let object: Object = now.into();
        let parsed = object.as_datetime().unwrap();
        assert_eq!(parsed.timestamp(), now.timestamp());
    }

    #[test]
    fn parses_date_without_timezone_or_seconds() {
        let object = Object::string_literal(b"D:20230615".to_vec());
        let parsed = object.as_datetime().unwrap();
        assert_eq!(parsed.year(), 2023);
        assert_eq!(parsed.month(), 6);
        assert_eq!(parsed.day(), 15);
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn parses_negative_offset() {
        let object = Object::string_literal(b"D:20230615120000-05'00'".to_vec());
        let parsed = object.as_datetime().unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), -5 * 3600);
    }
}
