//! Clock-string parsing for time triggers.
//!
//! Users write times the way they say them: `8am`, `2:30pm`, or 24-hour
//! `14:00`.  Anything else is rejected; the trigger evaluator treats a
//! rejected clock string as "never fire".

use chrono::NaiveTime;

use crate::error::{CoreError, Result};

/// Parse a clock string into a time of day.
///
/// Accepted forms: `H(am|pm)`, `H:MM(am|pm)`, and 24-hour `HH:MM`.
/// `12am` maps to 00:00 and `12pm` to 12:00.
pub fn parse_clock(input: &str) -> Result<NaiveTime> {
    let invalid = || CoreError::InvalidClock {
        input: input.to_string(),
    };

    let lowered = input.trim().to_lowercase();

    if let Some(bare) = lowered
        .strip_suffix("am")
        .or_else(|| lowered.strip_suffix("pm"))
    {
        let is_pm = lowered.ends_with("pm");
        let (hour, minute) = split_hour_minute(bare.trim()).ok_or_else(invalid)?;
        if !(1..=12).contains(&hour) {
            return Err(invalid());
        }

        let hour = match (is_pm, hour) {
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, 12) => 0,
            (false, h) => h,
        };

        return NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid);
    }

    if lowered.contains(':') {
        let (hour, minute) = split_hour_minute(&lowered).ok_or_else(invalid)?;
        return NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid);
    }

    Err(invalid())
}

/// Split `H:MM` (or a bare `H`) into numeric hour and minute.
fn split_hour_minute(s: &str) -> Option<(u32, u32)> {
    match s.split_once(':') {
        Some((h, m)) => Some((h.trim().parse().ok()?, m.trim().parse().ok()?)),
        None => Some((s.trim().parse().ok()?, 0)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn parse_12_hour_forms() {
        assert_eq!(parse_clock("8am").unwrap(), hm(8, 0));
        assert_eq!(parse_clock("2:30pm").unwrap(), hm(14, 30));
        assert_eq!(parse_clock("9:05am").unwrap(), hm(9, 5));
        assert_eq!(parse_clock("11pm").unwrap(), hm(23, 0));
    }

    #[test]
    fn parse_24_hour_form() {
        assert_eq!(parse_clock("14:00").unwrap(), hm(14, 0));
        assert_eq!(parse_clock("00:15").unwrap(), hm(0, 15));
        assert_eq!(parse_clock("23:59").unwrap(), hm(23, 59));
    }

    #[test]
    fn noon_and_midnight() {
        assert_eq!(parse_clock("12am").unwrap(), hm(0, 0));
        assert_eq!(parse_clock("12pm").unwrap(), hm(12, 0));
    }

    #[test]
    fn whitespace_and_case_are_tolerated() {
        assert_eq!(parse_clock(" 8 AM ").unwrap(), hm(8, 0));
        assert_eq!(parse_clock("2:30 PM").unwrap(), hm(14, 30));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_clock("").is_err());
        assert!(parse_clock("noonish").is_err());
        assert!(parse_clock("9").is_err());
        assert!(parse_clock("25:00").is_err());
        assert!(parse_clock("13pm").is_err());
        assert!(parse_clock("0am").is_err());
        assert!(parse_clock("8:99am").is_err());
    }
}
