//! Lenient date parsing for server payloads.
//!
//! Accepted:
//!   2026-03-14
//!   2026-03-14T09:30, 2026-03-14 09:30:15, 2026-03-14T09:30:15.123Z, ...+03:00
//!   14/03/2026
//!
//! Offsets are ignored; the wall-clock time is kept as reported.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2}))?)?")
            .expect("invalid iso date regex")
    })
}

fn br_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})").expect("invalid br date regex"))
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Some(caps) = iso_re().captures(s) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        let num = |i: usize| -> Option<u32> { caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok()) };
        let time = NaiveTime::from_hms_opt(num(4)?, num(5)?, num(6)?)?;
        return Some(date.and_time(time));
    }

    if let Some(caps) = br_re().captures(s) {
        let date = NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            caps[2].parse().ok()?,
            caps[1].parse().ok()?,
        )?;
        return Some(date.and_time(NaiveTime::MIN));
    }

    None
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    parse_datetime(s).map(|dt| dt.date())
}
