//! JST timestamp helpers for the radiko wire format.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};

use super::error::{RadikoError, Result};

/// Japan Standard Time (UTC+09:00), the reference of every radiko timestamp.
#[allow(clippy::expect_used)]
pub static JST: LazyLock<FixedOffset> =
    LazyLock::new(|| FixedOffset::east_opt(32_400).expect("JST offset is in range"));

/// Wire format of `ft` / `to` attributes (e.g. `20240101010000`).
const RADIKO_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Wire format of `<date>` elements and date URLs (e.g. `20240101`).
const RADIKO_DATE_FORMAT: &str = "%Y%m%d";

/// Digits in a wire timestamp.
const RADIKO_DATETIME_LEN: usize = 14;

/// Digits in a wire date.
const RADIKO_DATE_LEN: usize = 8;

/// Hour at which a radiko broadcast day begins.
const BROADCAST_DAY_START_HOUR: i64 = 5;

/// Interprets a naive JST wall-clock time.
fn at_jst(naive: NaiveDateTime, raw: &str) -> Result<DateTime<FixedOffset>> {
    naive
        .and_local_timezone(*JST)
        .single()
        .ok_or_else(|| RadikoError::decode(format!("unrepresentable JST time: {raw}"), raw))
}

/// Requires exactly `len` ASCII digits.
fn check_digits(s: &str, len: usize, context: &str) -> Result<()> {
    if s.len() == len && s.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(());
    }
    Err(RadikoError::decode(
        format!("{context}: {s}"),
        format!("expected {len} digits"),
    ))
}

/// Parses a `YYYYMMDDhhmmss` wire timestamp as JST.
///
/// # Errors
///
/// Returns `RadikoError::Decode` if the string is not a valid timestamp.
pub fn parse_radiko_datetime(s: &str) -> Result<DateTime<FixedOffset>> {
    check_digits(s, RADIKO_DATETIME_LEN, "invalid radiko datetime")?;
    let naive = NaiveDateTime::parse_from_str(s, RADIKO_DATETIME_FORMAT)
        .map_err(|e| RadikoError::decode(format!("invalid radiko datetime: {s}"), e))?;
    at_jst(naive, s)
}

/// Parses a `YYYYMMDD` wire date.
///
/// # Errors
///
/// Returns `RadikoError::Decode` if the string is not a valid date.
pub fn parse_radiko_date(s: &str) -> Result<NaiveDate> {
    check_digits(s, RADIKO_DATE_LEN, "invalid radiko date")?;
    NaiveDate::parse_from_str(s, RADIKO_DATE_FORMAT)
        .map_err(|e| RadikoError::decode(format!("invalid radiko date: {s}"), e))
}

/// Formats an instant as a `YYYYMMDDhhmmss` JST wire timestamp.
#[must_use]
pub fn to_radiko_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.with_timezone(&*JST)
        .format(RADIKO_DATETIME_FORMAT)
        .to_string()
}

/// Formats a date as `YYYYMMDD`.
#[must_use]
pub fn to_radiko_date(date: NaiveDate) -> String {
    date.format(RADIKO_DATE_FORMAT).to_string()
}

/// Parses a user-supplied JST datetime.
///
/// Accepts: `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d %H:%M:%S`, `%Y%m%d%H%M%S`.
///
/// # Errors
///
/// Returns `RadikoError::Decode` if the string does not match any known format.
pub fn parse_jst_datetime(s: &str) -> Result<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, RADIKO_DATETIME_FORMAT))
        .map_err(|e| RadikoError::decode(format!("invalid datetime format: {s}"), e))?;
    at_jst(naive, s)
}

/// Returns the radiko broadcast date containing `dt`.
///
/// Broadcast days run from 05:00 to 29:00 JST, so 01:00 on the 2nd belongs
/// to the 1st.
#[must_use]
pub fn broadcast_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> NaiveDate {
    let local = dt.with_timezone(&*JST).naive_local();
    local
        .checked_sub_signed(TimeDelta::hours(BROADCAST_DAY_START_HOUR))
        .map_or_else(|| local.date(), |shifted| shifted.date())
}
