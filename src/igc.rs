//! IGC track-log parsing: just the records scoring needs.
//!
//! `HFDTE` headers carry the flight date, `B` records the fixes. Fix
//! times only have hour/minute/second resolution, so a flight crossing
//! UTC midnight shows times jumping backwards; the parser advances the
//! date when that happens. Everything else in the file is ignored.

use crate::error::{Result, ScoreError};
use crate::models::{Coordinates, Fix};
use std::io::BufRead;
use time::{Date, Month};

/// Parse every fix from an IGC file, in file order.
pub fn parse_igc<R: BufRead>(reader: R) -> Result<Vec<Fix>> {
    let mut midnight: Option<i64> = None;
    let mut last_time = i64::MIN;
    let mut fixes = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let record = line.trim_end();
        if let Some(rest) = record.strip_prefix("HFDTE") {
            let date = parse_date(rest)?;
            midnight = Some(date.midnight().assume_utc().unix_timestamp());
        } else if record.starts_with('B') {
            let midnight = midnight.ok_or_else(|| {
                ScoreError::Igc("B record before the HFDTE date header".to_string())
            })?;
            let (seconds, coordinates) = parse_b_record(record)?;

            let mut time = midnight + seconds;
            // Midnight rollover: the clock wrapped but the date header
            // did not change.
            while time < last_time {
                time += 86_400;
            }
            last_time = time;
            fixes.push(Fix::new(coordinates, time));
        }
    }

    Ok(fixes)
}

/// `DDMMYY`, optionally in the long `DATE:DDMMYY,nn` form.
fn parse_date(rest: &str) -> Result<Date> {
    let digits = rest.strip_prefix("DATE:").unwrap_or(rest);
    if digits.len() < 6 || !digits.as_bytes()[..6].iter().all(u8::is_ascii_digit) {
        return Err(ScoreError::Igc(format!("bad date header: HFDTE{}", rest)));
    }
    let day: u8 = parse_field(&digits[0..2], "date day")?;
    let month: u8 = parse_field(&digits[2..4], "date month")?;
    let year: i32 = parse_field(&digits[4..6], "date year")?;
    // Two-digit years: GPS flight logging does not predate the 1970s
    let year = if year < 70 { 2000 + year } else { 1900 + year };

    let month = Month::try_from(month)
        .map_err(|_| ScoreError::Igc(format!("bad month in date header: HFDTE{}", rest)))?;
    Date::from_calendar_date(year, month, day)
        .map_err(|_| ScoreError::Igc(format!("bad date header: HFDTE{}", rest)))
}

/// `B HHMMSS DDMMmmm[NS] DDDMMmmm[EW] V PPPPP GGGGG ...`; returns the
/// seconds since midnight and the position (GPS altitude as elevation).
fn parse_b_record(record: &str) -> Result<(i64, Coordinates)> {
    if record.len() < 35 || !record.is_ascii() {
        return Err(ScoreError::Igc(format!("short B record: {}", record)));
    }

    let hour: i64 = parse_field(&record[1..3], "hour")?;
    let minute: i64 = parse_field(&record[3..5], "minute")?;
    let second: i64 = parse_field(&record[5..7], "second")?;
    if hour > 23 || minute > 59 || second > 59 {
        return Err(ScoreError::Igc(format!("bad time in B record: {}", record)));
    }
    let seconds = hour * 3600 + minute * 60 + second;

    let lat_deg: f64 = parse_field(&record[7..9], "latitude degrees")?;
    let lat_thousandths: f64 = parse_field(&record[9..14], "latitude minutes")?;
    let mut lat = lat_deg + lat_thousandths / 60_000.0;
    match &record[14..15] {
        "N" => {}
        "S" => lat = -lat,
        other => {
            return Err(ScoreError::Igc(format!("bad latitude hemisphere: {}", other)));
        }
    }

    let lng_deg: f64 = parse_field(&record[15..18], "longitude degrees")?;
    let lng_thousandths: f64 = parse_field(&record[18..23], "longitude minutes")?;
    let mut lng = lng_deg + lng_thousandths / 60_000.0;
    match &record[23..24] {
        "E" => {}
        "W" => lng = -lng,
        other => {
            return Err(ScoreError::Igc(format!(
                "bad longitude hemisphere: {}",
                other
            )));
        }
    }

    let gps_altitude: f64 = parse_field(&record[30..35], "GPS altitude")?;

    let coordinates = Coordinates::new(lat, lng, gps_altitude).map_err(ScoreError::Igc)?;
    Ok((seconds, coordinates))
}

fn parse_field<T: std::str::FromStr>(s: &str, what: &str) -> Result<T> {
    s.trim()
        .parse()
        .map_err(|_| ScoreError::Igc(format!("bad {}: {:?}", what, s)))
}
