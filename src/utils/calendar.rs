//! Calendar conversions shared by the field synthesis and sun-compass paths.
//!
//! Years passed to [`julian_day`] follow the historical convention: there is no
//! year zero and 1 BCE is year -1. Dates before 1582-10-15 use the Julian
//! calendar, later dates the Gregorian calendar.
use crate::error::{GeomagError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// 1582-10-15 encoded as `day + 31 * (month + 12 * year)`
const GREGORIAN_CUTOVER: i64 = 15 + 31 * (10 + 12 * 1582);

/// Julian day number of the day before 0001-01-01 in the proleptic Gregorian calendar
const CE_EPOCH_JULIAN_DAY: i64 = 1_721_425;

/// Days dropped from October 1582 by the Gregorian reform
const REFORM_GAP: std::ops::RangeInclusive<u32> = 5..=14;

/// Julian day number of a calendar date (the Julian day beginning at noon of that date).
///
/// # Errors
/// Will return `Err` for year zero, an invalid month or day, or one of the days removed
/// from October 1582 by the Gregorian reform.
pub fn julian_day(month: u32, day: u32, year: i32) -> Result<i64> {
    if year == 0 {
        Err(GeomagError::InvalidCalendar(
            "year zero does not exist in the historical calendar".to_string(),
        ))?
    }
    if !(1..=12).contains(&month) {
        Err(GeomagError::InvalidCalendar(format!("invalid month {month}")))?
    }
    if day == 0 || day > days_in_month(month, year) {
        Err(GeomagError::InvalidCalendar(format!(
            "invalid day {day} for month {month} of year {year}"
        )))?
    }
    if year == 1582 && month == 10 && REFORM_GAP.contains(&day) {
        Err(GeomagError::InvalidCalendar(format!(
            "1582-10-{day:02} was removed by the Gregorian reform"
        )))?
    }

    let year = astronomical_year(year);
    let (julian_year, julian_month) = if month > 2 {
        (year, i64::from(month) + 1)
    } else {
        (year - 1, i64::from(month) + 13)
    };

    let mut jd = (365.25 * julian_year as f64) as i64
        + (30.6001 * julian_month as f64) as i64
        + i64::from(day)
        + 1_720_995;

    if i64::from(day) + 31 * (i64::from(month) + 12 * year) >= GREGORIAN_CUTOVER {
        let century = (0.01 * julian_year as f64) as i64;
        jd += 2 - century + (0.25 * century as f64) as i64;
    }
    Ok(jd)
}

/// Julian day number of a chrono date.
///
/// chrono labels every date in the proleptic Gregorian calendar, so the day is counted
/// directly rather than passed through [`julian_day`], which reads dates before the 1582
/// reform as Julian.
pub fn julian_day_of(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) + CE_EPOCH_JULIAN_DAY
}

/// Maps a timestamp to its decimal year: the year plus the elapsed fraction of that year,
/// measured in seconds so leap years are handled by the calendar itself.
///
/// # Errors
/// Will return `Err` if the year lies at the edge of the representable chrono range.
pub fn year_fraction(datetime: &NaiveDateTime) -> Result<f64> {
    let year = datetime.year();
    let start = start_of_year(year)?;
    let next = start_of_year(year + 1)?;

    let elapsed = (*datetime - start).num_nanoseconds();
    let duration = (next - start).num_nanoseconds();
    match (elapsed, duration) {
        (Some(elapsed), Some(duration)) => Ok(f64::from(year) + elapsed as f64 / duration as f64),
        _ => Err(GeomagError::InvalidCalendar(format!(
            "year {year} is too long to measure in nanoseconds"
        ))),
    }
}

/// Parses a `YYYY:MM:DD:HH:MM` timestamp.
///
/// # Errors
/// Will return `Err` if the string is not a valid timestamp in that layout.
pub fn parse_timestamp(timestamp: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(timestamp.trim(), "%Y:%m:%d:%H:%M").map_err(|e| {
        GeomagError::InvalidCalendar(format!("Unable to parse timestamp '{timestamp}': {e}"))
    })
}

fn start_of_year(year: i32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| GeomagError::InvalidCalendar(format!("year {year} is out of range")))
}

/// Historical year to astronomical year (1 BCE becomes 0)
fn astronomical_year(year: i32) -> i64 {
    if year < 0 {
        i64::from(year) + 1
    } else {
        i64::from(year)
    }
}

fn days_in_month(month: u32, year: i32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// Julian rule before 1583, Gregorian rule after
fn is_leap_year(year: i32) -> bool {
    let year = astronomical_year(year);
    if year <= 1582 {
        year.rem_euclid(4) == 0
    } else {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn julian_day_reference_dates() {
        assert_eq!(julian_day(1, 1, 2000).unwrap(), 2_451_545);
        assert_eq!(julian_day(1, 1, 1900).unwrap(), 2_415_021);
        assert_eq!(julian_day(7, 20, 1969).unwrap(), 2_440_423);
    }

    #[test]
    fn gregorian_cutover_is_contiguous() {
        assert_eq!(julian_day(10, 4, 1582).unwrap(), 2_299_160);
        assert_eq!(julian_day(10, 15, 1582).unwrap(), 2_299_161);
        for day in 5..=14 {
            assert!(julian_day(10, day, 1582).is_err());
        }
    }

    #[test]
    fn consecutive_days_are_consecutive() {
        let mut previous = julian_day(12, 31, 1899).unwrap();
        for (month, last) in [(1, 31), (2, 28), (3, 31)] {
            for day in 1..=last {
                let jd = julian_day(month, day, 1900).unwrap();
                assert_eq!(jd, previous + 1);
                previous = jd;
            }
        }
        assert_eq!(
            julian_day(1, 1, 1).unwrap(),
            julian_day(12, 31, -1).unwrap() + 1
        );
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(matches!(
            julian_day(1, 1, 0),
            Err(GeomagError::InvalidCalendar(_))
        ));
        assert!(julian_day(13, 1, 2000).is_err());
        assert!(julian_day(4, 31, 2000).is_err());
        assert!(julian_day(2, 29, 1900).is_err());
        assert!(julian_day(2, 29, 1500).is_ok());
        assert!(julian_day(2, 29, 2000).is_ok());
    }

    #[test]
    fn chrono_dates_are_proleptic_gregorian() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(julian_day_of(date(2018, 6, 21)), julian_day(6, 21, 2018).unwrap());
        assert_eq!(julian_day_of(date(1582, 10, 15)), 2_299_161);
        // Removed from the historical calendar, but ordinary days to chrono
        assert_eq!(julian_day_of(date(1582, 10, 10)), 2_299_156);
        assert_eq!(julian_day_of(date(1582, 10, 4)), julian_day(9, 24, 1582).unwrap());
        assert_eq!(julian_day_of(date(0, 3, 1)), julian_day(3, 3, -1).unwrap());

        let mut day = date(1582, 9, 1);
        for _ in 0..90 {
            let next = day.succ_opt().unwrap();
            assert_eq!(julian_day_of(next), julian_day_of(day) + 1);
            day = next;
        }
    }

    #[test]
    fn year_fraction_starts_on_the_year() {
        assert_eq!(year_fraction(&datetime(2015, 1, 1, 0, 0, 0)).unwrap(), 2015.0);
        assert_eq!(year_fraction(&datetime(-500, 1, 1, 0, 0, 0)).unwrap(), -500.0);
    }

    #[test]
    fn year_fraction_approaches_next_year() {
        let last = NaiveDate::from_ymd_opt(2016, 12, 31)
            .unwrap()
            .and_hms_nano_opt(23, 59, 59, 999_000_000)
            .unwrap();
        let fraction = year_fraction(&last).unwrap();
        assert!(fraction < 2017.0);
        assert!(2017.0 - fraction < 1e-10);
    }

    #[test]
    fn year_fraction_counts_leap_days() {
        // Midyear falls at July 2nd 00:00 in a leap year and at noon in a common year
        assert_eq!(year_fraction(&datetime(2016, 7, 2, 0, 0, 0)).unwrap(), 2016.5);
        let common = year_fraction(&datetime(2015, 7, 2, 12, 0, 0)).unwrap();
        assert_eq!(common, 2015.5);
    }

    #[test]
    fn parses_colon_separated_timestamps() {
        let parsed = parse_timestamp("2018:06:21:12:00").unwrap();
        assert_eq!(parsed, datetime(2018, 6, 21, 12, 0, 0));
        assert!(parse_timestamp("2018-06-21 12:00").is_err());
        assert!(parse_timestamp("2018:13:21:12:00").is_err());
    }
}
