//! True-north bearings from sun-compass readings.
use crate::error::{GeomagError, Result};
use crate::sun::position::solar_position;
use crate::utils::calendar::julian_day_of;
use crate::utils::constants::{HOURS_PER_DAY, SECONDS_PER_HOUR};
use chrono::{Duration, NaiveDateTime, Timelike};
use std::f64::consts::FRAC_PI_2;
use tracing::debug;

/// Below this sin(zenith angle) the sun's azimuth is undefined, whether the sun stands at
/// the zenith or the nadir
const ZENITH_TOLERANCE: f64 = 1e-6;

/// A shadow bearing taken at a known local time and place
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunCompassObservation {
    /// Local clock time of the reading
    pub local_time: NaiveDateTime,
    /// Hours the local clock is ahead of UTC, negative west of Greenwich
    pub utc_offset_hours: f64,
    /// Degrees, negative south
    pub latitude: f64,
    /// Degrees, negative west
    pub longitude: f64,
    /// Bearing of the target measured from the sun's shadow, degrees
    pub shadow_angle: f64,
}

impl SunCompassObservation {
    /// UTC time of the reading.
    ///
    /// # Errors
    /// Will return `Err` if the offset moves the time outside the chrono range.
    pub fn utc_time(&self) -> Result<NaiveDateTime> {
        let offset = Duration::seconds((self.utc_offset_hours * SECONDS_PER_HOUR).round() as i64);
        self.local_time.checked_sub_signed(offset).ok_or_else(|| {
            GeomagError::InvalidCalendar(format!(
                "UTC offset {} cannot be applied to {}",
                self.utc_offset_hours, self.local_time
            ))
        })
    }
}

/// Declination in [0, 360) of the target bearing in `observation`, found from the sun's
/// azimuth at the time and place of the reading.
///
/// # Errors
/// Will return `Err` if the UTC offset leaves the chrono range, or if the sun is so close
/// to the zenith or the nadir that its azimuth is undefined.
pub fn declination_from_sun(observation: &SunCompassObservation) -> Result<f64> {
    let utc = observation.utc_time()?;
    let julian_day = julian_day_of(utc.date());
    let day_fraction = (f64::from(utc.hour())
        + f64::from(utc.minute()) / 60.0
        + f64::from(utc.second()) / SECONDS_PER_HOUR)
        / HOURS_PER_DAY;
    let sun = solar_position(julian_day, day_fraction);

    let hour_angle = (sun.greenwich_hour_angle + observation.longitude).rem_euclid(360.0);
    let latitude = if hour_angle > 90.0 && hour_angle < 270.0 {
        -observation.latitude
    } else {
        observation.latitude
    };

    let (lat, dec, ha) = (
        latitude.to_radians(),
        sun.declination.to_radians(),
        hour_angle.to_radians(),
    );
    let zenith =
        (lat.sin() * dec.sin() + lat.cos() * dec.cos() * ha.cos()).clamp(-1.0, 1.0).acos();
    if zenith.sin() < ZENITH_TOLERANCE {
        if zenith < FRAC_PI_2 {
            Err(GeomagError::SunNearZenith)?
        }
        Err(GeomagError::SunNearNadir)?
    }
    let mut beta = (dec.cos() * ha.sin() / zenith.sin())
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees();
    if sun.declination < latitude {
        beta = 180.0 - beta;
    }
    let azimuth = 180.0 - beta;
    debug!(
        %utc,
        julian_day,
        hour_angle,
        solar_declination = sun.declination,
        azimuth,
        "sun compass solution"
    );

    let declination = (azimuth + observation.shadow_angle).rem_euclid(360.0);
    Ok(if declination >= 360.0 { 0.0 } else { declination })
}
