//! Low-precision solar coordinates, good to about 0.01 degrees between 1950 and 2050.
use crate::utils::constants::{J2000_JULIAN_DAY, MINUTES_PER_DAY};

/// Where the sun is at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Greenwich hour angle in degrees, [0, 360)
    pub greenwich_hour_angle: f64,
    /// Solar declination in degrees
    pub declination: f64,
}

/// Solar position at `day_fraction` (UTC) of the day with Julian day number `julian_day`.
pub fn solar_position(julian_day: i64, day_fraction: f64) -> SolarPosition {
    let d = julian_day as f64 - J2000_JULIAN_DAY + day_fraction;

    // Mean longitude and mean anomaly
    let mean_longitude = (280.460 + 0.985_647_4 * d).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * d).rem_euclid(360.0).to_radians();

    let ecliptic_longitude = mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin();
    let obliquity = (23.439 - 0.000_000_4 * d).to_radians();

    let lambda = ecliptic_longitude.to_radians();
    let t = (obliquity / 2.0).tan().powi(2);
    let right_ascension = ecliptic_longitude - t * (2.0 * lambda).sin().to_degrees()
        + (t * t / 2.0) * (4.0 * lambda).sin().to_degrees();
    let declination = (obliquity.sin() * lambda.sin()).asin().to_degrees();

    let equation_of_time = mean_longitude - right_ascension;
    let greenwich_hour_angle =
        (day_fraction * MINUTES_PER_DAY / 4.0 + equation_of_time + 180.0).rem_euclid(360.0);

    SolarPosition {
        greenwich_hour_angle,
        declination,
    }
}
