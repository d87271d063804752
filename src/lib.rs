//! Geomagnetic field and sun-compass declinations for orienting field samples.
//!
//! The field is synthesized from spherical-harmonic models: IGRF from 1900 onwards and
//! paleosecular-variation models back to 8000 BCE, held by a [`CoefficientStore`].
use crate::error::Result;
use crate::field::direction::{to_direction, Direction};
use crate::field::synthesis::{magnetic_components, QueryPoint};
use crate::models::store::{default_store, CoefficientStore, ModelFamily};
use crate::sun::compass::{declination_from_sun, SunCompassObservation};
use crate::utils::calendar::parse_timestamp;
use rayon::prelude::*;

pub mod error;
pub mod field;
pub mod models;
pub mod orientation;
pub mod sun;
pub mod utils;

#[cfg(feature = "python")]
mod python;

/// Declination, inclination and intensity (nT) of the field at a point, from the embedded
/// coefficient tables. Longitude may be given in -180..180 or 0..360 degrees east.
///
/// # Errors
/// Will return `Err` if the embedded tables do not cover `decimal_year`.
pub fn geomagnetic_field(
    decimal_year: f64,
    altitude_km: f64,
    latitude: f64,
    longitude: f64,
) -> Result<Direction> {
    geomagnetic_field_with(
        default_store()?,
        &QueryPoint::new(decimal_year, altitude_km, latitude, longitude),
        None,
    )
}

/// Field direction at `point` using the tables in `store`, optionally forcing the
/// historical model family with `hint`.
///
/// # Errors
/// Will return `Err` if `store` cannot supply coefficients for the date.
pub fn geomagnetic_field_with(
    store: &CoefficientStore,
    point: &QueryPoint,
    hint: Option<ModelFamily>,
) -> Result<Direction> {
    let components = magnetic_components(store, point, hint)?;
    to_direction(&components.as_vector())
}

/// Evaluates many query points in parallel, one result per point in input order.
pub fn par_geomagnetic_field(
    store: &CoefficientStore,
    points: &[QueryPoint],
    hint: Option<ModelFamily>,
) -> Vec<Result<Direction>> {
    points
        .par_iter()
        .map(|point| geomagnetic_field_with(store, point, hint))
        .collect()
}

/// True-north declination of a bearing taken against the sun's shadow.
///
/// `timestamp` is local time as `YYYY:MM:DD:HH:MM`, `utc_offset_hours` how far that clock
/// is ahead of UTC, and latitude/longitude are signed degrees (negative south and west).
///
/// # Errors
/// Will return `Err` if the timestamp is malformed or the sun is at the zenith or nadir.
pub fn sun_compass_declination(
    timestamp: &str,
    utc_offset_hours: f64,
    latitude: f64,
    longitude: f64,
    shadow_angle: f64,
) -> Result<f64> {
    declination_from_sun(&SunCompassObservation {
        local_time: parse_timestamp(timestamp)?,
        utc_offset_hours,
        latitude,
        longitude,
        shadow_angle,
    })
}
