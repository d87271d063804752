/// Reference radius of the spherical-harmonic field models, km
pub const RADIUS_EARTH: f64 = 6371.2;

pub(crate) const EQUATORIAL_RADIUS_SQ: f64 = 40_680_925.0; // km^2, reference ellipsoid
pub(crate) const POLAR_RADIUS_SQ: f64 = 40_408_585.0; // km^2, reference ellipsoid

pub(crate) const SECONDS_PER_HOUR: f64 = 3600.0;
pub(crate) const HOURS_PER_DAY: f64 = 24.0;
pub(crate) const MINUTES_PER_DAY: f64 = 1440.0;

pub(crate) const J2000_JULIAN_DAY: f64 = 2_451_545.0;
