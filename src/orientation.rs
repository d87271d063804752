//! Applying declination estimates to field orientation readings of drill cores.
//!
//! Core strikes come from either a sun compass (already relative to true north) or a
//! magnetic compass, which must be rotated by the local declination.
use std::fmt;
use tracing::warn;

/// Largest disagreement in degrees tolerated between a model declination and one found by
/// comparing sun and magnetic compass readings
pub const DECLINATION_TOLERANCE: f64 = 5.0;

/// Maps a declination in [0, 360) onto (-180, 180].
pub fn signed_declination(declination: f64) -> f64 {
    if declination > 180.0 {
        declination - 360.0
    } else {
        declination
    }
}

/// The local declination in (-180, 180] implied by a sun and a magnetic compass reading of
/// the same core.
pub fn compass_declination(sun_core_strike: f64, magnetic_core_strike: f64) -> f64 {
    signed_declination((sun_core_strike - magnetic_core_strike).rem_euclid(360.0))
}

/// Whether a model declination and a compass-derived one agree within
/// `DECLINATION_TOLERANCE`, measured the short way round the circle. Disagreement is logged.
pub fn declinations_agree(model_declination: f64, compass_declination: f64) -> bool {
    let difference =
        signed_declination((model_declination - compass_declination).rem_euclid(360.0)).abs();
    if difference > DECLINATION_TOLERANCE {
        warn!(
            model_declination,
            compass_declination,
            "model and compass declinations differ by more than {DECLINATION_TOLERANCE} degrees"
        );
        false
    } else {
        true
    }
}

/// Which compass a core strike came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrientationSource {
    SunCompass,
    /// Magnetic compass reading rotated by the model declination
    MagneticCompass,
}

impl OrientationSource {
    /// Sample comment recording how the core was oriented
    pub fn comment(&self) -> &'static str {
        match self {
            OrientationSource::SunCompass => "sun compass orientation",
            OrientationSource::MagneticCompass => "mag compass orientation (IGRF corrected)",
        }
    }
}

impl fmt::Display for OrientationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.comment())
    }
}

/// Field method code for a site whose cores were oriented by `sources`: `SO-SUN` or
/// `SO-MAG` when every core used the same compass, `SO-SM` for a mix.
pub fn site_orientation_code<I>(sources: I) -> &'static str
where
    I: IntoIterator<Item = OrientationSource>,
{
    let (mut sun, mut magnetic) = (false, false);
    for source in sources {
        match source {
            OrientationSource::SunCompass => sun = true,
            OrientationSource::MagneticCompass => magnetic = true,
        }
    }
    match (sun, magnetic) {
        (true, false) => "SO-SUN",
        (false, true) => "SO-MAG",
        _ => "SO-SM",
    }
}

/// True-north strike of a core and the compass it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreOrientation {
    /// Degrees in [0, 360)
    pub strike: f64,
    pub source: OrientationSource,
}

/// Picks the core strike to use: the sun-compass strike when there is one, otherwise the
/// magnetic strike rotated by `local_declination`. `None` when neither reading exists.
pub fn resolve_core_strike(
    sun_core_strike: Option<f64>,
    magnetic_core_strike: Option<f64>,
    local_declination: f64,
) -> Option<CoreOrientation> {
    match (sun_core_strike, magnetic_core_strike) {
        (Some(strike), _) => Some(CoreOrientation {
            strike: normalize(strike),
            source: OrientationSource::SunCompass,
        }),
        (None, Some(strike)) => Some(CoreOrientation {
            strike: normalize(strike + local_declination),
            source: OrientationSource::MagneticCompass,
        }),
        (None, None) => None,
    }
}

/// Bedding strike measured by magnetic compass, rotated onto true north.
pub fn correct_bedding_strike(bedding_strike: f64, local_declination: f64) -> f64 {
    normalize(bedding_strike + local_declination)
}

fn normalize(angle: f64) -> f64 {
    let angle = angle.rem_euclid(360.0);
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}
