use crate::models::store::ModelFamily;
use thiserror::Error;

/// Enum of the possible error variants that may be encountered
#[derive(Error, Debug)]
pub enum GeomagError {
    /// Requested date falls before the oldest supported field model
    #[error("date {0} is too old for any supported field model")]
    OutOfRange(f64),

    /// Field vector of zero length, which has no direction
    #[error("field vector has zero intensity and no direction")]
    DegenerateVector,

    /// Calendar date or timestamp that cannot be mapped to a Julian day
    #[error("{0}")]
    InvalidCalendar(String),

    /// Sun too close to the zenith to resolve an azimuth
    #[error("sun is too close to the zenith to resolve an azimuth")]
    SunNearZenith,

    /// Sun too close to the nadir to resolve an azimuth
    #[error("sun is too close to the nadir to resolve an azimuth")]
    SunNearNadir,

    /// No coefficient table loaded for the selected model family
    #[error("no coefficient table loaded for the {0} model")]
    MissingModel(ModelFamily),

    /// The model family's table does not cover the required epoch
    #[error("the {family} model has no coefficients for epoch {epoch}")]
    MissingEpoch { family: ModelFamily, epoch: f64 },

    /// Extrapolation requested from a table without published secular variation
    #[error("the {0} model has no secular variation coefficients to extrapolate with")]
    MissingSecularVariation(ModelFamily),

    /// Malformed coefficient table
    #[error("{0}")]
    InvalidTable(String),

    /// Unable to read a coefficient table from disk
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GeomagError>;

#[cfg(feature = "python")]
impl From<GeomagError> for pyo3::PyErr {
    fn from(value: GeomagError) -> Self {
        let msg = value.to_string();
        pyo3::exceptions::PyValueError::new_err(msg)
    }
}
