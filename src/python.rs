use crate::field::direction::to_directions;
use crate::field::synthesis::{magnetic_components, QueryPoint};
use crate::models::store::default_store;
use itertools::Itertools;
use nalgebra::Vector3;
use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Declination, inclination and intensity of the field at a point.
#[pyfunction]
#[pyo3(name = "geomagnetic_field")]
#[pyo3(
    text_signature = "(decimal_year: float, altitude_km: float, latitude: float, longitude: float, /)"
)]
fn geomagnetic_field_py(
    decimal_year: f64,
    altitude_km: f64,
    latitude: f64,
    longitude: f64,
) -> PyResult<(f64, f64, f64)> {
    let direction = crate::geomagnetic_field(decimal_year, altitude_km, latitude, longitude)?;
    Ok((
        direction.declination,
        direction.inclination,
        direction.intensity,
    ))
}

/// North, east, down and total field in nT at a point.
#[pyfunction]
#[pyo3(name = "magnetic_components")]
#[pyo3(
    text_signature = "(decimal_year: float, altitude_km: float, latitude: float, longitude: float, /)"
)]
fn magnetic_components_py(
    decimal_year: f64,
    altitude_km: f64,
    latitude: f64,
    longitude: f64,
) -> PyResult<(f64, f64, f64, f64)> {
    let point = QueryPoint::new(decimal_year, altitude_km, latitude, longitude);
    let components = magnetic_components(default_store()?, &point, None)?;
    Ok((
        components.north,
        components.east,
        components.down,
        components.total,
    ))
}

/// Converts an N x 3 array of north, east, down vectors into an N x 3 array of
/// declination, inclination and intensity.
#[pyfunction]
#[pyo3(name = "to_directions")]
#[pyo3(text_signature = "(vectors: numpy.ndarray, /)")]
fn to_directions_py<'py>(
    py: Python<'py>,
    vectors: PyReadonlyArray2<'py, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let vectors = vectors.as_array();
    if vectors.ncols() != 3 {
        Err(PyValueError::new_err(format!(
            "Expected an N x 3 array of vectors, found {} columns",
            vectors.ncols()
        )))?
    }
    let vectors: Vec<Vector3<f64>> = vectors
        .rows()
        .into_iter()
        .map(|row| Vector3::new(row[0], row[1], row[2]))
        .collect();
    let directions = to_directions(&vectors)?;

    let mut out = Array2::<f64>::zeros((directions.len(), 3));
    for (mut row, direction) in out.rows_mut().into_iter().zip_eq(directions) {
        row[0] = direction.declination;
        row[1] = direction.inclination;
        row[2] = direction.intensity;
    }
    Ok(out.into_pyarray_bound(py))
}

/// True-north declination of a bearing taken against the sun's shadow.
#[pyfunction]
#[pyo3(name = "sun_compass_declination")]
#[pyo3(
    text_signature = "(timestamp: str, utc_offset_hours: float, latitude: float, longitude: float, shadow_angle: float, /)"
)]
fn sun_compass_declination_py(
    timestamp: &str,
    utc_offset_hours: f64,
    latitude: f64,
    longitude: f64,
    shadow_angle: f64,
) -> PyResult<f64> {
    Ok(crate::sun_compass_declination(
        timestamp,
        utc_offset_hours,
        latitude,
        longitude,
        shadow_angle,
    )?)
}

/// Geomagnetic field models and sun-compass declinations.
#[pymodule]
fn geomag(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(geomagnetic_field_py, m)?)?;
    m.add_function(wrap_pyfunction!(magnetic_components_py, m)?)?;
    m.add_function(wrap_pyfunction!(to_directions_py, m)?)?;
    m.add_function(wrap_pyfunction!(sun_compass_declination_py, m)?)?;

    Ok(())
}
