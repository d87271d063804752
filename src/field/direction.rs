use crate::error::{GeomagError, Result};
use nalgebra::Vector3;

/// Direction and strength of a field vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    /// Degrees clockwise from north, in [0, 360)
    pub declination: f64,
    /// Degrees below the horizontal, negative upwards
    pub inclination: f64,
    /// Vector length, in the units of the vector
    pub intensity: f64,
}

/// Converts a north, east, down vector into declination, inclination and intensity.
///
/// # Errors
/// Will return `Err` if the vector has zero or non-finite length.
pub fn to_direction(vector: &Vector3<f64>) -> Result<Direction> {
    let intensity = vector.norm();
    if intensity == 0.0 || !intensity.is_finite() {
        Err(GeomagError::DegenerateVector)?
    }
    let mut declination = vector.y.atan2(vector.x).to_degrees().rem_euclid(360.0);
    // rem_euclid rounds tiny negative angles up to exactly 360
    if declination >= 360.0 {
        declination = 0.0;
    }
    let inclination = (vector.z / intensity).clamp(-1.0, 1.0).asin().to_degrees();
    Ok(Direction {
        declination,
        inclination,
        intensity,
    })
}

/// Converts each vector of a batch, failing on the first degenerate one.
///
/// # Errors
/// Will return `Err` if any vector has zero or non-finite length.
pub fn to_directions(vectors: &[Vector3<f64>]) -> Result<Vec<Direction>> {
    vectors.iter().map(to_direction).collect()
}

/// Inverse of [`to_direction`]
pub fn to_vector(direction: &Direction) -> Vector3<f64> {
    let (dec, inc) = (
        direction.declination.to_radians(),
        direction.inclination.to_radians(),
    );
    Vector3::new(
        direction.intensity * inc.cos() * dec.cos(),
        direction.intensity * inc.cos() * dec.sin(),
        direction.intensity * inc.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn cardinal_directions() {
        let north = to_direction(&Vector3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(north.declination, 0.0);
        assert_eq!(north.inclination, 0.0);

        let west = to_direction(&Vector3::new(0.0, -2.0, 0.0)).unwrap();
        assert_relative_eq!(west.declination, 270.0);
        assert_relative_eq!(west.intensity, 2.0);

        let down = to_direction(&Vector3::new(0.0, 0.0, 5.0)).unwrap();
        assert_relative_eq!(down.inclination, 90.0);
        let up = to_direction(&Vector3::new(0.0, 0.0, -5.0)).unwrap();
        assert_relative_eq!(up.inclination, -90.0);
    }

    #[test]
    fn declination_stays_below_360() {
        let direction = to_direction(&Vector3::new(1.0, -1e-300, 0.0)).unwrap();
        assert!((0.0..360.0).contains(&direction.declination));
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert!(matches!(
            to_direction(&Vector3::zeros()),
            Err(GeomagError::DegenerateVector)
        ));
        assert!(to_direction(&Vector3::new(f64::NAN, 1.0, 0.0)).is_err());
    }

    #[test]
    fn batch_matches_single() {
        let vectors = vec![Vector3::new(3.0, 4.0, 5.0), Vector3::new(-1.0, 0.5, -2.0)];
        let directions = to_directions(&vectors).unwrap();
        assert_eq!(directions.len(), 2);
        for (vector, direction) in vectors.iter().zip(directions) {
            assert_eq!(to_direction(vector).unwrap(), direction);
        }
        assert!(to_directions(&[Vector3::new(1.0, 0.0, 0.0), Vector3::zeros()]).is_err());
        assert!(to_directions(&[]).unwrap().is_empty());
    }

    #[test]
    fn round_trip_through_vector() {
        let direction = Direction {
            declination: 347.5,
            inclination: -62.0,
            intensity: 48000.0,
        };
        let back = to_direction(&to_vector(&direction)).unwrap();
        assert_abs_diff_eq!(back.declination, direction.declination, epsilon = 1e-9);
        assert_abs_diff_eq!(back.inclination, direction.inclination, epsilon = 1e-9);
        assert_relative_eq!(back.intensity, direction.intensity, max_relative = 1e-12);
    }
}
