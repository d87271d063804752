//! Spherical-harmonic synthesis of the main geomagnetic field.
use crate::error::Result;
use crate::models::coefficients::{Coefficients, Harmonic, MAX_DEGREE};
use crate::models::store::{CoefficientStore, ModelFamily};
use crate::utils::constants::{EQUATORIAL_RADIUS_SQ, POLAR_RADIUS_SQ, RADIUS_EARTH};
use nalgebra::Vector3;

/// Number of (degree, order) pairs with 0 <= order <= degree <= `MAX_DEGREE`, including (0, 0)
const NUM_LEGENDRE: usize = (MAX_DEGREE + 1) * (MAX_DEGREE + 2) / 2;

/// How the vertical position of a synthesis point is given
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Elevation {
    /// Height in km above the reference ellipsoid; colatitude is geodetic
    Geodetic { altitude_km: f64 },
    /// Distance in km from the centre of the Earth; colatitude is geocentric
    Geocentric { radius_km: f64 },
}

/// Field components in nT. `north`, `east` and `down` are in the frame of the input
/// coordinates (geodetic or geocentric).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticComponents {
    pub north: f64,
    pub east: f64,
    pub down: f64,
    pub total: f64,
}

impl MagneticComponents {
    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.north, self.east, self.down)
    }
}

/// A location and time to evaluate the field at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryPoint {
    /// Decimal year
    pub date: f64,
    /// km above sea level
    pub altitude: f64,
    /// Geodetic latitude in degrees, negative south
    pub latitude: f64,
    /// Degrees east, either -180..180 or 0..360
    pub longitude: f64,
}

impl QueryPoint {
    pub fn new(date: f64, altitude: f64, latitude: f64, longitude: f64) -> QueryPoint {
        QueryPoint {
            date,
            altitude,
            latitude,
            longitude,
        }
    }
}

/// Index of P(n,m) and Q(n,m) in the Legendre arrays
const fn legendre_index(degree: usize, order: usize) -> usize {
    degree * (degree + 1) / 2 + order
}

/// Evaluates the field of `main_field`, advanced `date - epoch` years along
/// `secular_variation`, at the given colatitude and east longitude (degrees).
///
/// Uses Schmidt quasi-normalised Legendre functions up to degree `MAX_DEGREE`. For
/// geodetic input the point is moved onto the geocentric sphere first and the result is
/// rotated back so `north` and `down` are in the geodetic frame.
pub fn synthesize(
    main_field: &Coefficients,
    secular_variation: &Coefficients,
    epoch: f64,
    date: f64,
    elevation: Elevation,
    colatitude: f64,
    east_longitude: f64,
) -> MagneticComponents {
    let t = date - epoch;

    let colat = colatitude.to_radians();
    let mut ct = colat.cos();
    let mut st = colat.sin();

    let lon = east_longitude.to_radians();
    let mut cl = [0.0; MAX_DEGREE];
    let mut sl = [0.0; MAX_DEGREE];
    cl[0] = lon.cos();
    sl[0] = lon.sin();

    // Rotation from geocentric back to geodetic axes
    let (mut cd, mut sd) = (1.0, 0.0);
    let r = match elevation {
        Elevation::Geocentric { radius_km } => radius_km,
        Elevation::Geodetic { altitude_km } => {
            let one = EQUATORIAL_RADIUS_SQ * st * st;
            let two = POLAR_RADIUS_SQ * ct * ct;
            let three = one + two;
            let rho = three.sqrt();
            let r = (altitude_km * (altitude_km + 2.0 * rho)
                + (EQUATORIAL_RADIUS_SQ * one + POLAR_RADIUS_SQ * two) / three)
                .sqrt();
            cd = (altitude_km + rho) / r;
            sd = (EQUATORIAL_RADIUS_SQ - POLAR_RADIUS_SQ) / rho * ct * st / r;
            let geodetic_ct = ct;
            ct = ct * cd - st * sd;
            st = st * cd + geodetic_ct * sd;
            r
        }
    };

    let ratio = RADIUS_EARTH / r;
    let mut rr = ratio * ratio;

    let mut p = [0.0; NUM_LEGENDRE];
    let mut q = [0.0; NUM_LEGENDRE];
    p[0] = 1.0;
    p[2] = st;
    q[0] = 0.0;
    q[2] = ct;

    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    for n in 1..=MAX_DEGREE {
        rr *= ratio;
        let fn_ = n as f64;
        let gn = fn_ - 1.0;
        for m in 0..=n {
            let fm = m as f64;
            let k = legendre_index(n, m);

            // P(1,1) and Q(1,1) are seeded above
            if k != 2 {
                if m == n {
                    let one = (1.0 - 0.5 / fm).sqrt();
                    let j = legendre_index(n - 1, m - 1);
                    p[k] = one * st * p[j];
                    q[k] = one * (st * q[j] + ct * p[j]);
                    cl[m - 1] = cl[m - 2] * cl[0] - sl[m - 2] * sl[0];
                    sl[m - 1] = sl[m - 2] * cl[0] + cl[m - 2] * sl[0];
                } else {
                    let gm = fm * fm;
                    let one = (fn_ * fn_ - gm).sqrt();
                    let two = (gn * gn - gm).sqrt() / one;
                    let three = (fn_ + gn) / one;
                    let i = k - n;
                    // P(n-2,m) is multiplied by zero when it does not exist (m >= n-1)
                    let j = i + 1 - n;
                    p[k] = three * ct * p[i] - two * p[j];
                    q[k] = three * (ct * q[i] - st * p[i]) - two * q[j];
                }
            }

            let g = (main_field.get(n, m, Harmonic::Cosine)
                + secular_variation.get(n, m, Harmonic::Cosine) * t)
                * rr;
            if m == 0 {
                x += g * q[k];
                z -= (fn_ + 1.0) * g * p[k];
            } else {
                let h = (main_field.get(n, m, Harmonic::Sine)
                    + secular_variation.get(n, m, Harmonic::Sine) * t)
                    * rr;
                let three = g * cl[m - 1] + h * sl[m - 1];
                x += three * q[k];
                z -= (fn_ + 1.0) * three * p[k];
                if st == 0.0 {
                    y += (g * sl[m - 1] - h * cl[m - 1]) * q[k] * ct;
                } else {
                    y += (g * sl[m - 1] - h * cl[m - 1]) * fm * p[k] / st;
                }
            }
        }
    }

    let geocentric_x = x;
    x = x * cd + z * sd;
    z = z * cd - geocentric_x * sd;

    MagneticComponents {
        north: x,
        east: y,
        down: z,
        total: (x * x + y * y + z * z).sqrt(),
    }
}

/// Field components at a query point, with coefficients chosen from `store` for the
/// point's date.
///
/// # Errors
/// Will return `Err` if the store cannot supply coefficients for the date.
pub fn magnetic_components(
    store: &CoefficientStore,
    point: &QueryPoint,
    hint: Option<ModelFamily>,
) -> Result<MagneticComponents> {
    let selected = store.coefficients(point.date, hint)?;
    Ok(synthesize(
        &selected.main_field,
        &selected.secular_variation,
        selected.epoch,
        point.date,
        Elevation::Geodetic {
            altitude_km: point.altitude,
        },
        90.0 - point.latitude,
        point.longitude.rem_euclid(360.0),
    ))
}
