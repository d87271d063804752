use crate::error::{GeomagError, Result};
use itertools::Itertools;

/// Highest spherical-harmonic degree evaluated
pub const MAX_DEGREE: usize = 10;

/// Number of Gauss coefficients up to `MAX_DEGREE`: g(n,0) plus g(n,m), h(n,m) for m = 1..=n
pub const NUM_COEFFICIENTS: usize = MAX_DEGREE * (MAX_DEGREE + 2);

/// Which half of a (degree, order) coefficient pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Harmonic {
    /// g(n,m), multiplies cos(m * longitude)
    Cosine,
    /// h(n,m), multiplies sin(m * longitude)
    Sine,
}

/// A full set of Gauss coefficients, ordered g10, g11, h11, g20, g21, h21, g22, h22, ...
///
/// Used both for the main field (nT) and for its secular variation (nT/yr).
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    values: [f64; NUM_COEFFICIENTS],
}

impl Coefficients {
    pub fn zeros() -> Coefficients {
        Coefficients {
            values: [0.0; NUM_COEFFICIENTS],
        }
    }

    /// Builds a coefficient set from a slice in the standard ordering.
    ///
    /// # Errors
    /// Will return `Err` if the slice does not hold exactly `NUM_COEFFICIENTS` values.
    pub fn from_slice(values: &[f64]) -> Result<Coefficients> {
        let values: [f64; NUM_COEFFICIENTS] = values.try_into().map_err(|_| {
            GeomagError::InvalidTable(format!(
                "Expected {NUM_COEFFICIENTS} coefficients, found {}",
                values.len()
            ))
        })?;
        Ok(Coefficients { values })
    }

    /// Position of g(n,m) or h(n,m) in the standard ordering.
    ///
    /// Callers must keep `1 <= degree <= MAX_DEGREE`, `order <= degree`, and never ask for h(n,0).
    pub const fn index(degree: usize, order: usize, harmonic: Harmonic) -> usize {
        let first = degree * degree - 1;
        match (order, harmonic) {
            (0, _) => first,
            (m, Harmonic::Cosine) => first + 2 * m - 1,
            (m, Harmonic::Sine) => first + 2 * m,
        }
    }

    pub fn get(&self, degree: usize, order: usize, harmonic: Harmonic) -> f64 {
        self.values[Self::index(degree, order, harmonic)]
    }

    pub(crate) fn set(&mut self, degree: usize, order: usize, harmonic: Harmonic, value: f64) {
        self.values[Self::index(degree, order, harmonic)] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Linear annual rate of change needed to move from `self` to `next` over `years`.
    pub fn rate_towards(&self, next: &Coefficients, years: f64) -> Coefficients {
        let mut rate = Coefficients::zeros();
        for (r, (current, target)) in rate
            .values
            .iter_mut()
            .zip_eq(self.values.iter().zip_eq(next.values.iter()))
        {
            *r = (target - current) / years;
        }
        rate
    }

    /// Coefficients advanced `years` along the secular variation `rate`.
    pub fn advanced(&self, rate: &Coefficients, years: f64) -> Coefficients {
        let mut advanced = self.clone();
        for (value, r) in advanced.values.iter_mut().zip_eq(rate.values.iter()) {
            *value += r * years;
        }
        advanced
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Coefficients::zeros()
    }
}
