//! Kepler's equation solver (`spec.md` §4.A).
//!
//! Solves `E - e*sin(E) = M` for the eccentric anomaly `E`, given mean
//! anomaly `M` (radians) and eccentricity `e` (`0 <= e < 1`), by Newton
//! iteration.

use crate::error::SimError;

/// Convergence tolerance on `|E - e*sin(E) - M|`, in radians.
pub const TOLERANCE_RAD: f64 = 1e-12;

/// Maximum Newton iterations before giving up.
pub const MAX_ITERATIONS: u32 = 50;

/// Solve Kepler's equation for the eccentric anomaly.
///
/// `mean_anomaly` may be any finite value; it is normalized to
/// `[0, 2*pi)` internally. Fails with `SimError::Numerical` if Newton's
/// method does not converge to `TOLERANCE_RAD` within `MAX_ITERATIONS`.
pub fn solve_eccentric_anomaly(mean_anomaly: f64, eccentricity: f64) -> Result<f64, SimError> {
    let m = mean_anomaly.rem_euclid(std::f64::consts::TAU);

    // Starting guess: M works well for low eccentricity, pi is the
    // standard starting point for high eccentricity.
    let mut e_anom = if eccentricity < 0.8 { m } else { std::f64::consts::PI };

    for _ in 0..MAX_ITERATIONS {
        let sin_e = e_anom.sin();
        let cos_e = e_anom.cos();
        let f = e_anom - eccentricity * sin_e - m;
        if f.abs() < TOLERANCE_RAD {
            return Ok(e_anom);
        }
        let f_prime = 1.0 - eccentricity * cos_e;
        e_anom -= f / f_prime;
    }

    let residual = e_anom - eccentricity * e_anom.sin() - m;
    if residual.abs() < TOLERANCE_RAD {
        return Ok(e_anom);
    }

    Err(SimError::numerical(
        "kepler_solver::solve_eccentric_anomaly",
        format!(
            "failed to converge within {MAX_ITERATIONS} iterations (M={mean_anomaly}, e={eccentricity}, residual={residual})"
        ),
    ))
}
