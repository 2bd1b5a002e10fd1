//! Chebyshev polynomial evaluation (`spec.md` §4.C, step 4).
//!
//! Evaluates a one-axis Chebyshev series and its derivative at a
//! normalized argument `tau in [-1, 1]`, using the standard three-term
//! recurrences rather than recomputing each `T_k`/`U_k` from scratch.

/// Evaluate `Sum c_k * T_k(tau)` (position) and its derivative with
/// respect to `tau` (velocity-per-tau; the caller scales this to
/// per-day).
///
/// `T_0 = 1, T_1 = tau, T_k = 2*tau*T_{k-1} - T_{k-2}`.
/// `dT_k/dtau = k * U_{k-1}`, with `U_0 = 1, U_1 = 2*tau, U_k = 2*tau*U_{k-1} - U_{k-2}`.
pub fn evaluate(coeffs: &[f64], tau: f64) -> (f64, f64) {
    let n = coeffs.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    if n == 1 {
        return (coeffs[0], 0.0);
    }

    let mut t = [1.0, tau];
    let mut u = [1.0, 2.0 * tau];

    let mut position = coeffs[0] * t[0] + coeffs[1] * t[1];
    let mut velocity = coeffs[1] * u[0]; // dT_1/dtau = 1 = U_0

    for k in 2..n {
        let t_k = 2.0 * tau * t[1] - t[0];
        let u_k = 2.0 * tau * u[1] - u[0];
        position += coeffs[k] * t_k;
        velocity += coeffs[k] * (k as f64) * u[1];
        t = [t[1], t_k];
        u = [u[1], u_k];
    }

    (position, velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_series_has_zero_derivative() {
        let (p, v) = evaluate(&[3.0], 0.4);
        assert_eq!(p, 3.0);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn linear_series_matches_hand_computation() {
        // c0*T0 + c1*T1 = c0 + c1*tau; derivative = c1.
        let (p, v) = evaluate(&[1.0, 2.0], 0.5);
        assert_abs_diff_eq!(p, 1.0 + 2.0 * 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(v, 2.0, epsilon = 1e-14);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let coeffs = [0.3, -1.2, 0.7, 2.1, -0.4];
        let tau = 0.37;
        let h = 1e-6;
        let (_, v) = evaluate(&coeffs, tau);
        let (p_plus, _) = evaluate(&coeffs, tau + h);
        let (p_minus, _) = evaluate(&coeffs, tau - h);
        let fd = (p_plus - p_minus) / (2.0 * h);
        assert_abs_diff_eq!(v, fd, epsilon = 1e-6);
    }

    #[test]
    fn endpoints_are_within_unit_range_behaved() {
        // T_k(1) = 1 for all k, so position at tau=1 is the coefficient sum.
        let coeffs = [1.0, 1.0, 1.0, 1.0];
        let (p, _) = evaluate(&coeffs, 1.0);
        assert_abs_diff_eq!(p, 4.0, epsilon = 1e-12);
    }
}
