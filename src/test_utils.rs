//! Test fixtures and assertions for orbital mechanics tests.
//!
//! Mirrors the shape of the crate's own conservation-law tests
//! (`particle_system.rs`, `integrators::abm4`): fixtures build a state
//! vector for a chosen kind of two-body orbit, assertions check the
//! invariants an integrator step must respect. Everything here takes
//! `mu` explicitly rather than assuming the Sun, since callers exercise
//! subsystems (Jupiter + a moon) just as often as the main system.

use crate::math::vec3::Vec3;

/// Fixtures for two-body orbital states, in the plane `z = 0` with the
/// body on the positive x-axis.
pub mod fixtures {
    use super::*;

    /// A circular orbit at `distance_m` from a primary of gravitational
    /// parameter `mu`. Returns `(position, velocity)`.
    pub fn circular_orbit(mu: f64, distance_m: f64) -> (Vec3, Vec3) {
        let v = (mu / distance_m).sqrt();
        (Vec3::new(distance_m, 0.0, 0.0), Vec3::new(0.0, v, 0.0))
    }

    /// An elliptical orbit starting at perihelion, `eccentricity` in
    /// `[0, 1)`.
    pub fn elliptical_orbit(mu: f64, perihelion_m: f64, eccentricity: f64) -> (Vec3, Vec3) {
        assert!((0.0..1.0).contains(&eccentricity), "eccentricity must be in [0, 1)");
        let a = perihelion_m / (1.0 - eccentricity);
        let v = (mu * (2.0 / perihelion_m - 1.0 / a)).sqrt();
        (Vec3::new(perihelion_m, 0.0, 0.0), Vec3::new(0.0, v, 0.0))
    }

    /// A hyperbolic escape trajectory: 1.1x local escape velocity at
    /// `distance_m`.
    pub fn escape_trajectory(mu: f64, distance_m: f64) -> (Vec3, Vec3) {
        let v = assertions::escape_velocity(mu, distance_m) * 1.1;
        (Vec3::new(distance_m, 0.0, 0.0), Vec3::new(0.0, v, 0.0))
    }

    /// A state with a prescribed specific orbital energy at `distance_m`
    /// (positive = hyperbolic, negative = elliptical, zero = parabolic).
    pub fn orbit_with_energy(mu: f64, distance_m: f64, specific_energy: f64) -> (Vec3, Vec3) {
        let v_squared = 2.0 * (specific_energy + mu / distance_m);
        assert!(v_squared >= 0.0, "energy too low for this distance");
        (Vec3::new(distance_m, 0.0, 0.0), Vec3::new(0.0, v_squared.sqrt(), 0.0))
    }
}

/// Assertions for the conservation laws a correct integrator step must
/// respect.
pub mod assertions {
    use super::*;

    /// Specific orbital energy `v^2/2 - mu/r`.
    pub fn orbital_energy(mu: f64, pos: Vec3, vel: Vec3) -> f64 {
        0.5 * vel.length_squared() - mu / pos.length()
    }

    /// Specific angular momentum vector `r x v`.
    pub fn angular_momentum(pos: Vec3, vel: Vec3) -> Vec3 {
        pos.cross(vel)
    }

    /// Panics if the relative drift between `initial` and `final` energy
    /// exceeds `tolerance`.
    pub fn assert_energy_conserved(initial_energy: f64, final_energy: f64, tolerance: f64) {
        let drift = relative_drift(initial_energy, final_energy);
        assert!(
            drift <= tolerance,
            "energy not conserved: initial={initial_energy:.6e}, final={final_energy:.6e}, drift={drift:.6e}, tolerance={tolerance:.6e}"
        );
    }

    /// Panics if the relative drift between the magnitudes of `initial`
    /// and `final` angular momentum exceeds `tolerance`.
    pub fn assert_angular_momentum_conserved(initial_l: Vec3, final_l: Vec3, tolerance: f64) {
        let drift = relative_drift(initial_l.length(), final_l.length());
        assert!(
            drift <= tolerance,
            "angular momentum not conserved: initial={:.6e}, final={:.6e}, drift={drift:.6e}, tolerance={tolerance:.6e}",
            initial_l.length(),
            final_l.length(),
        );
    }

    fn relative_drift(initial: f64, r#final: f64) -> f64 {
        if initial.abs() > 1e-10 { ((r#final - initial) / initial).abs() } else { (r#final - initial).abs() }
    }

    /// Orbital period from Kepler's third law, `T = 2*pi*sqrt(a^3/mu)`.
    pub fn orbital_period(mu: f64, semi_major_axis: f64) -> f64 {
        std::f64::consts::TAU * (semi_major_axis.powi(3) / mu).sqrt()
    }

    /// Semi-major axis from specific energy, `a = -mu/(2E)`. `None` for
    /// an unbound orbit.
    pub fn semi_major_axis_from_energy(mu: f64, energy: f64) -> Option<f64> {
        if energy >= 0.0 { None } else { Some(-mu / (2.0 * energy)) }
    }

    pub fn is_bound(mu: f64, pos: Vec3, vel: Vec3) -> bool {
        orbital_energy(mu, pos, vel) < 0.0
    }

    pub fn escape_velocity(mu: f64, distance_m: f64) -> f64 {
        (2.0 * mu / distance_m).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MU_SUN: f64 = 1.327_124_4e20;
    const AU: f64 = 1.495_978_707e11;

    #[test]
    fn circular_orbit_has_escape_velocity_ratio_sqrt_two() {
        let (pos, vel) = fixtures::circular_orbit(MU_SUN, AU);
        let v_esc = assertions::escape_velocity(MU_SUN, AU);
        assert_relative_eq!(v_esc / vel.length(), 2.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn circular_orbit_is_bound() {
        let (pos, vel) = fixtures::circular_orbit(MU_SUN, AU);
        assert!(assertions::is_bound(MU_SUN, pos, vel));
    }

    #[test]
    fn escape_trajectory_is_unbound() {
        let (pos, vel) = fixtures::escape_trajectory(MU_SUN, AU);
        assert!(!assertions::is_bound(MU_SUN, pos, vel));
    }

    #[test]
    fn elliptical_orbit_has_negative_energy() {
        let (pos, vel) = fixtures::elliptical_orbit(MU_SUN, AU, 0.5);
        assert!(assertions::orbital_energy(MU_SUN, pos, vel) < 0.0);
    }

    #[test]
    fn angular_momentum_matches_r_cross_v_for_planar_circular_orbit() {
        let (pos, vel) = fixtures::circular_orbit(MU_SUN, AU);
        let l = assertions::angular_momentum(pos, vel);
        assert_relative_eq!(l.length(), pos.length() * vel.length(), epsilon = 1.0);
        assert_relative_eq!(l.z, l.length(), epsilon = 1.0);
    }

    #[test]
    fn orbital_period_at_one_au_is_about_one_year() {
        let period = assertions::orbital_period(MU_SUN, AU);
        let year_seconds = 365.25 * 86_400.0;
        assert_relative_eq!(period, year_seconds, epsilon = year_seconds * 0.01);
    }

    #[test]
    fn semi_major_axis_round_trips_through_energy() {
        let (pos, vel) = fixtures::elliptical_orbit(MU_SUN, AU, 0.3);
        let energy = assertions::orbital_energy(MU_SUN, pos, vel);
        let a = assertions::semi_major_axis_from_energy(MU_SUN, energy).unwrap();
        let expected_a = AU / (1.0 - 0.3);
        assert_relative_eq!(a, expected_a, epsilon = expected_a * 1e-6);
    }
}
