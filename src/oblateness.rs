//! J2 oblateness perturbation (`spec.md` §4.H).
//!
//! Applied when evaluating a moon's motion relative to one of the five
//! oblate primaries (Earth, Jupiter, Saturn, Uranus, Neptune), and only
//! when the moon's distance to the primary is below a configurable
//! cutoff. Returns the *perturbation* on top of the point-mass
//! Newtonian acceleration the particle system's kernel already
//! supplies — not the full two-body acceleration.

use crate::body::Body;
use crate::constants::DEFAULT_OBLATENESS_CUTOFF_M;
use crate::math::vec3::Vec3;

/// Tunables for the oblateness model (`spec.md` §2.3 "Configuration" —
/// a plain parameterization struct, not an ambient global).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OblatenessConfig {
    /// Distance cutoff, meters. Zero disables the perturbation
    /// globally; negative is rejected by the constructor.
    pub cutoff_m: f64,
}

impl Default for OblatenessConfig {
    fn default() -> Self {
        Self {
            cutoff_m: DEFAULT_OBLATENESS_CUTOFF_M,
        }
    }
}

impl OblatenessConfig {
    pub fn new(cutoff_m: f64) -> Self {
        Self { cutoff_m: cutoff_m.max(0.0) }
    }

    pub fn disabled() -> Self {
        Self { cutoff_m: 0.0 }
    }
}

/// The classical J2 perturbation acceleration of a moon relative to an
/// oblate primary, in the inertial frame (`spec.md` §4.H). Zero if the
/// primary isn't oblate, the cutoff is zero, or the moon is farther
/// from the primary than the cutoff.
pub fn perturbation(
    primary: &Body,
    primary_position: Vec3,
    centuries_since_j2000: f64,
    moon_position: Vec3,
    config: &OblatenessConfig,
) -> Vec3 {
    let Some(obl) = primary.oblateness else {
        return Vec3::ZERO;
    };
    if config.cutoff_m <= 0.0 {
        return Vec3::ZERO;
    }

    let r_vec = moon_position - primary_position;
    let r = r_vec.length();
    if r > config.cutoff_m || r == 0.0 {
        return Vec3::ZERO;
    }

    let pole = obl.pole_at(centuries_since_j2000);
    let z = r_vec.dot(pole);
    let req2 = obl.equatorial_radius * obl.equatorial_radius;
    let coeff = 1.5 * obl.j2 * primary.mu * req2 / r.powi(5);

    r_vec * (coeff * (5.0 * (z / r) * (z / r) - 1.0)) - pole * (coeff * 2.0 * z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Oblateness;

    fn earth() -> Body {
        Body::new("Earth", 12_742_000.0, 5.972e24, 3.986004418e14).with_oblateness(Oblateness {
            j2: 1.082_63e-3,
            equatorial_radius: 6_378_137.0,
            pole_at_j2000: Vec3::new(0.0, 0.0, 1.0),
            pole_precession_rate: 0.0,
        })
    }

    #[test]
    fn zero_outside_cutoff() {
        let config = OblatenessConfig::default();
        let a = perturbation(&earth(), Vec3::ZERO, 0.0, Vec3::new(1.0e13, 0.0, 0.0), &config);
        assert_eq!(a, Vec3::ZERO);
    }

    #[test]
    fn zero_when_disabled() {
        let config = OblatenessConfig::disabled();
        let a = perturbation(&earth(), Vec3::ZERO, 0.0, Vec3::new(4.0e8, 0.0, 0.0), &config);
        assert_eq!(a, Vec3::ZERO);
    }

    #[test]
    fn zero_for_non_oblate_body() {
        let sun = Body::new("Sun", 1.0, 1.0, 1.327e20);
        let config = OblatenessConfig::default();
        let a = perturbation(&sun, Vec3::ZERO, 0.0, Vec3::new(1.0e8, 0.0, 0.0), &config);
        assert_eq!(a, Vec3::ZERO);
    }

    #[test]
    fn nonzero_and_finite_inside_cutoff_off_equator() {
        let config = OblatenessConfig::default();
        let moon_pos = Vec3::new(3.0e8, 0.0, 1.0e8);
        let a = perturbation(&earth(), Vec3::ZERO, 0.0, moon_pos, &config);
        assert!(a.is_finite());
        assert!(a.length() > 0.0);
    }

    #[test]
    fn vanishes_for_satellite_exactly_in_equatorial_plane_component_along_pole() {
        // With z = 0, the pole-aligned subterm vanishes and only the
        // in-plane radial correction survives.
        let config = OblatenessConfig::default();
        let a = perturbation(&earth(), Vec3::ZERO, 0.0, Vec3::new(4.0e8, 0.0, 0.0), &config);
        assert_eq!(a.z, 0.0);
    }
}
