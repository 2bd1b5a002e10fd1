//! Immutable body data (`spec.md` §3 "Body").
//!
//! A `Body` is plain data: display diameter, mass, standard
//! gravitational parameter, and an optional oblateness trait. Behavior
//! (acceleration kernels, drift correction) lives in
//! `particle_system`, not on the body itself — this is the redesign
//! `spec.md` §9 calls for in place of the original's deep
//! Sun/planet/moon/spacecraft class hierarchy.

use crate::math::vec3::Vec3;

/// J2 oblateness parameters for a body, carried only by the handful of
/// bodies the oblateness model (`spec.md` §4.H) actually perturbs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oblateness {
    /// Dimensionless zonal harmonic coefficient J2.
    pub j2: f64,
    /// Equatorial radius, meters.
    pub equatorial_radius: f64,
    /// Pole direction (unit vector) at J2000; `pole_at` interpolates a
    /// fixed precession rate onto this if one is known.
    pub pole_at_j2000: Vec3,
    /// Precession rate of the pole, radians per Julian century, about
    /// its own instantaneous axis. Zero for bodies whose pole is
    /// treated as fixed over the simulation's timescale.
    pub pole_precession_rate: f64,
}

impl Oblateness {
    /// Pole direction at a given Julian Date. With zero precession rate
    /// this is just the J2000 pole.
    pub fn pole_at(&self, centuries_since_j2000: f64) -> Vec3 {
        if self.pole_precession_rate == 0.0 {
            return self.pole_at_j2000;
        }
        let angle = self.pole_precession_rate * centuries_since_j2000;
        glam::DMat3::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), angle) * self.pole_at_j2000
    }
}

/// Immutable per-body physical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub name: String,
    /// Display diameter, meters. Used for rendering by collaborators,
    /// but also by the core to compute surface distances (closest
    /// approach above the surface rather than to the point mass).
    pub diameter: f64,
    pub mass: f64,
    /// Standard gravitational parameter, `G * mass`, m^3/s^2. Stored
    /// directly (rather than recomputed) because it's usually known to
    /// more decimal places than mass and G individually.
    pub mu: f64,
    pub oblateness: Option<Oblateness>,
}

impl Body {
    pub fn new(name: impl Into<String>, diameter: f64, mass: f64, mu: f64) -> Self {
        Self {
            name: name.into(),
            diameter,
            mass,
            mu,
            oblateness: None,
        }
    }

    pub fn with_oblateness(mut self, oblateness: Oblateness) -> Self {
        self.oblateness = Some(oblateness);
        self
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    pub fn is_oblate(&self) -> bool {
        self.oblateness.is_some()
    }
}
