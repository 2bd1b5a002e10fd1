//! Orbital-element kernel (`spec.md` §4.B).
//!
//! A Keplerian orbit represented by the classical six elements
//! `{a, e, i, Omega, long_peri, L}` (semi-major axis, eccentricity,
//! inclination, ascending node, longitude of perihelion, mean
//! longitude), plus linear-in-centuries rates and optional secular
//! correction terms, in the style of the low-precision planetary
//! element tables (e.g. Standish 1992 / JPL's "Keplerian elements for
//! approximate positions of the major planets").

use glam::DMat3;

use crate::constants::{DAYS_PER_JULIAN_CENTURY, J2000_JD};
use crate::error::SimError;
use crate::math::kepler_solver::solve_eccentric_anomaly;
use crate::math::vec3::Vec3;

/// Eccentricities below this are treated as exactly circular.
const CIRCULAR_EPS: f64 = 1e-12;
/// Inclinations (radians) below this are treated as exactly equatorial.
const EQUATORIAL_EPS: f64 = 1e-12;

/// The classical six Keplerian elements at a specific epoch.
///
/// Angles are in radians; `a` is in meters. `long_peri` is the
/// longitude of perihelion `omega_bar = omega + Omega`; `mean_longitude`
/// is `L = M + omega_bar`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeplerianElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node: f64,
    pub long_peri: f64,
    pub mean_longitude: f64,
}

/// Linear-in-centuries rates for each of the six elements, units per
/// Julian century (meters/century for `a`, radians/century for angles).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementRates {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node: f64,
    pub long_peri: f64,
    pub mean_longitude: f64,
}

/// Extra multi-term secular correction applied to the mean longitude,
/// used for the outer planets: `+ b*T^2 + c*cos(f*T) + s*sin(f*T)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SecularCorrection {
    pub b: f64,
    pub c: f64,
    pub s: f64,
    pub f: f64,
}

/// A time-varying orbit: elements at J2000 plus their rates and any
/// secular correction, from which elements at any epoch can be derived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitModel {
    pub epoch_elements: KeplerianElements,
    pub rates: ElementRates,
    pub secular: Option<SecularCorrection>,
}

impl OrbitModel {
    pub fn new(epoch_elements: KeplerianElements, rates: ElementRates) -> Self {
        Self {
            epoch_elements,
            rates,
            secular: None,
        }
    }

    pub fn with_secular(mut self, secular: SecularCorrection) -> Self {
        self.secular = Some(secular);
        self
    }

    /// Evaluate the elements at a Julian Date, reducing the angular
    /// elements modulo 360 degrees (`spec.md` §4.B "Elements at epoch").
    pub fn elements_at_epoch(&self, jd: f64) -> KeplerianElements {
        let t = (jd - J2000_JD) / DAYS_PER_JULIAN_CENTURY;
        let e0 = &self.epoch_elements;
        let r = &self.rates;

        let mut mean_longitude = e0.mean_longitude + r.mean_longitude * t;
        if let Some(sec) = &self.secular {
            mean_longitude += sec.b * t * t + sec.c * (sec.f * t).cos() + sec.s * (sec.f * t).sin();
        }

        KeplerianElements {
            semi_major_axis: e0.semi_major_axis + r.semi_major_axis * t,
            eccentricity: e0.eccentricity + r.eccentricity * t,
            inclination: e0.inclination + r.inclination * t,
            ascending_node: reduce_angle(e0.ascending_node + r.ascending_node * t),
            long_peri: reduce_angle(e0.long_peri + r.long_peri * t),
            mean_longitude: reduce_angle(mean_longitude),
        }
    }
}

/// Reduce an angle (radians) into `[0, 2*pi)`.
fn reduce_angle(radians: f64) -> f64 {
    radians.rem_euclid(std::f64::consts::TAU)
}

/// Rotation from the perifocal frame into the parent-body frame:
/// `Rz(Omega) * Rx(i) * Rz(omega)`.
fn perifocal_to_frame(ascending_node: f64, inclination: f64, arg_periapsis: f64) -> DMat3 {
    DMat3::from_rotation_z(ascending_node)
        * DMat3::from_rotation_x(inclination)
        * DMat3::from_rotation_z(arg_periapsis)
}

/// Position from orbital elements (`spec.md` §4.B "Position from
/// elements"). Result in meters, in the parent-body frame.
pub fn position_from_elements(elements: &KeplerianElements) -> Result<Vec3, SimError> {
    let omega = elements.long_peri - elements.ascending_node;
    let mean_anomaly = elements.mean_longitude - elements.long_peri;
    let e = elements.eccentricity.max(0.0);
    let e_anom = solve_eccentric_anomaly(mean_anomaly, e)?;

    let r = elements.semi_major_axis * (1.0 - e * e_anom.cos());
    let true_anomaly = eccentric_to_true_anomaly(e_anom, e);

    let pos_pf = Vec3::new(r * true_anomaly.cos(), r * true_anomaly.sin(), 0.0);
    let rot = perifocal_to_frame(elements.ascending_node, elements.inclination, omega);
    Ok(rot * pos_pf)
}

/// Velocity from orbital elements, analytically (not finite-differenced),
/// consistent with `position_from_elements` for the same `mu`
/// (`spec.md` §4.B "Velocity from elements").
pub fn velocity_from_elements(mu: f64, elements: &KeplerianElements) -> Result<Vec3, SimError> {
    let omega = elements.long_peri - elements.ascending_node;
    let mean_anomaly = elements.mean_longitude - elements.long_peri;
    let e = elements.eccentricity.max(0.0);
    let e_anom = solve_eccentric_anomaly(mean_anomaly, e)?;
    let true_anomaly = eccentric_to_true_anomaly(e_anom, e);

    let a = elements.semi_major_axis;
    let p = a * (1.0 - e * e).max(1e-300);
    let h = (mu * p).sqrt();

    // Perifocal-frame velocity from the standard two-body vis-viva
    // decomposition.
    let vx_pf = -(mu / h) * true_anomaly.sin();
    let vy_pf = (mu / h) * (e + true_anomaly.cos());
    let vel_pf = Vec3::new(vx_pf, vy_pf, 0.0);

    let rot = perifocal_to_frame(elements.ascending_node, elements.inclination, omega);
    Ok(rot * vel_pf)
}

fn eccentric_to_true_anomaly(e_anom: f64, e: f64) -> f64 {
    let half = e_anom / 2.0;
    let y = (1.0 + e).sqrt() * half.sin();
    let x = (1.0 - e).sqrt() * half.cos();
    2.0 * y.atan2(x)
}

/// Derive osculating elements from a state vector at a given epoch
/// (`spec.md` §4.B "Elements from position and velocity"). Rates are
/// set to zero: callers must not re-propagate these elements through
/// `OrbitModel::elements_at_epoch` as if they had known secular
/// behavior.
pub fn elements_from_state(mu: f64, r: Vec3, v: Vec3) -> KeplerianElements {
    let r_mag = r.length();
    let v_mag = v.length();

    let h = r.cross(v);
    let h_mag = h.length();

    let k = Vec3::new(0.0, 0.0, 1.0);
    let n = k.cross(h);
    let n_mag = n.length();

    let e_vec = (v.cross(h)) / mu - r / r_mag;
    let e = e_vec.length();

    let energy = 0.5 * v_mag * v_mag - mu / r_mag;
    let a = if energy.abs() > 1e-300 { -mu / (2.0 * energy) } else { f64::INFINITY };

    let inclination = if h_mag > 1e-300 { (h.z / h_mag).clamp(-1.0, 1.0).acos() } else { 0.0 };
    let equatorial = inclination < EQUATORIAL_EPS;
    let circular = e < CIRCULAR_EPS;

    let ascending_node = if equatorial || n_mag < 1e-300 {
        0.0
    } else {
        let raan = (n.x / n_mag).clamp(-1.0, 1.0).acos();
        if n.y < 0.0 { std::f64::consts::TAU - raan } else { raan }
    };

    // Argument of periapsis, measured from the ascending node (or from
    // the x-axis, for an equatorial orbit) to the eccentricity vector.
    let omega = if circular {
        0.0
    } else if equatorial {
        let raan_ref = Vec3::new(1.0, 0.0, 0.0);
        angle_with_sign(raan_ref, e_vec, k)
    } else {
        angle_with_sign(n, e_vec, h)
    };

    // True anomaly, measured from periapsis (or from the ascending
    // node/x-axis when the orbit is circular) to the position vector.
    let true_anomaly = if circular && equatorial {
        angle_with_sign(Vec3::new(1.0, 0.0, 0.0), r, k)
    } else if circular {
        angle_with_sign(n, r, h)
    } else {
        let cos_nu = (e_vec.dot(r) / (e * r_mag)).clamp(-1.0, 1.0);
        let nu = cos_nu.acos();
        if r.dot(v) < 0.0 { std::f64::consts::TAU - nu } else { nu }
    };

    let mean_anomaly = if circular {
        true_anomaly
    } else {
        let e_anom = true_to_eccentric_anomaly(true_anomaly, e);
        e_anom - e * e_anom.sin()
    };

    let long_peri = reduce_angle(ascending_node + omega);
    let mean_longitude = reduce_angle(long_peri + mean_anomaly);

    KeplerianElements {
        semi_major_axis: a,
        eccentricity: e,
        inclination,
        ascending_node: reduce_angle(ascending_node),
        long_peri,
        mean_longitude,
    }
}

fn true_to_eccentric_anomaly(nu: f64, e: f64) -> f64 {
    let half = nu / 2.0;
    let y = (1.0 - e).sqrt() * half.sin();
    let x = (1.0 + e).sqrt() * half.cos();
    2.0 * y.atan2(x)
}

/// Signed angle (radians, `[0, 2*pi)`) from `from` to `to`, measured
/// about the axis whose sign convention is given by `reference_normal`.
fn angle_with_sign(from: Vec3, to: Vec3, reference_normal: Vec3) -> f64 {
    let from_mag = from.length();
    let to_mag = to.length();
    if from_mag < 1e-300 || to_mag < 1e-300 {
        return 0.0;
    }
    let cos_theta = (from.dot(to) / (from_mag * to_mag)).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    if from.cross(to).dot(reference_normal) < 0.0 {
        std::f64::consts::TAU - theta
    } else {
        theta
    }
}
