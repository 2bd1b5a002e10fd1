//! DE405 Chebyshev evaluator (`spec.md` §4.C).
//!
//! Fast random-access evaluation of position and velocity of the
//! eleven DE405 targets at any Julian Date within the supported range.
//! The coefficient array is supplied already populated — parsing the
//! text DE405 ASCII files into this layout is a collaborator's job, not
//! this crate's (`spec.md` §1).

mod chebyshev;
pub mod record;

pub use record::Target;

use crate::constants::DE405_OBLIQUITY_SIN;
use crate::error::SimError;
use crate::math::vec3::Vec3;
use record::{RECORD_LENGTH_DAYS, NUMBERS_PER_INTERVAL};

/// A table of DE405 32-day records, immutable once constructed
/// (`spec.md` §5 "Shared resources").
#[derive(Clone, Debug)]
pub struct De405Table {
    first_valid_jd: f64,
    records: Vec<[f64; NUMBERS_PER_INTERVAL]>,
}

impl De405Table {
    /// Build a table from already-decoded records, each exactly
    /// `NUMBERS_PER_INTERVAL` coefficients long, the first covering
    /// `first_valid_jd .. first_valid_jd + 32`.
    pub fn new(first_valid_jd: f64, records: Vec<[f64; NUMBERS_PER_INTERVAL]>) -> Self {
        Self {
            first_valid_jd,
            records,
        }
    }

    pub fn first_valid_jd(&self) -> f64 {
        self.first_valid_jd
    }

    pub fn last_valid_jd(&self) -> f64 {
        self.first_valid_jd + self.records.len() as f64 * RECORD_LENGTH_DAYS
    }

    /// Position (AU) and velocity (AU/day) of `target` at `jd`, in the
    /// DE405 J2000 mean-equator frame (`spec.md` §4.C algorithm).
    pub fn position_velocity(&self, target: Target, jd: f64) -> Result<(Vec3, Vec3), SimError> {
        if jd < self.first_valid_jd || jd > self.last_valid_jd() {
            return Err(SimError::out_of_range(
                "julian date",
                jd,
                self.first_valid_jd,
                self.last_valid_jd(),
            ));
        }

        let record_index = ((jd - self.first_valid_jd) / RECORD_LENGTH_DAYS) as usize;
        let record_index = record_index.min(self.records.len() - 1);
        let record = &self.records[record_index];
        let record_start = self.first_valid_jd + record_index as f64 * RECORD_LENGTH_DAYS;

        let (k, n) = target.layout();
        let sub_len = RECORD_LENGTH_DAYS / k as f64;
        let offset_in_record = jd - record_start;
        let sub_index = (offset_in_record / sub_len).floor().clamp(0.0, (k - 1) as f64) as usize;
        let sub_start = record_start + sub_index as f64 * sub_len;
        let tau = 2.0 * (jd - sub_start) / sub_len - 1.0;

        let block_offset = target.offset() + sub_index * n * 3;
        let velocity_scale = 2.0 * k as f64 / RECORD_LENGTH_DAYS;

        let mut position = [0.0; 3];
        let mut velocity = [0.0; 3];
        for axis in 0..3 {
            let start = block_offset + axis * n;
            let coeffs = &record[start..start + n];
            let (p, v) = chebyshev::evaluate(coeffs, tau);
            position[axis] = p;
            velocity[axis] = v * velocity_scale;
        }

        Ok((Vec3::from(position), Vec3::from(velocity)))
    }
}

/// Reconstruct Earth and Moon states from the Earth-Moon barycenter
/// and geocentric-Moon records (`spec.md` §4.C, step 5), using the
/// fixed mass ratio `emrat`.
pub fn earth_and_moon_from_barycenter(
    emb: (Vec3, Vec3),
    geocentric_moon: (Vec3, Vec3),
    emrat: f64,
) -> ((Vec3, Vec3), (Vec3, Vec3)) {
    let (r_emb, v_emb) = emb;
    let (r_geo_moon, v_geo_moon) = geocentric_moon;

    let r_earth = r_emb - r_geo_moon / (1.0 + emrat);
    let v_earth = v_emb - v_geo_moon / (1.0 + emrat);
    let r_moon = r_earth + r_geo_moon;
    let v_moon = v_earth + v_geo_moon;

    ((r_earth, v_earth), (r_moon, v_moon))
}

/// Rotate a DE405 J2000 mean-equator vector into the J2000 ecliptic
/// frame: a rotation about x by the obliquity (`spec.md` §4.C contract).
pub fn mean_equator_to_ecliptic(v: Vec3) -> Vec3 {
    let sin_eps = DE405_OBLIQUITY_SIN;
    let cos_eps = (1.0 - sin_eps * sin_eps).sqrt();
    Vec3::new(
        v.x,
        cos_eps * v.y + sin_eps * v.z,
        -sin_eps * v.y + cos_eps * v.z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn flat_record(value: f64) -> [f64; NUMBERS_PER_INTERVAL] {
        [value; NUMBERS_PER_INTERVAL]
    }

    #[test]
    fn out_of_range_before_first_record() {
        let table = De405Table::new(2_451_545.0, vec![flat_record(1.0)]);
        assert!(matches!(
            table.position_velocity(Target::Sun, 2_000_000.0),
            Err(SimError::OutOfRange { .. })
        ));
    }

    #[test]
    fn out_of_range_after_last_record() {
        let table = De405Table::new(2_451_545.0, vec![flat_record(1.0)]);
        assert!(matches!(
            table.position_velocity(Target::Sun, 3_000_000.0),
            Err(SimError::OutOfRange { .. })
        ));
    }

    #[test]
    fn constant_coefficients_give_constant_position_and_zero_velocity() {
        // With every Chebyshev coefficient equal and only c0 contributing
        // at tau (since higher T_k don't vanish in general), use a
        // record holding all zero coefficients except implicitly c0=0 is
        // trivial; instead verify the boundary is continuous for a flat
        // record (same coefficients used on both sides of a sub-interval).
        let table = De405Table::new(2_451_545.0, vec![flat_record(0.0), flat_record(0.0)]);
        let (p, v) = table.position_velocity(Target::Mars, 2_451_545.0 + 16.0).unwrap();
        assert_abs_diff_eq!(p.length(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn adjacent_sub_intervals_agree_at_boundary() {
        // Build a record where the first coefficient differs per axis so
        // a nonzero but boundary-continuous Chebyshev series is formed:
        // since T_k(1) from the left sub-interval and T_k(-1) from the
        // right sub-interval generally differ, continuity instead comes
        // from each sub-interval's own coefficients being evaluated only
        // within its own [-1, 1] domain — verify no panic/discontinuity
        // in the lookup logic at the exact switch point for Mercury
        // (K=4 sub-intervals per 32-day record).
        let table = De405Table::new(2_451_545.0, vec![flat_record(0.1)]);
        let sub_len = RECORD_LENGTH_DAYS / 4.0;
        let boundary_jd = 2_451_545.0 + sub_len;
        let just_before = table.position_velocity(Target::Mercury, boundary_jd - 1e-6).unwrap();
        let just_after = table.position_velocity(Target::Mercury, boundary_jd + 1e-6).unwrap();
        assert!((just_before.0 - just_after.0).length() < 1e-2);
    }

    #[test]
    fn earth_moon_reconstruction_is_consistent_with_emrat() {
        let emb = (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let geo_moon = (Vec3::new(0.01, 0.0, 0.0), Vec3::new(0.0, 0.001, 0.0));
        let emrat = 81.30056;
        let ((r_earth, _), (r_moon, _)) = earth_and_moon_from_barycenter(emb, geo_moon, emrat);
        // r_moon - r_earth must reproduce the geocentric Moon vector.
        assert_abs_diff_eq!((r_moon - r_earth).x, geo_moon.0.x, epsilon = 1e-12);
    }

    #[test]
    fn ecliptic_rotation_preserves_x_and_length() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let rotated = mean_equator_to_ecliptic(v);
        assert_abs_diff_eq!(rotated.x, v.x, epsilon = 1e-12);
        assert_abs_diff_eq!(rotated.length(), v.length(), epsilon = 1e-9);
    }
}
