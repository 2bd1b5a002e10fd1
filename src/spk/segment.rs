//! A single SPK-like ephemeris segment (`spec.md` §4.D).
//!
//! Each segment covers a closed time window `[t_a, t_b]` and stores the
//! state (position and velocity) at both endpoints; interior queries use
//! cubic Hermite interpolation, which reproduces the endpoint states
//! exactly and is automatically C1-continuous across a chain of
//! abutting segments (`spec.md` §4.D "contiguous" boundary condition).

use crate::error::SimError;
use crate::math::vec3::Vec3;

/// One segment of a named trajectory, relative to a declared center
/// body.
#[derive(Clone, Debug)]
pub struct Segment {
    pub center_name: String,
    pub center_id: i32,
    pub target_name: String,
    pub target_id: i32,
    pub t_a: f64,
    pub t_b: f64,
    pub r_a: Vec3,
    pub v_a: Vec3,
    pub r_b: Vec3,
    pub v_b: Vec3,
}

impl Segment {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        center_name: impl Into<String>,
        center_id: i32,
        target_name: impl Into<String>,
        target_id: i32,
        t_a: f64,
        t_b: f64,
        r_a: Vec3,
        v_a: Vec3,
        r_b: Vec3,
        v_b: Vec3,
    ) -> Self {
        Self {
            center_name: center_name.into(),
            center_id,
            target_name: target_name.into(),
            target_id,
            t_a,
            t_b,
            r_a,
            v_a,
            r_b,
            v_b,
        }
    }

    pub fn covers(&self, jd: f64) -> bool {
        jd >= self.t_a && jd <= self.t_b
    }

    /// Evaluate position and velocity at `jd` via cubic Hermite
    /// interpolation between the segment's endpoint states.
    pub fn evaluate(&self, jd: f64) -> Result<(Vec3, Vec3), SimError> {
        if !self.covers(jd) {
            return Err(SimError::out_of_range("julian date", jd, self.t_a, self.t_b));
        }

        let dt = self.t_b - self.t_a;
        if dt <= 0.0 {
            return Err(SimError::invariant(format!(
                "segment for '{}' has non-positive duration (t_a={}, t_b={})",
                self.target_name, self.t_a, self.t_b
            )));
        }

        let s = (jd - self.t_a) / dt;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        let position = self.r_a * h00 + self.v_a * (dt * h10) + self.r_b * h01 + self.v_b * (dt * h11);

        let dh00_ds = 6.0 * s2 - 6.0 * s;
        let dh10_ds = 3.0 * s2 - 4.0 * s + 1.0;
        let dh01_ds = -6.0 * s2 + 6.0 * s;
        let dh11_ds = 3.0 * s2 - 2.0 * s;

        let velocity =
            self.r_a * (dh00_ds / dt) + self.v_a * dh10_ds + self.r_b * (dh01_ds / dt) + self.v_b * dh11_ds;

        Ok((position, velocity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample_segment() -> Segment {
        Segment::new(
            "Sun",
            10,
            "Voyager 1",
            -31,
            2_443_383.0,
            2_443_384.0,
            Vec3::new(1.0e11, 0.0, 0.0),
            Vec3::new(0.0, 3.0e4, 0.0),
            Vec3::new(1.0e11 + 2.592e9, 3.0e4 * 86_400.0, 0.0),
            Vec3::new(5.0, 3.0e4, 0.0),
        )
    }

    #[test]
    fn evaluate_reproduces_left_endpoint_state_exactly() {
        let seg = sample_segment();
        let (r, v) = seg.evaluate(seg.t_a).unwrap();
        assert_abs_diff_eq!((r - seg.r_a).length(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!((v - seg.v_a).length(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn evaluate_reproduces_right_endpoint_state_exactly() {
        let seg = sample_segment();
        let (r, v) = seg.evaluate(seg.t_b).unwrap();
        assert_abs_diff_eq!((r - seg.r_b).length(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!((v - seg.v_b).length(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn out_of_window_is_out_of_range_error() {
        let seg = sample_segment();
        assert!(matches!(seg.evaluate(seg.t_a - 1.0), Err(SimError::OutOfRange { .. })));
        assert!(matches!(seg.evaluate(seg.t_b + 1.0), Err(SimError::OutOfRange { .. })));
    }
}
