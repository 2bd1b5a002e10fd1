//! Immutable 3-vector value type.
//!
//! All operations are pure value-to-value transforms; there is no
//! hidden aliasing. We reuse `glam::DVec3` as the underlying
//! representation (bevy's own `bevy::math` is a thin re-export of
//! `glam`, and this crate generalizes the teacher's 2-D `DVec2` usage
//! to full 3-D) and add the handful of operations `spec.md` §4.A names
//! that `glam` doesn't spell the same way.

/// A 3-D vector in meters, meters/second, or a dimensionless direction,
/// depending on context. `Copy` and side-effect free.
pub type Vec3 = glam::DVec3;

/// Euclidean distance between two points.
pub fn distance(a: Vec3, b: Vec3) -> f64 {
    (a - b).length()
}

/// Angle between two vectors, in degrees, in `[0, 180]`.
///
/// Returns `0.0` if either vector has (numerically) zero length, since
/// the angle between a vector and the zero vector is undefined and
/// callers in this crate only ever hit that case for degenerate test
/// particles.
pub fn angle_between_degrees(a: Vec3, b: Vec3) -> f64 {
    let la = a.length();
    let lb = b.length();
    if la < 1e-300 || lb < 1e-300 {
        return 0.0;
    }
    let cos_theta = (a.dot(b) / (la * lb)).clamp(-1.0, 1.0);
    cos_theta.acos().to_degrees()
}
