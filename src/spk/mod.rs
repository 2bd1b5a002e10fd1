//! Segmented ephemeris for spacecraft and named small bodies (`spec.md` §4.D).
//!
//! A minimal, explicit generalization of the teacher's fixed-body
//! binary ephemeris table to an arbitrary named-segment table: each
//! named trajectory is a time-ordered list of `Segment`s, queried by
//! `(name, jd)`.

pub mod segment;

pub use segment::Segment;

use std::collections::HashMap;

use crate::error::SimError;
use crate::math::vec3::Vec3;

/// A table of named trajectories, each a sequence of contiguous or
/// gapped segments.
#[derive(Clone, Debug, Default)]
pub struct SpkTable {
    trajectories: HashMap<String, Vec<Segment>>,
}

impl SpkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a segment to a named trajectory. Segments for a given name
    /// need not be added in time order; `query` searches all of them.
    pub fn add_segment(&mut self, name: impl Into<String>, segment: Segment) {
        self.trajectories.entry(name.into()).or_default().push(segment);
    }

    /// Position and velocity of `name` relative to its segment's
    /// declared center body, at `jd`. Fails with `NotFoundError` if no
    /// trajectory is registered under `name`, or `OutOfRangeError` if no
    /// segment of that trajectory covers `jd`.
    pub fn query(&self, name: &str, jd: f64) -> Result<(String, Vec3, Vec3), SimError> {
        let segments = self
            .trajectories
            .get(name)
            .ok_or_else(|| SimError::not_found("segmented trajectory", name))?;

        let segment = segments
            .iter()
            .find(|s| s.covers(jd))
            .ok_or_else(|| {
                let (low, high) = validity_window(segments);
                SimError::out_of_range("julian date", jd, low, high)
            })?;

        let (r, v) = segment.evaluate(jd)?;
        Ok((segment.center_name.clone(), r, v))
    }

    /// Union validity window `[first, last]` across every segment of a
    /// named trajectory.
    pub fn validity_window(&self, name: &str) -> Result<(f64, f64), SimError> {
        let segments = self
            .trajectories
            .get(name)
            .ok_or_else(|| SimError::not_found("segmented trajectory", name))?;
        Ok(validity_window(segments))
    }
}

fn validity_window(segments: &[Segment]) -> (f64, f64) {
    let low = segments.iter().map(|s| s.t_a).fold(f64::INFINITY, f64::min);
    let high = segments.iter().map(|s| s.t_b).fold(f64::NEG_INFINITY, f64::max);
    (low, high)
}
