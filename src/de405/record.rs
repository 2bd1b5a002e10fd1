//! DE405 record layout (`spec.md` §6 "DE405 record layout").
//!
//! Each 32-day record holds 816 coefficients, laid out target by
//! target in a fixed order, each target's block holding `K`
//! sub-intervals times `N` coefficients times 3 axes.

/// The eleven DE405 targets, in the fixed on-disk order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Mercury,
    Venus,
    EarthMoonBarycenter,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    GeocentricMoon,
    Sun,
}

/// Targets in on-disk order, used to compute cumulative offsets.
pub const TARGET_ORDER: [Target; 11] = [
    Target::Mercury,
    Target::Venus,
    Target::EarthMoonBarycenter,
    Target::Mars,
    Target::Jupiter,
    Target::Saturn,
    Target::Uranus,
    Target::Neptune,
    Target::Pluto,
    Target::GeocentricMoon,
    Target::Sun,
];

/// Total coefficients per 32-day record (`spec.md` §6).
pub const NUMBERS_PER_INTERVAL: usize = 816;

/// Length of one DE405 record, in days.
pub const RECORD_LENGTH_DAYS: f64 = 32.0;

impl Target {
    /// Sub-intervals per 32-day record, and Chebyshev coefficients per
    /// axis per sub-interval, per `spec.md` §6's table.
    pub const fn layout(self) -> (usize, usize) {
        match self {
            Target::Mercury => (4, 14),
            Target::Venus => (2, 10),
            Target::EarthMoonBarycenter => (2, 13),
            Target::Mars => (1, 11),
            Target::Jupiter => (1, 8),
            Target::Saturn => (1, 7),
            Target::Uranus => (1, 6),
            Target::Neptune => (1, 6),
            Target::Pluto => (1, 6),
            Target::GeocentricMoon => (8, 13),
            Target::Sun => (2, 11),
        }
    }

    /// Number of f64s this target's block occupies within a record:
    /// `K * N * 3` (one set of `N` coefficients per axis per
    /// sub-interval).
    pub const fn block_len(self) -> usize {
        let (k, n) = self.layout();
        k * n * 3
    }

    /// Offset of this target's block within a record, in f64s.
    pub fn offset(self) -> usize {
        let mut offset = 0;
        for t in TARGET_ORDER {
            if t == self {
                return offset;
            }
            offset += t.block_len();
        }
        unreachable!("Target::offset called on a target outside TARGET_ORDER")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_sum_to_numbers_per_interval() {
        let total: usize = TARGET_ORDER.iter().map(|t| t.block_len()).sum();
        assert_eq!(total, NUMBERS_PER_INTERVAL);
    }

    #[test]
    fn offsets_are_strictly_increasing_and_non_overlapping() {
        let mut prev_end = 0usize;
        for t in TARGET_ORDER {
            assert_eq!(t.offset(), prev_end, "gap/overlap before {t:?}");
            prev_end += t.block_len();
        }
        assert_eq!(prev_end, NUMBERS_PER_INTERVAL);
    }

    #[test]
    fn mercury_is_first_and_sun_is_last() {
        assert_eq!(Target::Mercury.offset(), 0);
        let sun_end = Target::Sun.offset() + Target::Sun.block_len();
        assert_eq!(sun_end, NUMBERS_PER_INTERVAL);
    }
}
