//! Error taxonomy for the simulation core.
//!
//! Every fallible public operation returns `Result<_, SimError>`. The
//! core never logs-and-swallows an error and never retries silently;
//! see `spec.md` §7.

use thiserror::Error;

/// The four error kinds surfaced by the simulation core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// A query date fell outside a source's validity window, or an
    /// index was out of bounds.
    #[error("{what} out of range: {value} not in [{low}, {high}]")]
    OutOfRange {
        what: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },

    /// An unknown body, particle, or subsystem name was referenced.
    #[error("not found: {kind} '{name}'")]
    NotFound { kind: &'static str, name: String },

    /// Kepler iteration failed to converge, or a finite-ness check
    /// failed after an acceleration kernel pass.
    #[error("numerical error in {where_}: {detail}")]
    Numerical {
        where_: &'static str,
        detail: String,
    },

    /// Misuse of the API that the type system can't prevent: CWPM
    /// enabled while GR is off, an unknown planet name requested for a
    /// subsystem, a subsystem crossing ownership, etc.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl SimError {
    pub fn out_of_range(what: &'static str, value: f64, low: f64, high: f64) -> Self {
        Self::OutOfRange {
            what,
            value,
            low,
            high,
        }
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn numerical(where_: &'static str, detail: impl Into<String>) -> Self {
        Self::Numerical {
            where_,
            detail: detail.into(),
        }
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::InvariantViolation(detail.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_contains_bounds() {
        let e = SimError::out_of_range("date", 5.0, 0.0, 1.0);
        let msg = e.to_string();
        assert!(msg.contains("5"));
        assert!(msg.contains('0'));
        assert!(msg.contains('1'));
    }

    #[test]
    fn not_found_contains_name() {
        let e = SimError::not_found("body", "Ceres");
        assert!(e.to_string().contains("Ceres"));
    }
}
