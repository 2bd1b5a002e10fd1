//! Solar System N-body integrator with DE405 ephemeris comparison.
//!
//! This crate is the numerical core of a Solar System simulator: it
//! integrates the motion of the Sun, planets, major moons, and
//! mass-bearing or test particles (comets, asteroids, spacecraft) under
//! Newtonian and post-Newtonian gravity, and resolves reference state
//! vectors from a layered ephemeris (DE405 Chebyshev series, Keplerian
//! elements, and segmented tables). The 3-D visualization, CLI, and
//! file-format parsers for the raw DE405/SPK data are collaborators
//! outside this crate.

pub mod body;
pub mod catalogue;
pub mod constants;
pub mod de405;
pub mod driver;
pub mod elements;
pub mod error;
pub mod integrators;
pub mod math;
pub mod oblateness;
pub mod particle;
pub mod particle_system;
pub mod persistence;
pub mod resolver;
pub mod spk;

#[cfg(test)]
pub mod test_utils;

pub use error::SimError;
