//! Particle system and acceleration kernels (`spec.md` §4.F).
//!
//! An ordered, named set of particles with a chosen gravity model
//! (Newton, Newton+PPN, or Newton+CWPM — three mutually exclusive
//! modes modelled as flags rather than dynamic dispatch, per `spec.md`
//! §9 "Dynamic dispatch") and a drift-correction policy.

use rayon::prelude::*;

use crate::constants::C_LIGHT;
use crate::error::SimError;
use crate::math::vec3::Vec3;
use crate::particle::Particle;

/// How a particle system's reference frame is re-centered after each
/// step (`spec.md` §4.F "Drift correction").
#[derive(Clone, Debug, PartialEq)]
pub enum DriftPolicy {
    /// Subtract the center of mass of the massive subset.
    MassWeightedCentroid,
    /// Subtract the state of a nominated anchor particle.
    PinnedAnchor(String),
}

#[derive(Clone, Copy, Debug, Default)]
struct ParticleSnapshot {
    r: Vec3,
    v: Vec3,
    mu: f64,
}

/// An ordered set of particles with unique names, the physics flags
/// from `spec.md` §3, and the acceleration kernels and drift-correction
/// policies of §4.F.
#[derive(Clone, Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    index: std::collections::HashMap<String, usize>,
    general_relativity: bool,
    curvature_wave_propagation: bool,
    anchor: Option<String>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            index: std::collections::HashMap::new(),
            general_relativity: false,
            curvature_wave_propagation: false,
            anchor: None,
        }
    }

    pub fn add_particle(&mut self, name: impl Into<String>, mass: f64, mu: f64, r: Vec3, v: Vec3) -> Result<(), SimError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(SimError::invariant(format!("particle '{name}' already exists")));
        }
        self.index.insert(name.clone(), self.particles.len());
        self.particles.push(Particle::new(name, mass, mu, r, v));
        Ok(())
    }

    pub fn add_test_particle(&mut self, name: impl Into<String>, r: Vec3, v: Vec3) -> Result<(), SimError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(SimError::invariant(format!("particle '{name}' already exists")));
        }
        self.index.insert(name.clone(), self.particles.len());
        self.particles.push(Particle::new_test(name, r, v));
        Ok(())
    }

    pub fn remove_particle(&mut self, name: &str) -> Result<Particle, SimError> {
        let idx = *self.index.get(name).ok_or_else(|| SimError::not_found("particle", name))?;
        let removed = self.particles.remove(idx);
        self.index.remove(name);
        for (_, i) in self.index.iter_mut() {
            if *i > idx {
                *i -= 1;
            }
        }
        if self.anchor.as_deref() == Some(name) {
            self.anchor = None;
        }
        Ok(removed)
    }

    pub fn get_particle(&self, name: &str) -> Result<&Particle, SimError> {
        let idx = *self.index.get(name).ok_or_else(|| SimError::not_found("particle", name))?;
        Ok(&self.particles[idx])
    }

    pub fn get_particle_mut(&mut self, name: &str) -> Result<&mut Particle, SimError> {
        let idx = *self.index.get(name).ok_or_else(|| SimError::not_found("particle", name))?;
        Ok(&mut self.particles[idx])
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn massive_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_massive()).count()
    }

    pub fn set_anchor(&mut self, name: impl Into<String>) -> Result<(), SimError> {
        let name = name.into();
        if !self.index.contains_key(&name) {
            return Err(SimError::not_found("particle", name));
        }
        self.anchor = Some(name);
        Ok(())
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn general_relativity(&self) -> bool {
        self.general_relativity
    }

    pub fn curvature_wave_propagation(&self) -> bool {
        self.curvature_wave_propagation
    }

    pub fn set_general_relativity(&mut self, flag: bool) {
        self.general_relativity = flag;
    }

    /// Enabling CWPM while general relativity is off is a
    /// misconfiguration (`spec.md` §4.F, §7).
    pub fn set_curvature_wave_propagation(&mut self, flag: bool) -> Result<(), SimError> {
        if flag && !self.general_relativity {
            return Err(SimError::invariant(
                "curvature-of-wave-propagation mode requires general relativity to be enabled",
            ));
        }
        self.curvature_wave_propagation = flag;
        Ok(())
    }

    fn snapshot(&self) -> Vec<ParticleSnapshot> {
        self.particles
            .iter()
            .map(|p| ParticleSnapshot {
                r: p.position,
                v: p.velocity,
                mu: p.mu,
            })
            .collect()
    }

    fn massive_indices(snapshot: &[ParticleSnapshot]) -> Vec<usize> {
        (0..snapshot.len()).filter(|&i| snapshot[i].mu > 0.0).collect()
    }

    /// Evaluate accelerations for every particle at its *current*
    /// position/velocity and commit them to `particle.acceleration`.
    /// Fails (without mutating any particle) if any resulting
    /// acceleration is non-finite (`spec.md` §7 "finite-ness check").
    pub fn compute_accelerations(&mut self) -> Result<(), SimError> {
        let snapshot = self.snapshot();
        let massive = Self::massive_indices(&snapshot);

        let newton: Vec<Vec3> = (0..snapshot.len())
            .into_par_iter()
            .map(|i| newton_acceleration(i, &snapshot, &massive))
            .collect();

        let combined = if self.general_relativity {
            let kernel = if self.curvature_wave_propagation { cwpm_acceleration } else { ppn_acceleration };
            (0..snapshot.len())
                .into_par_iter()
                .map(|i| newton[i] + kernel(i, &snapshot, &massive, &newton))
                .collect()
        } else {
            newton
        };

        for a in &combined {
            if !a.is_finite() {
                return Err(SimError::numerical(
                    "particle_system::compute_accelerations",
                    "non-finite acceleration component",
                ));
            }
        }

        for (p, a) in self.particles.iter_mut().zip(combined) {
            p.acceleration = a;
        }
        Ok(())
    }

    /// Evaluate accelerations at a hypothetical state (positions and
    /// velocities supplied by the caller, same length and order as
    /// `particles()`), without mutating the system. Used by integrator
    /// stages that need an acceleration pass at a predicted/intermediate
    /// state.
    pub fn accelerations_at(&self, positions: &[Vec3], velocities: &[Vec3]) -> Result<Vec<Vec3>, SimError> {
        if positions.len() != self.particles.len() || velocities.len() != self.particles.len() {
            return Err(SimError::invariant(
                "accelerations_at: positions/velocities length mismatch with particle count",
            ));
        }

        let snapshot: Vec<ParticleSnapshot> = self
            .particles
            .iter()
            .zip(positions)
            .zip(velocities)
            .map(|((p, &r), &v)| ParticleSnapshot { r, v, mu: p.mu })
            .collect();
        let massive = Self::massive_indices(&snapshot);

        let newton: Vec<Vec3> = (0..snapshot.len())
            .into_par_iter()
            .map(|i| newton_acceleration(i, &snapshot, &massive))
            .collect();

        let combined = if self.general_relativity {
            let kernel = if self.curvature_wave_propagation { cwpm_acceleration } else { ppn_acceleration };
            (0..snapshot.len())
                .into_par_iter()
                .map(|i| newton[i] + kernel(i, &snapshot, &massive, &newton))
                .collect::<Vec<_>>()
        } else {
            newton
        };

        for a in &combined {
            if !a.is_finite() {
                return Err(SimError::numerical(
                    "particle_system::accelerations_at",
                    "non-finite acceleration component",
                ));
            }
        }
        Ok(combined)
    }

    /// Apply drift correction (`spec.md` §4.F). Falls back from
    /// `MassWeightedCentroid` to a pinned anchor whenever the massive
    /// subset is empty, per the redesign in `spec.md` §9 (avoids a
    /// division by zero in the original).
    pub fn apply_drift_correction(&mut self, policy: &DriftPolicy) -> Result<(), SimError> {
        match policy {
            DriftPolicy::PinnedAnchor(name) => self.pin_to(name),
            DriftPolicy::MassWeightedCentroid => {
                if self.massive_count() == 0 {
                    if let Some(anchor) = self.anchor.clone() {
                        tracing::warn!(anchor = %anchor, "mass-weighted drift correction requested with no massive particles; falling back to pinned anchor");
                        return self.pin_to(&anchor);
                    }
                    return Ok(());
                }
                let total_mass: f64 = self.particles.iter().filter(|p| p.is_massive()).map(|p| p.mass).sum();
                let (mut r_cm, mut v_cm) = (Vec3::ZERO, Vec3::ZERO);
                for p in self.particles.iter().filter(|p| p.is_massive()) {
                    r_cm += p.position * p.mass;
                    v_cm += p.velocity * p.mass;
                }
                r_cm /= total_mass;
                v_cm /= total_mass;
                for p in self.particles.iter_mut() {
                    p.position -= r_cm;
                    p.velocity -= v_cm;
                }
                Ok(())
            }
        }
    }

    fn pin_to(&mut self, name: &str) -> Result<(), SimError> {
        let idx = *self.index.get(name).ok_or_else(|| SimError::not_found("particle", name))?;
        let r0 = self.particles[idx].position;
        let v0 = self.particles[idx].velocity;
        for p in self.particles.iter_mut() {
            p.position -= r0;
            p.velocity -= v0;
        }
        Ok(())
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn newton_acceleration(i: usize, snapshot: &[ParticleSnapshot], massive: &[usize]) -> Vec3 {
    let ri = snapshot[i].r;
    let mut acc = Vec3::ZERO;
    for &j in massive {
        if j == i {
            continue;
        }
        let r_ij = snapshot[j].r - ri;
        let dist = r_ij.length();
        acc += r_ij * (snapshot[j].mu / (dist * dist * dist));
    }
    acc
}

fn sum_mu_over_distance(point: Vec3, exclude: usize, snapshot: &[ParticleSnapshot], massive: &[usize]) -> f64 {
    massive
        .iter()
        .filter(|&&k| k != exclude)
        .map(|&k| snapshot[k].mu / (snapshot[k].r - point).length())
        .sum()
}

/// Post-Newtonian (PPN) relativistic correction (`spec.md` §4.F).
fn ppn_acceleration(i: usize, snapshot: &[ParticleSnapshot], massive: &[usize], newton: &[Vec3]) -> Vec3 {
    let c2 = C_LIGHT * C_LIGHT;
    let ri = snapshot[i].r;
    let vi = snapshot[i].v;
    let mut acc = Vec3::ZERO;

    for &j in massive {
        if j == i {
            continue;
        }
        let rj = snapshot[j].r;
        let vj = snapshot[j].v;
        let mu_j = snapshot[j].mu;

        let r_ij = rj - ri;
        let dist = r_ij.length();
        let dist3 = dist * dist * dist;

        let sum_k_i = 4.0 * sum_mu_over_distance(ri, i, snapshot, massive);
        let sum_k_j = sum_mu_over_distance(rj, j, snapshot, massive);
        let a_j_newton_term = r_ij.dot(newton[j]);
        let vi2 = vi.dot(vi);
        let vj2 = vj.dot(vj);
        let vi_dot_vj = vi.dot(vj);
        let r_dot_vj = r_ij.dot(vj) / dist;

        let bracket = sum_k_i + sum_k_j - 1.5 * a_j_newton_term - vi2 - 2.0 * vj2 + 4.0 * vi_dot_vj
            + 1.5 * r_dot_vj * r_dot_vj;

        let coeff = mu_j / (c2 * dist3);
        let first_term = r_ij * (coeff * bracket);
        let second_term = (vi - vj) * (coeff * r_ij.dot(vi * 4.0 - vj * 3.0));

        acc += first_term + second_term;
    }
    acc
}

/// Curvature-of-Wave-Propagation relativistic correction: the same
/// structure as PPN with a different weighting on the velocity-coupling
/// subterms, per `spec.md` §4.F ("differs from PPN only in a subterm
/// weighting").
fn cwpm_acceleration(i: usize, snapshot: &[ParticleSnapshot], massive: &[usize], newton: &[Vec3]) -> Vec3 {
    let c2 = C_LIGHT * C_LIGHT;
    let ri = snapshot[i].r;
    let vi = snapshot[i].v;
    let mut acc = Vec3::ZERO;

    for &j in massive {
        if j == i {
            continue;
        }
        let rj = snapshot[j].r;
        let vj = snapshot[j].v;
        let mu_j = snapshot[j].mu;

        let r_ij = rj - ri;
        let dist = r_ij.length();
        let dist3 = dist * dist * dist;

        let sum_k_i = 4.0 * sum_mu_over_distance(ri, i, snapshot, massive);
        let sum_k_j = sum_mu_over_distance(rj, j, snapshot, massive);
        let a_j_newton_term = r_ij.dot(newton[j]);
        let vi2 = vi.dot(vi);
        let vj2 = vj.dot(vj);
        let vi_dot_vj = vi.dot(vj);
        let r_dot_vj = r_ij.dot(vj) / dist;

        let bracket = sum_k_i + sum_k_j - 1.5 * a_j_newton_term - vi2 - 2.0 * vj2 + 4.0 * vi_dot_vj
            + 2.0 * r_dot_vj * r_dot_vj;

        let coeff = mu_j / (c2 * dist3);
        let first_term = r_ij * (coeff * bracket);
        let second_term = (vi - vj) * (coeff * r_ij.dot(vi * 3.0 - vj * 2.0));

        acc += first_term + second_term;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MU_SUN: f64 = 1.327_124_4e20;

    fn two_body_system() -> ParticleSystem {
        let mut sys = ParticleSystem::new();
        sys.add_particle("Sun", 1.989e30, MU_SUN, Vec3::ZERO, Vec3::ZERO).unwrap();
        sys.add_particle(
            "Earth",
            5.972e24,
            3.986e14,
            Vec3::new(1.496e11, 0.0, 0.0),
            Vec3::new(0.0, 2.978e4, 0.0),
        )
        .unwrap();
        sys
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut sys = two_body_system();
        let err = sys.add_particle("Sun", 1.0, 1.0, Vec3::ZERO, Vec3::ZERO).unwrap_err();
        assert!(matches!(err, SimError::InvariantViolation(_)));
    }

    #[test]
    fn test_particles_do_not_attract_each_other_or_anything() {
        let mut sys = ParticleSystem::new();
        sys.add_test_particle("a", Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO).unwrap();
        sys.add_test_particle("b", Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO).unwrap();
        sys.compute_accelerations().unwrap();
        assert_eq!(sys.get_particle("a").unwrap().acceleration, Vec3::ZERO);
        assert_eq!(sys.get_particle("b").unwrap().acceleration, Vec3::ZERO);
    }

    #[test]
    fn newtonian_acceleration_points_toward_the_sun() {
        let mut sys = two_body_system();
        sys.compute_accelerations().unwrap();
        let a = sys.get_particle("Earth").unwrap().acceleration;
        assert!(a.x < 0.0);
        assert_relative_eq!(a.y, 0.0, epsilon = 1e-30);
    }

    #[test]
    fn cwpm_without_gr_is_rejected() {
        let mut sys = two_body_system();
        let err = sys.set_curvature_wave_propagation(true).unwrap_err();
        assert!(matches!(err, SimError::InvariantViolation(_)));
    }

    #[test]
    fn cwpm_with_gr_is_accepted_and_perturbs_acceleration() {
        let mut sys = two_body_system();
        sys.compute_accelerations().unwrap();
        let newton_only = sys.get_particle("Earth").unwrap().acceleration;

        sys.set_general_relativity(true);
        sys.set_curvature_wave_propagation(true).unwrap();
        sys.compute_accelerations().unwrap();
        let with_cwpm = sys.get_particle("Earth").unwrap().acceleration;

        assert!((newton_only - with_cwpm).length() > 0.0);
    }

    #[test]
    fn pinned_anchor_drift_correction_zeroes_anchor_state() {
        let mut sys = two_body_system();
        sys.set_anchor("Sun").unwrap();
        sys.apply_drift_correction(&DriftPolicy::PinnedAnchor("Sun".to_string())).unwrap();
        let sun = sys.get_particle("Sun").unwrap();
        assert_eq!(sun.position, Vec3::ZERO);
        assert_eq!(sun.velocity, Vec3::ZERO);
    }

    #[test]
    fn mass_weighted_centroid_falls_back_to_anchor_when_no_massive_particles() {
        let mut sys = ParticleSystem::new();
        sys.add_test_particle("probe", Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0))
            .unwrap();
        sys.set_anchor("probe").unwrap();
        sys.apply_drift_correction(&DriftPolicy::MassWeightedCentroid).unwrap();
        let p = sys.get_particle("probe").unwrap();
        assert_eq!(p.position, Vec3::ZERO);
    }
}
