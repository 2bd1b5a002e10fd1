//! Adams-Bashforth-Moulton 4th-order predictor-corrector (`spec.md` §4.G).
//!
//! Needs the last four accelerations (and, for the position update,
//! velocities) per particle. The first four calls bootstrap that
//! history with RK4 steps; `Abm4State` tracks how many bootstrap steps
//! have run and is reset (and the particle history flushed) whenever
//! the caller's timestep changes sign or magnitude, per `spec.md` §3
//! "ABM4 history".

use crate::error::SimError;
use crate::integrators::rk4;
use crate::particle_system::ParticleSystem;

const BOOTSTRAP_STEPS: u8 = 4;

/// Bootstrap/flush tracking for one particle system's ABM4 run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Abm4State {
    bootstrap_done: u8,
    last_dt: Option<f64>,
}

impl Abm4State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrap_done >= BOOTSTRAP_STEPS
    }

    /// Resume tracking for a particle system whose history was restored
    /// from a snapshot rather than built up by live bootstrap steps
    /// (`spec.md` §4.J). `bootstrap_done` should be the shortest history
    /// length found among the system's particles, so a partially-full
    /// history still finishes bootstrapping instead of claiming more
    /// history than actually exists.
    pub fn resume(bootstrap_done: u8) -> Self {
        Self {
            bootstrap_done: bootstrap_done.min(BOOTSTRAP_STEPS),
            last_dt: None,
        }
    }

    /// Flush the bootstrap/history state — called when `dt` changes
    /// sign or magnitude from the previous call.
    pub fn reset(&mut self, system: &mut ParticleSystem) {
        self.bootstrap_done = 0;
        self.last_dt = None;
        for p in system.particles_mut() {
            p.acceleration_history.clear();
            p.velocity_history.clear();
        }
    }

    /// Advance one sub-step: RK4 while bootstrapping, ABM4
    /// predictor-corrector once four history entries exist.
    pub fn step(&mut self, system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
        if let Some(last_dt) = self.last_dt {
            if (dt > 0.0) != (last_dt > 0.0) || (dt - last_dt).abs() > 1e-9 * last_dt.abs().max(1.0) {
                self.reset(system);
            }
        }
        self.last_dt = Some(dt);

        if !self.is_bootstrapped() {
            self.bootstrap_step(system, dt)
        } else {
            predictor_corrector_step(system, dt)
        }
    }

    fn bootstrap_step(&mut self, system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
        system.compute_accelerations()?;
        for p in system.particles_mut() {
            p.acceleration_history.push(p.acceleration);
            p.velocity_history.push(p.velocity);
        }
        rk4::step(system, dt)?;
        self.bootstrap_done += 1;
        Ok(())
    }
}

/// Predictor: `r_{n+1} = r_n + dt/24 (55 v_n - 59 v_{n-1} + 37 v_{n-2} - 9 v_{n-3})`,
/// same pattern for `v` using the acceleration history; evaluate
/// acceleration at the predicted state; corrector: `r_{n+1} = r_n +
/// dt/24 (9 v_{n+1} + 19 v_n - 5 v_{n-1} + v_{n-2})` using the
/// *corrected* `v_{n+1}`, similarly for `v` using the predicted
/// acceleration. Commit, then re-evaluate acceleration at the
/// committed state and rotate both histories (`spec.md` §4.G "ABM4").
fn predictor_corrector_step(system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
    let predicted: Vec<(crate::math::vec3::Vec3, crate::math::vec3::Vec3)> = system
        .particles()
        .iter()
        .map(|p| {
            let v = &p.velocity_history;
            let a = &p.acceleration_history;
            let (v0, v1, v2, v3) = (v.get(0).unwrap(), v.get(1).unwrap(), v.get(2).unwrap(), v.get(3).unwrap());
            let (a0, a1, a2, a3) = (a.get(0).unwrap(), a.get(1).unwrap(), a.get(2).unwrap(), a.get(3).unwrap());

            let r_pred = p.position + (dt / 24.0) * (v0 * 55.0 - v1 * 59.0 + v2 * 37.0 - v3 * 9.0);
            let v_pred = p.velocity + (dt / 24.0) * (a0 * 55.0 - a1 * 59.0 + a2 * 37.0 - a3 * 9.0);
            (r_pred, v_pred)
        })
        .collect();

    let positions: Vec<_> = predicted.iter().map(|(r, _)| *r).collect();
    let velocities: Vec<_> = predicted.iter().map(|(_, v)| *v).collect();
    let predicted_accel = system.accelerations_at(&positions, &velocities)?;

    let corrected: Vec<(crate::math::vec3::Vec3, crate::math::vec3::Vec3)> = system
        .particles()
        .iter()
        .zip(predicted_accel.iter())
        .map(|(p, a_pred)| {
            let v = &p.velocity_history;
            let a = &p.acceleration_history;
            let (v0, v1, v2) = (v.get(0).unwrap(), v.get(1).unwrap(), v.get(2).unwrap());
            let (a0, a1, a2) = (a.get(0).unwrap(), a.get(1).unwrap(), a.get(2).unwrap());

            let v_next = p.velocity + (dt / 24.0) * (*a_pred * 9.0 + a0 * 19.0 - a1 * 5.0 + a2);
            let r_next = p.position + (dt / 24.0) * (v_next * 9.0 + v0 * 19.0 - v1 * 5.0 + v2);
            (r_next, v_next)
        })
        .collect();

    for (p, (r_next, v_next)) in system.particles_mut().iter_mut().zip(corrected.iter()) {
        p.position = *r_next;
        p.velocity = *v_next;
    }

    system.compute_accelerations()?;

    for p in system.particles_mut() {
        p.acceleration_history.push(p.acceleration);
        p.velocity_history.push(p.velocity);
    }
    Ok(())
}
