//! Classical 4-stage Runge-Kutta integrator (`spec.md` §4.G).
//!
//! Four staged methods (A/B/C/D), each following a fresh system-wide
//! acceleration pass so inter-particle accelerations stay consistent
//! across the whole system at every stage (`spec.md` §5 "Ordering
//! guarantees": stages evaluated in strict A -> B -> C -> D order).

use crate::error::SimError;
use crate::particle_system::ParticleSystem;

/// Stage A: snapshot `(r0, v0)`, evaluate `k1 = (v0, a(r0))`, and
/// advance the system to the midpoint state for stage B's acceleration
/// pass.
pub fn stage_a(system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
    system.compute_accelerations()?;
    for p in system.particles_mut() {
        let r0 = p.position;
        let v0 = p.velocity;
        let a0 = p.acceleration;
        p.rk4_scratch.r0 = r0;
        p.rk4_scratch.v0 = v0;
        p.rk4_scratch.k1 = (v0, a0);
        p.position = r0 + v0 * (dt / 2.0);
        p.velocity = v0 + a0 * (dt / 2.0);
    }
    Ok(())
}

/// Stage B: evaluate `k2` at the midpoint reached by stage A, advance
/// again to a (possibly different) midpoint for stage C.
pub fn stage_b(system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
    system.compute_accelerations()?;
    for p in system.particles_mut() {
        let v = p.velocity;
        let a = p.acceleration;
        p.rk4_scratch.k2 = (v, a);
        let r0 = p.rk4_scratch.r0;
        let v0 = p.rk4_scratch.v0;
        p.position = r0 + v * (dt / 2.0);
        p.velocity = v0 + a * (dt / 2.0);
    }
    Ok(())
}

/// Stage C: evaluate `k3` at stage B's midpoint, advance to the
/// full-step endpoint for stage D.
pub fn stage_c(system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
    system.compute_accelerations()?;
    for p in system.particles_mut() {
        let v = p.velocity;
        let a = p.acceleration;
        p.rk4_scratch.k3 = (v, a);
        let r0 = p.rk4_scratch.r0;
        let v0 = p.rk4_scratch.v0;
        p.position = r0 + v * dt;
        p.velocity = v0 + a * dt;
    }
    Ok(())
}

/// Stage D: evaluate `k4` at the full-step endpoint and combine all
/// four stages into the committed step.
pub fn stage_d(system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
    system.compute_accelerations()?;
    for p in system.particles_mut() {
        let v = p.velocity;
        let a = p.acceleration;
        p.rk4_scratch.k4 = (v, a);

        let r0 = p.rk4_scratch.r0;
        let v0 = p.rk4_scratch.v0;
        let (k1_r, k1_v) = p.rk4_scratch.k1;
        let (k2_r, k2_v) = p.rk4_scratch.k2;
        let (k3_r, k3_v) = p.rk4_scratch.k3;
        let (k4_r, k4_v) = p.rk4_scratch.k4;

        p.position = r0 + (dt / 6.0) * (k1_r + k2_r * 2.0 + k3_r * 2.0 + k4_r);
        p.velocity = v0 + (dt / 6.0) * (k1_v + k2_v * 2.0 + k3_v * 2.0 + k4_v);
    }
    Ok(())
}

/// Run one full RK4 step (stages A through D in order).
pub fn step(system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
    stage_a(system, dt)?;
    stage_b(system, dt)?;
    stage_c(system, dt)?;
    stage_d(system, dt)?;
    Ok(())
}
