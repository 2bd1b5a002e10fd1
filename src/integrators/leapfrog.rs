//! Leapfrog (kick-drift-kick) integrator (`spec.md` §4.G).
//!
//! Symplectic: exposed as an explicit init + advance pair because
//! drift-less long-term tests rely on the half-step-offset velocity
//! convention holding from the very first step.

use crate::error::SimError;
use crate::particle_system::ParticleSystem;

/// `initLeapfrog`: offset every particle's velocity by `-dt/2 * a` so
/// that subsequent integer-step velocities are half a step behind
/// positions.
pub fn init(system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
    system.compute_accelerations()?;
    for p in system.particles_mut() {
        p.velocity -= p.acceleration * (dt / 2.0);
    }
    Ok(())
}

/// `advance`: `v <- v + dt*a(r); r <- r + dt*v`.
pub fn advance(system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
    system.compute_accelerations()?;
    for p in system.particles_mut() {
        p.velocity += p.acceleration * dt;
        p.position += p.velocity * dt;
    }
    Ok(())
}
