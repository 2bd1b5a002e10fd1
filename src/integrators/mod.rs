//! Integrators (`spec.md` §4.G).
//!
//! Leapfrog, RK4, and ABM4 operate on the same `ParticleSystem`
//! interface. Modelled as a tagged variant rather than dynamic dispatch
//! (`spec.md` §9 "Dynamic dispatch"): a particle system's integrator is
//! chosen at construction, and runtime switching is only allowed at
//! step boundaries.

pub mod abm4;
pub mod leapfrog;
pub mod rk4;

pub use abm4::Abm4State;

use crate::error::SimError;
use crate::particle_system::ParticleSystem;

/// Which of the three integration schemes drives a particle system.
#[derive(Clone, Debug)]
pub enum Integrator {
    Leapfrog { initialized: bool },
    Rk4,
    Abm4(Abm4State),
}

impl Integrator {
    pub fn leapfrog() -> Self {
        Integrator::Leapfrog { initialized: false }
    }

    pub fn rk4() -> Self {
        Integrator::Rk4
    }

    pub fn abm4() -> Self {
        Integrator::Abm4(Abm4State::new())
    }

    /// Advance `system` by one step of `dt`, dispatching to the
    /// selected scheme. Leapfrog lazily runs its init half-kick on the
    /// first call.
    pub fn step(&mut self, system: &mut ParticleSystem, dt: f64) -> Result<(), SimError> {
        match self {
            Integrator::Leapfrog { initialized } => {
                if !*initialized {
                    leapfrog::init(system, dt)?;
                    *initialized = true;
                }
                leapfrog::advance(system, dt)
            }
            Integrator::Rk4 => rk4::step(system, dt),
            Integrator::Abm4(state) => state.step(system, dt),
        }
    }
}
