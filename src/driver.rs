//! The composite Solar-System driver (`spec.md` §4.I).
//!
//! Owns the main particle system (Sun, planets, mass-bearing small
//! bodies, and test particles not currently inside a planet's sphere of
//! influence) and a `planet -> subsystem` map of planet-centered
//! ABM4-driven moon systems, grounded on the teacher's
//! `physics/mod.rs::physics_step` sub-step scheduling loop: an outer
//! step of whole seconds, repeated inner sub-steps bounded by a
//! per-body maximum, and a safety check against a degenerate step size.

use std::collections::HashMap;

use crate::catalogue::BodyCatalogue;
use crate::constants::{DAYS_PER_JULIAN_CENTURY, J2000_JD};
use crate::de405::De405Table;
use crate::error::SimError;
use crate::integrators::{rk4, Abm4State};
use crate::math::vec3::Vec3;
use crate::oblateness::{self, OblatenessConfig};
use crate::particle::Particle;
use crate::particle_system::{DriftPolicy, ParticleSystem};
use crate::resolver::EphemerisResolver;
use crate::spk::SpkTable;

/// The nine planets the main system always carries (`spec.md` §4.I
/// "Holds the main particle system M (Sun, planets, selected small
/// bodies)").
const PLANETS: [&str; 9] = [
    "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune", "Pluto",
];

/// Per-planet maximum sub-step, seconds (`spec.md` §4.I "Sub-step
/// selection").
fn default_max_substep_seconds(planet: &str) -> f64 {
    match planet {
        "Jupiter" | "Saturn" | "Uranus" | "Neptune" => 600.0,
        "Pluto" => 300.0,
        "Mars" => 300.0,
        "Earth" => 60.0,
        _ => 600.0,
    }
}

/// Sphere-of-influence radius, meters, for the planets that carry one
/// (`spec.md` §4.I "Spacecraft injection"). Representative patched-conic
/// values; a deployment with stricter requirements supplies its own.
fn sphere_of_influence_radius_m(planet: &str) -> Option<f64> {
    Some(match planet {
        "Mercury" => 1.12e8,
        "Venus" => 6.16e8,
        "Earth" => 9.29e8,
        "Mars" => 5.77e8,
        "Jupiter" => 4.82e10,
        "Saturn" => 5.45e10,
        "Uranus" => 5.18e10,
        "Neptune" => 8.66e10,
        "Pluto" => 3.08e9,
        _ => return None,
    })
}

/// Tunables for one `SolarSystem` run (`spec.md` §2.3 "Configuration").
#[derive(Clone, Debug)]
pub struct DriverConfig {
    pub general_relativity: bool,
    pub curvature_wave_propagation: bool,
    pub oblateness: OblatenessConfig,
    /// Per-planet overrides of `default_max_substep_seconds`.
    pub max_substep_overrides: HashMap<String, f64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            general_relativity: false,
            curvature_wave_propagation: false,
            oblateness: OblatenessConfig::default(),
            max_substep_overrides: HashMap::new(),
        }
    }
}

impl DriverConfig {
    fn max_substep_seconds(&self, planet: &str) -> f64 {
        self.max_substep_overrides
            .get(planet)
            .copied()
            .unwrap_or_else(|| default_max_substep_seconds(planet))
    }
}

/// A planet-centered subsystem: the planet (pinned at the frame's
/// origin) plus its moons, integrated with ABM4 (RK4-bootstrapped),
/// with the J2 perturbation from `oblateness` layered on as an
/// operator-split kick around each sub-step rather than folded into the
/// particle system's own Newton/PPN/CWPM kernel — the kernel's three
/// variants are a closed, construction-time choice (`spec.md` §9
/// "Dynamic dispatch"), and J2 is a fourth, independently-switched term
/// that only a handful of moons ever see.
#[derive(Clone, Debug)]
struct Subsystem {
    particles: ParticleSystem,
    integrator: Abm4State,
    /// The planet's heliocentric `(position, velocity)`, refreshed from
    /// the ephemeris resolver after every sub-step rather than read
    /// from the main system's once-per-outer-step RK4 state (`spec.md`
    /// §4.I "between sub-steps, re-anchor planet state from the
    /// ephemeris resolver").
    planet_absolute: (Vec3, Vec3),
}

/// Where a named particle currently lives.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Location {
    Main,
    Subsystem(String),
}

/// Composite driver for a Sun+planets+moons+spacecraft simulation
/// (`spec.md` §4.I). Holds borrowed, read-only handles to the catalogue
/// and ephemeris sources and owns its particle systems exclusively
/// (`spec.md` §5 "Shared resources").
pub struct SolarSystem<'a> {
    catalogue: &'a BodyCatalogue,
    de405: Option<&'a De405Table>,
    spk: Option<&'a SpkTable>,
    config: DriverConfig,
    date_jd: f64,
    main: ParticleSystem,
    subsystems: HashMap<String, Subsystem>,
}

impl<'a> SolarSystem<'a> {
    pub fn new(
        catalogue: &'a BodyCatalogue,
        de405: Option<&'a De405Table>,
        spk: Option<&'a SpkTable>,
        config: DriverConfig,
    ) -> Self {
        Self {
            catalogue,
            de405,
            spk,
            config,
            date_jd: J2000_JD,
            main: ParticleSystem::new(),
            subsystems: HashMap::new(),
        }
    }

    /// Returns a resolver tied to the data's own lifetime `'a` rather
    /// than to this borrow of `self`, so callers can hold it alongside a
    /// mutable borrow of `self.subsystems` (needed for the per-sub-step
    /// re-anchoring in `advance_single_step`).
    fn resolver(&self) -> EphemerisResolver<'a> {
        EphemerisResolver::new(self.catalogue, self.de405, self.spk)
    }

    pub fn date_jd(&self) -> f64 {
        self.date_jd
    }

    pub fn general_relativity(&self) -> bool {
        self.main.general_relativity()
    }

    pub fn curvature_wave_propagation(&self) -> bool {
        self.main.curvature_wave_propagation()
    }

    /// `initializeSimulation(date)` (`spec.md` §4.I): resets the main
    /// system to the Sun and nine planets, each seeded from the
    /// ephemeris resolver, and drops any previously created subsystems.
    pub fn initialize_simulation(&mut self, date_jd: f64) -> Result<(), SimError> {
        self.date_jd = date_jd;
        self.subsystems.clear();

        let mut main = ParticleSystem::new();
        main.set_general_relativity(self.config.general_relativity);
        main.set_curvature_wave_propagation(self.config.curvature_wave_propagation)?;

        let resolver = EphemerisResolver::new(self.catalogue, self.de405, self.spk);
        for name in std::iter::once("Sun").chain(PLANETS) {
            let body = self.catalogue.body(name)?;
            let (r, v) = resolver.position_velocity(name, date_jd)?;
            main.add_particle(name, body.mass, body.mu, r, v)?;
        }
        main.set_anchor("Sun")?;
        self.main = main;
        tracing::info!(date_jd, "simulation initialized");
        Ok(())
    }

    /// `createPlanetSystem(planet)` (`spec.md` §4.I): expands `planet`
    /// into a subsystem containing the planet (pinned at the origin)
    /// and its moons, seeded relative to the planet from the resolver.
    pub fn create_planet_system(&mut self, planet: &str) -> Result<(), SimError> {
        let planet_body = self.catalogue.body(planet)?;
        let resolver = self.resolver();
        let planet_state = resolver.position_velocity(planet, self.date_jd)?;

        let mut particles = ParticleSystem::new();
        particles.add_particle(planet, planet_body.mass, planet_body.mu, Vec3::ZERO, Vec3::ZERO)?;
        particles.set_anchor(planet)?;

        let moon_names: Vec<String> = self.catalogue.moons_of(planet).map(str::to_string).collect();
        for moon in &moon_names {
            let moon_body = self.catalogue.body(moon)?;
            let (r, v) = resolver.position_velocity(moon, self.date_jd)?;
            let r_rel = r - planet_state.0;
            let v_rel = v - planet_state.1;
            particles.add_particle(moon.clone(), moon_body.mass, moon_body.mu, r_rel, v_rel)?;
        }

        self.subsystems.insert(
            planet.to_string(),
            Subsystem {
                particles,
                integrator: Abm4State::new(),
                planet_absolute: planet_state,
            },
        );
        tracing::info!(planet, moons = moon_names.len(), "planet subsystem created");
        Ok(())
    }

    /// `createSpacecraft(name, date)` (`spec.md` §4.I): a test particle
    /// seeded from the segmented ephemeris, added to the main system (or
    /// directly into a subsystem if it's already inside that planet's
    /// sphere of influence at `date`).
    pub fn create_spacecraft(&mut self, name: &str, date_jd: f64) -> Result<(), SimError> {
        let spk = self.spk.ok_or_else(|| SimError::not_found("segmented ephemeris source", name))?;
        let (center, r, v) = spk.query(name, date_jd)?;
        let (r_abs, v_abs) = if center == "Sun" {
            (r, v)
        } else {
            let (center_r, center_v) = self.resolver().position_velocity(&center, date_jd)?;
            (center_r + r, center_v + v)
        };

        self.main.add_test_particle(name, r_abs, v_abs)?;
        self.migrate_one(name)?;
        tracing::info!(name, "spacecraft created");
        Ok(())
    }

    pub fn get_particle(&self, name: &str) -> Result<&Particle, SimError> {
        match self.locate(name)? {
            Location::Main => self.main.get_particle(name),
            Location::Subsystem(planet) => {
                self.subsystems.get(&planet).expect("located subsystem must exist").particles.get_particle(name)
            }
        }
    }

    /// `getPosition(name)`: absolute (heliocentric) position, composing
    /// a subsystem member's planet-relative position with the
    /// subsystem's resolver-anchored `planet_absolute` reference.
    pub fn get_position(&self, name: &str) -> Result<Vec3, SimError> {
        match self.locate(name)? {
            Location::Main => Ok(self.main.get_particle(name)?.position),
            Location::Subsystem(planet) => {
                let sub = self.subsystems.get(&planet).expect("located subsystem must exist");
                let local_r = sub.particles.get_particle(name)?.position;
                Ok(sub.planet_absolute.0 + local_r)
            }
        }
    }

    fn locate(&self, name: &str) -> Result<Location, SimError> {
        if self.main.get_particle(name).is_ok() {
            return Ok(Location::Main);
        }
        for (planet, sub) in &self.subsystems {
            if sub.particles.get_particle(name).is_ok() {
                return Ok(Location::Subsystem(planet.clone()));
            }
        }
        Err(SimError::not_found("particle", name))
    }

    /// `advanceSingleStep(dt)` (`spec.md` §4.I "Order per outer step").
    pub fn advance_single_step(&mut self, dt_seconds: f64) -> Result<(), SimError> {
        rk4::step(&mut self.main, dt_seconds)?;

        let resolver = self.resolver();
        for (planet, sub) in self.subsystems.iter_mut() {
            let planet_body = self.catalogue.body(planet)?;
            let max_substep = self.config.max_substep_seconds(planet);
            let n = (dt_seconds / max_substep).ceil().max(1.0) as usize;
            let h = dt_seconds / n as f64;
            for i in 0..n {
                let substep_jd = self.date_jd + (i + 1) as f64 * h / crate::constants::SECONDS_PER_DAY;
                let centuries = (substep_jd - J2000_JD) / DAYS_PER_JULIAN_CENTURY;
                step_subsystem(sub, h, planet_body, centuries, &self.config.oblateness, &resolver, substep_jd)?;
            }
        }

        self.main.apply_drift_correction(&DriftPolicy::MassWeightedCentroid)?;

        self.date_jd += dt_seconds / crate::constants::SECONDS_PER_DAY;
        self.migrate_all()?;
        Ok(())
    }

    /// `advanceForward(hours)`: convenience, N steps of 1 h.
    pub fn advance_forward(&mut self, hours: u32) -> Result<(), SimError> {
        for _ in 0..hours {
            self.advance_single_step(3600.0)?;
        }
        Ok(())
    }

    /// Check every spacecraft/test particle against the sphere of
    /// influence of every planet with an active subsystem, migrating it
    /// in or out as needed (`spec.md` §4.I "Spacecraft injection").
    fn migrate_all(&mut self) -> Result<(), SimError> {
        let names: Vec<String> = self
            .main
            .particles()
            .iter()
            .chain(self.subsystems.values().flat_map(|s| s.particles.particles().iter()))
            .filter(|p| !p.is_massive())
            .map(|p| p.name.clone())
            .collect();
        for name in names {
            self.migrate_one(&name)?;
        }
        Ok(())
    }

    fn migrate_one(&mut self, name: &str) -> Result<(), SimError> {
        match self.locate(name)? {
            Location::Main => {
                let p = self.main.get_particle(name)?.clone();
                for planet in PLANETS {
                    let Some(soi) = sphere_of_influence_radius_m(planet) else { continue };
                    let Some(sub) = self.subsystems.get(planet) else { continue };
                    let (planet_r, planet_v) = sub.planet_absolute;
                    if (p.position - planet_r).length() <= soi {
                        self.main.remove_particle(name)?;
                        let sub = self.subsystems.get_mut(planet).unwrap();
                        sub.particles.add_test_particle(name, p.position - planet_r, p.velocity - planet_v)?;
                        tracing::info!(name, planet, "spacecraft entered sphere of influence");
                        return Ok(());
                    }
                }
            }
            Location::Subsystem(planet) => {
                let soi = sphere_of_influence_radius_m(&planet).unwrap_or(f64::INFINITY);
                let p = self.subsystems[&planet].particles.get_particle(name)?.clone();
                if p.position.length() > soi {
                    let (planet_r, planet_v) = self.subsystems[&planet].planet_absolute;
                    self.subsystems.get_mut(&planet).unwrap().particles.remove_particle(name)?;
                    self.main.add_test_particle(name, p.position + planet_r, p.velocity + planet_v)?;
                    tracing::info!(name, planet, "spacecraft left sphere of influence");
                }
            }
        }
        Ok(())
    }

    pub(crate) fn main_system(&self) -> &ParticleSystem {
        &self.main
    }

    pub(crate) fn subsystem_names(&self) -> impl Iterator<Item = &str> {
        self.subsystems.keys().map(String::as_str)
    }

    pub(crate) fn subsystem_particles(&self, planet: &str) -> Option<&ParticleSystem> {
        self.subsystems.get(planet).map(|s| &s.particles)
    }

    /// Rebuild from a loaded snapshot (`persistence::load`): replaces
    /// the date, flags, main system, and every subsystem wholesale. Each
    /// subsystem's ABM4 bootstrap state is inferred from how much of its
    /// particles' history survived the snapshot, so a resumed run
    /// continues straight into the predictor-corrector instead of
    /// re-bootstrapping (`spec.md` §4.J "reproduces subsequent steps
    /// bit-identically").
    pub(crate) fn restore(
        &mut self,
        date_jd: f64,
        main: ParticleSystem,
        subsystems: HashMap<String, ParticleSystem>,
    ) -> Result<(), SimError> {
        self.date_jd = date_jd;
        self.main = main;
        let resolver = self.resolver();
        let mut restored = HashMap::with_capacity(subsystems.len());
        for (planet, particles) in subsystems {
            let bootstrap_done =
                particles.particles().iter().map(|p| p.acceleration_history.len() as u8).min().unwrap_or(0);
            let planet_absolute = resolver.position_velocity(&planet, date_jd)?;
            restored.insert(
                planet,
                Subsystem {
                    particles,
                    integrator: Abm4State::resume(bootstrap_done),
                    planet_absolute,
                },
            );
        }
        self.subsystems = restored;
        Ok(())
    }
}

/// One subsystem sub-step: a half-kick of the J2 perturbation (if any
/// moon is close enough to the planet for `oblateness` to return a
/// nonzero term), the ABM4/RK4-bootstrap step proper, then the closing
/// half-kick evaluated at the new positions (classic kick-drift-kick
/// operator splitting, grounded in `leapfrog::advance`'s same pattern).
fn step_subsystem(
    sub: &mut Subsystem,
    h: f64,
    planet_body: &crate::body::Body,
    centuries_since_j2000: f64,
    oblateness_config: &OblatenessConfig,
    resolver: &EphemerisResolver<'_>,
    substep_jd: f64,
) -> Result<(), SimError> {
    apply_oblateness_half_kick(sub, h, planet_body, centuries_since_j2000, oblateness_config);
    sub.integrator.step(&mut sub.particles, h)?;
    apply_oblateness_half_kick(sub, h, planet_body, centuries_since_j2000, oblateness_config);

    // Discard whatever local drift the moons' reaction imparted on the
    // planet particle this sub-step, then refresh the frame's absolute
    // reference from the ephemeris resolver (`spec.md` §4.I "between
    // sub-steps, re-anchor planet state from the ephemeris resolver").
    sub.particles.apply_drift_correction(&DriftPolicy::PinnedAnchor(planet_body.name.clone()))?;
    sub.planet_absolute = resolver.position_velocity(&planet_body.name, substep_jd)?;
    Ok(())
}

fn apply_oblateness_half_kick(
    sub: &mut Subsystem,
    h: f64,
    planet_body: &crate::body::Body,
    centuries_since_j2000: f64,
    config: &OblatenessConfig,
) {
    for p in sub.particles.particles_mut() {
        if p.name == planet_body.name {
            continue;
        }
        let a = oblateness::perturbation(planet_body, Vec3::ZERO, centuries_since_j2000, p.position, config);
        p.velocity += a * (h / 2.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::J2000_JD;

    fn standard_system(catalogue: &BodyCatalogue) -> SolarSystem<'_> {
        let mut sys = SolarSystem::new(catalogue, None, None, DriverConfig::default());
        sys.initialize_simulation(J2000_JD).unwrap();
        sys
    }

    #[test]
    fn initialize_populates_sun_and_nine_planets() {
        let catalogue = BodyCatalogue::standard();
        let sys = standard_system(&catalogue);
        for name in std::iter::once("Sun").chain(PLANETS) {
            assert!(sys.get_position(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn advance_single_step_moves_earth_and_keeps_sun_near_barycenter() {
        let catalogue = BodyCatalogue::standard();
        let mut sys = standard_system(&catalogue);
        let earth_before = sys.get_position("Earth").unwrap();
        sys.advance_single_step(3600.0).unwrap();
        let earth_after = sys.get_position("Earth").unwrap();
        assert!((earth_after - earth_before).length() > 0.0);
    }

    #[test]
    fn planet_subsystem_moons_track_their_planet() {
        let catalogue = BodyCatalogue::standard();
        let mut sys = standard_system(&catalogue);
        sys.create_planet_system("Jupiter").unwrap();
        assert!(sys.subsystems.contains_key("Jupiter"));

        let jupiter = sys.get_position("Jupiter").unwrap();
        let io = sys.get_position("Io").unwrap();
        assert!((io - jupiter).length() < 5.0e9, "Io should stay close to Jupiter");

        sys.advance_single_step(60.0).unwrap();
        let jupiter_after = sys.get_position("Jupiter").unwrap();
        let io_after = sys.get_position("Io").unwrap();
        assert!((io_after - jupiter_after).length() < 5.0e9);
    }

    #[test]
    fn unknown_particle_is_not_found() {
        let catalogue = BodyCatalogue::standard();
        let sys = standard_system(&catalogue);
        assert!(matches!(sys.get_position("Voyager 1"), Err(SimError::NotFound { .. })));
    }

    #[test]
    fn advance_forward_runs_the_requested_number_of_hourly_steps() {
        let catalogue = BodyCatalogue::standard();
        let mut sys = standard_system(&catalogue);
        let start = sys.date_jd();
        sys.advance_forward(5).unwrap();
        assert!((sys.date_jd() - start - 5.0 / 24.0).abs() < 1e-9);
    }
}
