//! End-to-end tests over the composite driver (`spec.md` §4.I, §8).
//!
//! These exercise the driver, the resolver, and persistence together
//! without DE405/SPK data files attached, so every body is seeded from
//! the catalogue's Keplerian element tables. The golden historical
//! DE405-comparison scenarios from `spec.md` §8 need the real binary
//! ephemeris files and are out of scope here.

use approx::assert_relative_eq;
use orrery::catalogue::BodyCatalogue;
use orrery::constants::J2000_JD;
use orrery::driver::{DriverConfig, SolarSystem};
use orrery::math::vec3::Vec3;
use orrery::particle::Particle;
use orrery::persistence;

const SUN_AND_PLANETS: [&str; 10] =
    ["Sun", "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune", "Pluto"];

fn main_particles(sys: &SolarSystem<'_>) -> Vec<Particle> {
    SUN_AND_PLANETS.iter().map(|name| sys.get_particle(name).unwrap().clone()).collect()
}

/// Total Newtonian kinetic plus pairwise potential energy of the
/// Sun-and-planets subset, conserved absent an external perturbation.
fn total_energy(particles: &[Particle]) -> f64 {
    let mut kinetic = 0.0;
    let mut potential = 0.0;
    for (i, p) in particles.iter().enumerate() {
        kinetic += 0.5 * p.mass * p.velocity.length_squared();
        for q in &particles[i + 1..] {
            let g_mu_m = p.mu * q.mass;
            potential -= g_mu_m / (p.position - q.position).length();
        }
    }
    kinetic + potential
}

fn total_angular_momentum(particles: &[Particle]) -> Vec3 {
    particles.iter().map(|p| p.position.cross(p.velocity) * p.mass).fold(Vec3::ZERO, |acc, l| acc + l)
}

#[test]
fn main_system_conserves_energy_and_angular_momentum_over_a_week() {
    let catalogue = BodyCatalogue::standard();
    let mut sys = SolarSystem::new(&catalogue, None, None, DriverConfig::default());
    sys.initialize_simulation(J2000_JD).unwrap();

    let initial_energy = total_energy(&main_particles(&sys));
    let initial_l = total_angular_momentum(&main_particles(&sys));

    sys.advance_forward(24 * 7).unwrap();

    let final_energy = total_energy(&main_particles(&sys));
    let final_l = total_angular_momentum(&main_particles(&sys));

    let energy_drift = ((final_energy - initial_energy) / initial_energy).abs();
    assert!(energy_drift < 1e-4, "energy drift {energy_drift}");

    let l_drift = ((final_l.length() - initial_l.length()) / initial_l.length()).abs();
    assert!(l_drift < 1e-6, "angular momentum drift {l_drift}");
}

#[test]
fn planets_stay_near_their_catalogue_semi_major_axis_over_a_month() {
    let catalogue = BodyCatalogue::standard();
    let mut sys = SolarSystem::new(&catalogue, None, None, DriverConfig::default());
    sys.initialize_simulation(J2000_JD).unwrap();

    let earth_before = sys.get_position("Earth").unwrap().length();
    sys.advance_forward(24 * 30).unwrap();
    let earth_after = sys.get_position("Earth").unwrap().length();

    assert_relative_eq!(earth_after, earth_before, max_relative = 0.05);
}

#[test]
fn planet_subsystem_round_trips_through_a_snapshot_and_continues_bit_identically() {
    let catalogue = BodyCatalogue::standard();
    let mut sys = SolarSystem::new(&catalogue, None, None, DriverConfig::default());
    sys.initialize_simulation(J2000_JD).unwrap();
    sys.create_planet_system("Jupiter").unwrap();
    sys.advance_forward(6).unwrap();

    let mut bytes = Vec::new();
    persistence::save(&sys, &mut bytes).unwrap();
    let mut reloaded = persistence::load(&catalogue, None, None, &mut bytes.as_slice()).unwrap();

    // Continue both runs by the same further step and compare exactly:
    // a snapshot must not perturb the trajectory it resumes.
    sys.advance_single_step(3600.0).unwrap();
    reloaded.advance_single_step(3600.0).unwrap();

    assert_eq!(sys.get_position("Io").unwrap(), reloaded.get_position("Io").unwrap());
    assert_eq!(sys.get_position("Jupiter").unwrap(), reloaded.get_position("Jupiter").unwrap());
    assert_eq!(sys.date_jd(), reloaded.date_jd());
}

#[test]
fn general_relativity_perturbs_mercurys_trajectory_relative_to_newtonian() {
    let catalogue = BodyCatalogue::standard();

    let mut newtonian = SolarSystem::new(&catalogue, None, None, DriverConfig::default());
    newtonian.initialize_simulation(J2000_JD).unwrap();

    let mut relativistic = SolarSystem::new(
        &catalogue,
        None,
        None,
        DriverConfig {
            general_relativity: true,
            ..DriverConfig::default()
        },
    );
    relativistic.initialize_simulation(J2000_JD).unwrap();

    newtonian.advance_forward(24 * 10).unwrap();
    relativistic.advance_forward(24 * 10).unwrap();

    let diff = (newtonian.get_position("Mercury").unwrap() - relativistic.get_position("Mercury").unwrap()).length();
    assert!(diff > 0.0, "GR correction should perturb Mercury's trajectory");
}
