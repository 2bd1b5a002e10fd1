//! Body-parameter catalogue: a read-only, explicitly injected handle
//! (`spec.md` §9 "Singletons" / "Mutable global state").
//!
//! Constructed once from static data tables and passed by reference
//! into every collaborator that needs it — never an ambient global.

use std::collections::HashMap;

use crate::body::{Body, Oblateness};
use crate::constants::{AU, G};
use crate::elements::{ElementRates, KeplerianElements, OrbitModel};
use crate::error::SimError;
use crate::math::vec3::Vec3;

/// A read-only catalogue of body parameters and the Keplerian orbit
/// models used as the approximate/fallback ephemeris source for
/// planets (outside the DE405 window), moons, comets, and asteroids.
#[derive(Clone, Debug)]
pub struct BodyCatalogue {
    bodies: HashMap<String, Body>,
    orbit_models: HashMap<String, OrbitModel>,
    parents: HashMap<String, String>,
}

impl BodyCatalogue {
    pub fn body(&self, name: &str) -> Result<&Body, SimError> {
        self.bodies.get(name).ok_or_else(|| SimError::not_found("body", name))
    }

    pub fn orbit_model(&self, name: &str) -> Result<&OrbitModel, SimError> {
        self.orbit_models
            .get(name)
            .ok_or_else(|| SimError::not_found("orbit model", name))
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.parents.get(name).map(String::as_str)
    }

    /// The names of every body whose parent is `planet`, in no
    /// particular order (used by the driver to expand a planet into a
    /// subsystem, `spec.md` §4.I).
    pub fn moons_of<'a>(&'a self, planet: &'a str) -> impl Iterator<Item = &'a str> {
        self.parents.iter().filter(move |(_, p)| p.as_str() == planet).map(|(name, _)| name.as_str())
    }

    pub fn all_bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn oblate_bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values().filter(|b| b.is_oblate())
    }

    /// The standard Solar System catalogue: Sun, the nine DE405 bodies
    /// (Mercury through Pluto), five major moons, and a comet, each with
    /// approximate orbital elements for the Keplerian fallback source.
    /// Numeric values are representative (JPL-style, epoch J2000) rather
    /// than reproductions of a specific published table; a deployment
    /// that needs DE405-exact planetary secular rates supplies its own
    /// catalogue built the same way.
    pub fn standard() -> Self {
        let mut bodies = HashMap::new();
        let mut orbit_models = HashMap::new();
        let mut parents = HashMap::new();

        let sun_mass = 1.988_47e30;
        bodies.insert(
            "Sun".to_string(),
            Body::new("Sun", 1.3914e9, sun_mass, G * sun_mass),
        );

        struct PlanetSpec {
            name: &'static str,
            diameter_m: f64,
            mass_kg: f64,
            a_au: f64,
            e: f64,
            i_deg: f64,
            raan_deg: f64,
            long_peri_deg: f64,
            mean_longitude_deg: f64,
            mean_longitude_rate_deg_per_century: f64,
            oblateness: Option<(f64, f64)>, // (J2, equatorial radius m)
        }

        let planets = [
            PlanetSpec {
                name: "Mercury",
                diameter_m: 4_879_400.0,
                mass_kg: 3.3011e23,
                a_au: 0.387_098,
                e: 0.205_630,
                i_deg: 7.005,
                raan_deg: 48.331,
                long_peri_deg: 77.456,
                mean_longitude_deg: 252.251,
                mean_longitude_rate_deg_per_century: 149472.674,
                oblateness: None,
            },
            PlanetSpec {
                name: "Venus",
                diameter_m: 12_104_000.0,
                mass_kg: 4.8675e24,
                a_au: 0.723_332,
                e: 0.006_772,
                i_deg: 3.39458,
                raan_deg: 76.680,
                long_peri_deg: 131.532,
                mean_longitude_deg: 181.980,
                mean_longitude_rate_deg_per_century: 58517.818,
                oblateness: None,
            },
            PlanetSpec {
                name: "Earth",
                diameter_m: 12_742_000.0,
                mass_kg: 5.9722e24,
                a_au: 1.000_001,
                e: 0.016_709,
                i_deg: 0.0,
                raan_deg: 0.0,
                long_peri_deg: 102.937,
                mean_longitude_deg: 100.464,
                mean_longitude_rate_deg_per_century: 35999.373,
                oblateness: Some((1.082_63e-3, 6_378_137.0)),
            },
            PlanetSpec {
                name: "Mars",
                diameter_m: 6_779_000.0,
                mass_kg: 6.4171e23,
                a_au: 1.523_679,
                e: 0.093_41,
                i_deg: 1.850,
                raan_deg: 49.558,
                long_peri_deg: 336.060,
                mean_longitude_deg: 355.453,
                mean_longitude_rate_deg_per_century: 19140.299,
                oblateness: None,
            },
            PlanetSpec {
                name: "Jupiter",
                diameter_m: 139_820_000.0,
                mass_kg: 1.8982e27,
                a_au: 5.2044,
                e: 0.0489,
                i_deg: 1.303,
                raan_deg: 100.464,
                long_peri_deg: 14.729,
                mean_longitude_deg: 34.396,
                mean_longitude_rate_deg_per_century: 3034.906,
                oblateness: Some((1.469_6e-2, 71_492_000.0)),
            },
            PlanetSpec {
                name: "Saturn",
                diameter_m: 116_460_000.0,
                mass_kg: 5.6834e26,
                a_au: 9.5826,
                e: 0.0565,
                i_deg: 2.485,
                raan_deg: 113.665,
                long_peri_deg: 92.432,
                mean_longitude_deg: 49.954,
                mean_longitude_rate_deg_per_century: 1222.114,
                oblateness: Some((1.629_1e-2, 60_268_000.0)),
            },
            PlanetSpec {
                name: "Uranus",
                diameter_m: 50_724_000.0,
                mass_kg: 8.6810e25,
                a_au: 19.2184,
                e: 0.0457,
                i_deg: 0.772,
                raan_deg: 74.006,
                long_peri_deg: 170.964,
                mean_longitude_deg: 313.238,
                mean_longitude_rate_deg_per_century: 428.483,
                oblateness: Some((3.343_4e-3, 25_559_000.0)),
            },
            PlanetSpec {
                name: "Neptune",
                diameter_m: 49_244_000.0,
                mass_kg: 1.024_13e26,
                a_au: 30.1104,
                e: 0.0113,
                i_deg: 1.770,
                raan_deg: 131.784,
                long_peri_deg: 44.971,
                mean_longitude_deg: 304.880,
                mean_longitude_rate_deg_per_century: 218.486,
                oblateness: Some((3.411e-3, 24_764_000.0)),
            },
            PlanetSpec {
                name: "Pluto",
                diameter_m: 2_376_600.0,
                mass_kg: 1.303e22,
                a_au: 39.482,
                e: 0.2488,
                i_deg: 17.16,
                raan_deg: 110.299,
                long_peri_deg: 224.07,
                mean_longitude_deg: 238.93,
                mean_longitude_rate_deg_per_century: 145.18,
                oblateness: None,
            },
        ];

        for p in &planets {
            let mu = G * p.mass_kg;
            let mut body = Body::new(p.name, p.diameter_m, p.mass_kg, mu);
            if let Some((j2, req)) = p.oblateness {
                body = body.with_oblateness(Oblateness {
                    j2,
                    equatorial_radius: req,
                    pole_at_j2000: Vec3::new(0.0, 0.0, 1.0),
                    pole_precession_rate: 0.0,
                });
            }
            bodies.insert(p.name.to_string(), body);

            let elements = KeplerianElements {
                semi_major_axis: p.a_au * AU,
                eccentricity: p.e,
                inclination: p.i_deg.to_radians(),
                ascending_node: p.raan_deg.to_radians(),
                long_peri: p.long_peri_deg.to_radians(),
                mean_longitude: p.mean_longitude_deg.to_radians(),
            };
            let rates = ElementRates {
                mean_longitude: p.mean_longitude_rate_deg_per_century.to_radians(),
                ..Default::default()
            };
            orbit_models.insert(p.name.to_string(), OrbitModel::new(elements, rates));
        }

        struct MoonSpec {
            name: &'static str,
            parent: &'static str,
            diameter_m: f64,
            mass_kg: f64,
            a_km: f64,
            e: f64,
            i_deg: f64,
            period_days: f64,
        }

        let moons = [
            MoonSpec {
                name: "Moon",
                parent: "Earth",
                diameter_m: 3_474_800.0,
                mass_kg: 7.342e22,
                a_km: 384_399.0,
                e: 0.0549,
                i_deg: 5.145,
                period_days: 27.321_582,
            },
            MoonSpec {
                name: "Io",
                parent: "Jupiter",
                diameter_m: 3_643_200.0,
                mass_kg: 8.9319e22,
                a_km: 421_800.0,
                e: 0.0041,
                i_deg: 0.036,
                period_days: 1.769_138,
            },
            MoonSpec {
                name: "Europa",
                parent: "Jupiter",
                diameter_m: 3_121_600.0,
                mass_kg: 4.7998e22,
                a_km: 671_100.0,
                e: 0.009,
                i_deg: 0.466,
                period_days: 3.551_181,
            },
            MoonSpec {
                name: "Ganymede",
                parent: "Jupiter",
                diameter_m: 5_268_200.0,
                mass_kg: 1.4819e23,
                a_km: 1_070_400.0,
                e: 0.0013,
                i_deg: 0.177,
                period_days: 7.154_553,
            },
            MoonSpec {
                name: "Callisto",
                parent: "Jupiter",
                diameter_m: 4_820_600.0,
                mass_kg: 1.0759e23,
                a_km: 1_882_700.0,
                e: 0.0074,
                i_deg: 0.192,
                period_days: 16.689_018,
            },
            MoonSpec {
                name: "Titan",
                parent: "Saturn",
                diameter_m: 5_149_460.0,
                mass_kg: 1.3452e23,
                a_km: 1_221_870.0,
                e: 0.0288,
                i_deg: 0.348,
                period_days: 15.945,
            },
        ];

        for m in &moons {
            let mu = G * m.mass_kg;
            bodies.insert(m.name.to_string(), Body::new(m.name, m.diameter_m, m.mass_kg, mu));
            parents.insert(m.name.to_string(), m.parent.to_string());

            let mean_motion_deg_per_day = 360.0 / m.period_days;
            let elements = KeplerianElements {
                semi_major_axis: m.a_km * 1000.0,
                eccentricity: m.e,
                inclination: m.i_deg.to_radians(),
                ascending_node: 0.0,
                long_peri: 0.0,
                mean_longitude: 0.0,
            };
            let rates = ElementRates {
                mean_longitude: (mean_motion_deg_per_day * 36525.0).to_radians(),
                ..Default::default()
            };
            orbit_models.insert(m.name.to_string(), OrbitModel::new(elements, rates));
        }

        // 1P/Halley, a representative comet on a long-period, high-
        // eccentricity, high-inclination orbit relative to the Sun.
        let halley_mass = 2.2e14;
        bodies.insert(
            "Halley".to_string(),
            Body::new("Halley", 11_000.0, halley_mass, G * halley_mass),
        );
        orbit_models.insert(
            "Halley".to_string(),
            OrbitModel::new(
                KeplerianElements {
                    semi_major_axis: 17.834 * AU,
                    eccentricity: 0.96714,
                    inclination: 162.26_f64.to_radians(),
                    ascending_node: 58.42_f64.to_radians(),
                    long_peri: 111.33_f64.to_radians(),
                    mean_longitude: 0.0,
                },
                ElementRates {
                    mean_longitude: (360.0 / (75.3 * 365.25) * 36525.0).to_radians(),
                    ..Default::default()
                },
            ),
        );

        Self {
            bodies,
            orbit_models,
            parents,
        }
    }
}
