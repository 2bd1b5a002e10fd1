//! Layered ephemeris resolver (`spec.md` §4.E).
//!
//! The composite front-end callers use to resolve `(bodyName, date) ->
//! (r, v)` in a heliocentric J2000 ecliptic frame, trying sources in
//! priority order: DE405 (accurate), Keplerian elements (approximate),
//! orbit-element table (moons/comets/asteroids), Moon orbital-period
//! wrap fallback, then the segmented ephemeris (spacecraft/small
//! bodies).

use crate::catalogue::BodyCatalogue;
use crate::constants::{AU, EMRAT, MOON_SIDEREAL_PERIOD_DAYS, SECONDS_PER_DAY};
use crate::de405::{self, De405Table, Target};
use crate::elements::{position_from_elements, velocity_from_elements};
use crate::error::SimError;
use crate::math::julian::to_julian_date;
use crate::math::vec3::Vec3;
use crate::spk::SpkTable;

/// Hard outer validity band (`spec.md` §4.E), independent of which
/// sources are actually attached.
fn hard_band() -> (f64, f64) {
    (
        to_julian_date(-3000, 1, 1, 0, 0, 0),
        to_julian_date(3000, 1, 1, 0, 0, 0),
    )
}

/// The eleven bodies DE405 covers directly.
fn de405_target_for(name: &str) -> Option<Target> {
    Some(match name {
        "Mercury" => Target::Mercury,
        "Venus" => Target::Venus,
        "Mars" => Target::Mars,
        "Jupiter" => Target::Jupiter,
        "Saturn" => Target::Saturn,
        "Uranus" => Target::Uranus,
        "Neptune" => Target::Neptune,
        "Pluto" => Target::Pluto,
        "Sun" => Target::Sun,
        // Earth and Moon are reconstructed from EMB + geocentric Moon,
        // handled specially in `resolve`.
        _ => return None,
    })
}

/// Composite front-end resolving body state across all ephemeris
/// sources (`spec.md` §4.E). Holds only borrowed, read-only handles —
/// no ambient globals (`spec.md` §9 "Singletons").
pub struct EphemerisResolver<'a> {
    catalogue: &'a BodyCatalogue,
    de405: Option<&'a De405Table>,
    spk: Option<&'a SpkTable>,
}

impl<'a> EphemerisResolver<'a> {
    pub fn new(catalogue: &'a BodyCatalogue, de405: Option<&'a De405Table>, spk: Option<&'a SpkTable>) -> Self {
        Self { catalogue, de405, spk }
    }

    /// Union of all attached sources' validity windows, capped at the
    /// hard outer band (3000 BC .. 3000 AD).
    pub fn first_valid_date(&self) -> f64 {
        let (hard_low, _) = hard_band();
        self.de405.map_or(hard_low, |t| t.first_valid_jd().max(hard_low))
    }

    pub fn last_valid_date(&self) -> f64 {
        let (_, hard_high) = hard_band();
        self.de405.map_or(hard_high, |t| t.last_valid_jd().min(hard_high))
    }

    /// Resolve `(r, v)` for `name` at `jd`, in meters and m/s, in a
    /// heliocentric J2000 ecliptic frame (except for segmented-source
    /// bodies, which are relative to their declared center; see
    /// `resolve_with_center`).
    pub fn position_velocity(&self, name: &str, jd: f64) -> Result<(Vec3, Vec3), SimError> {
        self.resolve_with_center(name, jd).map(|(_, r, v)| (r, v))
    }

    pub fn position(&self, name: &str, jd: f64) -> Result<Vec3, SimError> {
        self.position_velocity(name, jd).map(|(r, _)| r)
    }

    pub fn velocity(&self, name: &str, jd: f64) -> Result<Vec3, SimError> {
        self.position_velocity(name, jd).map(|(_, v)| v)
    }

    /// Like `position_velocity`, but also reports which body the result
    /// is expressed relative to ("Sun" for every source except a
    /// segmented trajectory centered on a planet, or a moon's
    /// orbit-element entry centered on its parent planet).
    pub fn resolve_with_center(&self, name: &str, jd: f64) -> Result<(String, Vec3, Vec3), SimError> {
        // 1. Accurate source (DE405).
        if let Some(table) = self.de405 {
            if jd >= table.first_valid_jd() && jd <= table.last_valid_jd() {
                if let Some(result) = self.try_de405(table, name, jd)? {
                    return Ok(("Sun".to_string(), result.0, result.1));
                }
            }
        }

        // 2/3. Keplerian / orbit-element source.
        if let Ok(orbit_model) = self.catalogue.orbit_model(name) {
            if let Some(parent) = self.catalogue.parent_of(name) {
                // Moon fallback takes priority over the plain orbit-element
                // propagation when DE405 doesn't cover the date.
                if name == "Moon" {
                    if let Some((r, v)) = self.moon_period_wrap_fallback(jd)? {
                        return Ok(("Sun".to_string(), r, v));
                    }
                }
                let parent_mu = self.catalogue.body(parent)?.mu;
                let elements = orbit_model.elements_at_epoch(jd);
                let r_rel = position_from_elements(&elements)?;
                let v_rel = velocity_from_elements(parent_mu, &elements)?;
                let (parent_r, parent_v) = self.position_velocity(parent, jd)?;
                return Ok(("Sun".to_string(), parent_r + r_rel, parent_v + v_rel));
            }

            let sun_mu = self.catalogue.body("Sun")?.mu;
            let elements = orbit_model.elements_at_epoch(jd);
            let r = position_from_elements(&elements)?;
            let v = velocity_from_elements(sun_mu, &elements)?;
            return Ok(("Sun".to_string(), r, v));
        }

        // 5. Segmented source (spacecraft, named small bodies).
        if let Some(spk) = self.spk {
            if let Ok((center, r, v)) = spk.query(name, jd) {
                return Ok((center, r, v));
            }
        }

        Err(SimError::not_found("body", name))
    }

    fn try_de405(&self, table: &De405Table, name: &str, jd: f64) -> Result<Option<(Vec3, Vec3)>, SimError> {
        let (sun_r, sun_v) = table.position_velocity(Target::Sun, jd)?;

        let (target_r, target_v) = if name == "Earth" || name == "Moon" {
            let emb = table.position_velocity(Target::EarthMoonBarycenter, jd)?;
            let geo_moon = table.position_velocity(Target::GeocentricMoon, jd)?;
            let (earth, moon) = de405::earth_and_moon_from_barycenter(emb, geo_moon, EMRAT);
            if name == "Earth" { earth } else { moon }
        } else if let Some(target) = de405_target_for(name) {
            table.position_velocity(target, jd)?
        } else {
            return Ok(None);
        };

        let r = de405::mean_equator_to_ecliptic(target_r - sun_r) * AU;
        let v = de405::mean_equator_to_ecliptic(target_v - sun_v) * (AU / SECONDS_PER_DAY);
        Ok(Some((r, v)))
    }

    /// Moon fallback by orbital-period wrap (`spec.md` §4.E.4): if the
    /// Moon is queried outside the DE405 window, evaluate the
    /// Earth-Moon relative state at the nearest in-window date reached
    /// by an integer number of sidereal periods, and apply it as an
    /// offset to the approximate Earth position at the requested date.
    fn moon_period_wrap_fallback(&self, jd: f64) -> Result<Option<(Vec3, Vec3)>, SimError> {
        let Some(table) = self.de405 else { return Ok(None) };
        if jd >= table.first_valid_jd() && jd <= table.last_valid_jd() {
            return Ok(None);
        }

        let period = MOON_SIDEREAL_PERIOD_DAYS;
        let mid = (table.first_valid_jd() + table.last_valid_jd()) / 2.0;
        let n = ((jd - mid) / period).round();
        let mut wrapped_jd = jd - n * period;
        // Guard against rounding landing just outside the window.
        wrapped_jd = wrapped_jd.clamp(table.first_valid_jd(), table.last_valid_jd());

        let emb = table.position_velocity(Target::EarthMoonBarycenter, wrapped_jd)?;
        let geo_moon = table.position_velocity(Target::GeocentricMoon, wrapped_jd)?;
        let (earth_at_wrap, moon_at_wrap) = de405::earth_and_moon_from_barycenter(emb, geo_moon, EMRAT);
        let offset_r = de405::mean_equator_to_ecliptic(moon_at_wrap.0 - earth_at_wrap.0) * AU;
        let offset_v = de405::mean_equator_to_ecliptic(moon_at_wrap.1 - earth_at_wrap.1) * (AU / SECONDS_PER_DAY);

        let (earth_r, earth_v) = self.approximate_planet_state("Earth", jd)?;
        Ok(Some((earth_r + offset_r, earth_v + offset_v)))
    }

    fn approximate_planet_state(&self, name: &str, jd: f64) -> Result<(Vec3, Vec3), SimError> {
        let sun_mu = self.catalogue.body("Sun")?.mu;
        let orbit_model = self.catalogue.orbit_model(name)?;
        let elements = orbit_model.elements_at_epoch(jd);
        let r = position_from_elements(&elements)?;
        let v = velocity_from_elements(sun_mu, &elements)?;
        Ok((r, v))
    }
}
