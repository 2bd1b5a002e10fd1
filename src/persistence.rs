//! Versioned binary snapshots (`spec.md` §4.J).
//!
//! Self-describing, endian-independent, and versioned, in the same
//! hand-rolled style as the teacher's `ephemeris::table::EphemerisTable`
//! binary format (magic bytes, explicit little-endian field reads
//! through a small reader helper) rather than `serde`+`bincode`: the
//! teacher never reaches for a serialization framework for this kind of
//! format, and the wire layout here is simple enough not to need one.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::catalogue::BodyCatalogue;
use crate::de405::De405Table;
use crate::driver::{DriverConfig, SolarSystem};
use crate::error::SimError;
use crate::math::vec3::Vec3;
use crate::particle::{Particle, VecHistory};
use crate::particle_system::ParticleSystem;
use crate::spk::SpkTable;

const MAGIC: &[u8; 8] = b"ORSNAP1\0";
const VERSION: u32 = 1;

const FLAG_GR: u8 = 0b01;
const FLAG_CWPM: u8 = 0b10;

/// `saveState(stream)` (`spec.md` §4.I, §4.J): header {version, date_jd,
/// flags}, then the main system, then every named subsystem.
pub fn save<W: Write>(system: &SolarSystem<'_>, w: &mut W) -> Result<(), SimError> {
    let mut flags = 0u8;
    if system.general_relativity() {
        flags |= FLAG_GR;
    }
    if system.curvature_wave_propagation() {
        flags |= FLAG_CWPM;
    }

    let mut buf = Vec::new();
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&system.date_jd().to_le_bytes());
    buf.push(flags);

    write_particle_system(&mut buf, "main", system.main_system());

    let subsystem_names: Vec<&str> = system.subsystem_names().collect();
    buf.extend_from_slice(&(subsystem_names.len() as u32).to_le_bytes());
    for planet in subsystem_names {
        let particles = system.subsystem_particles(planet).expect("listed subsystem must exist");
        write_particle_system(&mut buf, planet, particles);
    }

    w.write_all(&buf).map_err(|e| SimError::numerical("persistence::save", e.to_string()))
}

/// `loadState(stream)`: rebuilds a `SolarSystem` over the given catalogue
/// and ephemeris sources from a snapshot written by `save`.
pub fn load<'a, R: Read>(
    catalogue: &'a BodyCatalogue,
    de405: Option<&'a De405Table>,
    spk: Option<&'a SpkTable>,
    r: &mut R,
) -> Result<SolarSystem<'a>, SimError> {
    let mut bytes = Vec::new();
    r.read_to_end(&mut bytes).map_err(|e| SimError::numerical("persistence::load", e.to_string()))?;
    let mut cursor = Cursor::new(&bytes);

    let mut magic = [0u8; 8];
    cursor.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(SimError::invariant("snapshot has an invalid magic header"));
    }
    let version = cursor.read_u32()?;
    if version != VERSION {
        return Err(SimError::invariant(format!("unsupported snapshot version {version}")));
    }
    let date_jd = cursor.read_f64()?;
    let flags = cursor.read_u8()?;

    let (_, main) = read_particle_system(&mut cursor)?;

    let subsystem_count = cursor.read_u32()? as usize;
    let mut subsystems = HashMap::with_capacity(subsystem_count);
    for _ in 0..subsystem_count {
        let (planet, particles) = read_particle_system(&mut cursor)?;
        subsystems.insert(planet, particles);
    }

    // The loaded main system already carries its own GR/CWPM flags in
    // its particles' kernel; `config` only matters if the caller later
    // calls `initialize_simulation` again on the restored system.
    let config = DriverConfig {
        general_relativity: flags & FLAG_GR != 0,
        curvature_wave_propagation: flags & FLAG_CWPM != 0,
        ..DriverConfig::default()
    };

    let mut system = SolarSystem::new(catalogue, de405, spk, config);
    system.restore(date_jd, main, subsystems)?;
    Ok(system)
}

fn write_particle_system(buf: &mut Vec<u8>, tag: &str, ps: &ParticleSystem) {
    write_string(buf, tag);
    write_option_string(buf, ps.anchor());
    buf.extend_from_slice(&(ps.len() as u32).to_le_bytes());
    for p in ps.particles() {
        write_particle(buf, p);
    }
}

fn write_particle(buf: &mut Vec<u8>, p: &Particle) {
    write_string(buf, &p.name);
    buf.extend_from_slice(&p.mass.to_le_bytes());
    buf.extend_from_slice(&p.mu.to_le_bytes());
    write_vec3(buf, p.position);
    write_vec3(buf, p.velocity);
    write_vec3(buf, p.acceleration);
    write_history(buf, &p.acceleration_history);
    write_history(buf, &p.velocity_history);
}

fn write_history(buf: &mut Vec<u8>, h: &VecHistory) {
    let len = h.len();
    buf.push(len as u8);
    // Oldest-first, so reloading can replay `push` in the same order the
    // samples originally arrived and reconstruct an identical ring state.
    for back in (0..len).rev() {
        write_vec3(buf, h.get(back).expect("index within reported length"));
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn write_option_string(buf: &mut Vec<u8>, s: Option<&str>) {
    match s {
        Some(s) => {
            buf.push(1);
            write_string(buf, s);
        }
        None => buf.push(0),
    }
}

fn write_vec3(buf: &mut Vec<u8>, v: Vec3) {
    buf.extend_from_slice(&v.x.to_le_bytes());
    buf.extend_from_slice(&v.y.to_le_bytes());
    buf.extend_from_slice(&v.z.to_le_bytes());
}

fn read_particle_system(cursor: &mut Cursor<'_>) -> Result<(String, ParticleSystem), SimError> {
    let tag = cursor.read_string()?;
    let anchor = cursor.read_option_string()?;
    let count = cursor.read_u32()? as usize;

    let mut ps = ParticleSystem::new();
    for _ in 0..count {
        let (name, mass, mu, position, velocity, acceleration, accel_history, vel_history) =
            read_particle(cursor)?;
        ps.add_particle(name.clone(), mass, mu, position, velocity)?;
        let p = ps.get_particle_mut(&name)?;
        p.acceleration = acceleration;
        for v in accel_history {
            p.acceleration_history.push(v);
        }
        for v in vel_history {
            p.velocity_history.push(v);
        }
    }
    if let Some(anchor) = anchor {
        ps.set_anchor(anchor)?;
    }
    Ok((tag, ps))
}

#[allow(clippy::type_complexity)]
fn read_particle(
    cursor: &mut Cursor<'_>,
) -> Result<(String, f64, f64, Vec3, Vec3, Vec3, Vec<Vec3>, Vec<Vec3>), SimError> {
    let name = cursor.read_string()?;
    let mass = cursor.read_f64()?;
    let mu = cursor.read_f64()?;
    let position = cursor.read_vec3()?;
    let velocity = cursor.read_vec3()?;
    let acceleration = cursor.read_vec3()?;
    let accel_history = cursor.read_history()?;
    let vel_history = cursor.read_history()?;
    Ok((name, mass, mu, position, velocity, acceleration, accel_history, vel_history))
}

/// A tiny byte-slice reader, generalizing the teacher's own
/// `ephemeris::table::Cursor` from a fixed little-endian `f64`/`u32`
/// layout to the variable-length strings and histories this format
/// needs.
struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn read_exact(&mut self, out: &mut [u8]) -> Result<(), SimError> {
        let end = self.offset + out.len();
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or_else(|| SimError::numerical("persistence::read", "unexpected end of snapshot"))?;
        out.copy_from_slice(slice);
        self.offset = end;
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, SimError> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }

    fn read_u32(&mut self) -> Result<u32, SimError> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    fn read_f64(&mut self) -> Result<f64, SimError> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b)?;
        Ok(f64::from_le_bytes(b))
    }

    fn read_vec3(&mut self) -> Result<Vec3, SimError> {
        Ok(Vec3::new(self.read_f64()?, self.read_f64()?, self.read_f64()?))
    }

    fn read_string(&mut self) -> Result<String, SimError> {
        let len = self.read_u32()? as usize;
        let end = self.offset + len;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or_else(|| SimError::numerical("persistence::read", "unexpected end of snapshot"))?;
        self.offset = end;
        String::from_utf8(slice.to_vec())
            .map_err(|e| SimError::numerical("persistence::read", format!("invalid utf-8 string: {e}")))
    }

    fn read_option_string(&mut self) -> Result<Option<String>, SimError> {
        match self.read_u8()? {
            0 => Ok(None),
            _ => Ok(Some(self.read_string()?)),
        }
    }

    fn read_history(&mut self) -> Result<Vec<Vec3>, SimError> {
        let len = self.read_u8()? as usize;
        (0..len).map(|_| self.read_vec3()).collect()
    }
}
