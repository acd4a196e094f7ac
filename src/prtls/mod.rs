use crate::diags::{DiagError, DiagResult};
use crate::Float;
use anyhow::Result;
use itertools::izip;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::convert::TryFrom;

pub mod ids;
pub mod init;

/// One particle as seen by the diagnostics. The tile stores these
/// as a struct of arrays, this is just the row view.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    pub x: Float,
    pub y: Float,
    pub t: Float,
    pub id: u32,
    pub cpu: u32,
    pub px: Float,
    pub py: Float,
    pub pt: Float,
}

/// Position of a tile inside one refinement level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileIndex {
    pub grid: usize,
    pub tile: usize,
}

/// The synchronous particle every other particle is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RefPart {
    pub s: Float,
    pub x: Float,
    pub y: Float,
    pub z: Float,
    pub t: Float,
    pub px: Float,
    pub py: Float,
    pub pz: Float,
    pub pt: Float,
}

impl RefPart {
    /// Reference particle of energy `gamma` sitting at the origin
    /// moving along z.
    pub fn with_gamma(gamma: Float) -> RefPart {
        RefPart {
            pz: (gamma * gamma - 1.0).sqrt(),
            pt: -gamma,
            ..RefPart::default()
        }
    }

    #[inline(always)]
    pub fn beta_gamma(&self) -> Float {
        (self.pt * self.pt - 1.0).sqrt()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleTile {
    pub x: Vec<Float>,
    pub y: Vec<Float>,
    pub t: Vec<Float>,
    pub id: Vec<u32>,
    pub cpu: Vec<u32>,
    pub px: Vec<Float>,
    pub py: Vec<Float>,
    pub pt: Vec<Float>,
}

impl ParticleTile {
    pub fn new() -> ParticleTile {
        ParticleTile::default()
    }

    pub fn with_capacity(n: usize) -> ParticleTile {
        ParticleTile {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            t: Vec::with_capacity(n),
            id: Vec::with_capacity(n),
            cpu: Vec::with_capacity(n),
            px: Vec::with_capacity(n),
            py: Vec::with_capacity(n),
            pt: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, p: Particle) {
        self.x.push(p.x);
        self.y.push(p.y);
        self.t.push(p.t);
        self.id.push(p.id);
        self.cpu.push(p.cpu);
        self.px.push(p.px);
        self.py.push(p.py);
        self.pt.push(p.pt);
    }

    #[inline(always)]
    pub fn num_particles(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_particles() == 0
    }

    /// Row view over the tile. Stops at the shortest component, so
    /// only call this on a tile that passed `check_layout`.
    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        izip!(
            &self.x, &self.y, &self.t, &self.id, &self.cpu, &self.px, &self.py, &self.pt
        )
        .map(|(&x, &y, &t, &id, &cpu, &px, &py, &pt)| Particle {
            x,
            y,
            t,
            id,
            cpu,
            px,
            py,
            pt,
        })
    }

    /// Every component array must hold one entry per particle.
    pub fn check_layout(&self) -> std::result::Result<(), String> {
        let np = self.num_particles();
        for (name, len) in &[
            ("x", self.x.len()),
            ("y", self.y.len()),
            ("t", self.t.len()),
            ("cpu", self.cpu.len()),
            ("px", self.px.len()),
            ("py", self.py.len()),
            ("pt", self.pt.len()),
        ] {
            if *len != np {
                return Err(format!(
                    "component {} holds {} entries but the tile has {} particles",
                    name, len, np
                ));
            }
        }
        Ok(())
    }

    #[inline(always)]
    fn drift(&mut self, ds: Float, betgam2: Float) {
        for (x, y, t, px, py, pt) in izip!(
            &mut self.x,
            &mut self.y,
            &mut self.t,
            &self.px,
            &self.py,
            &self.pt
        ) {
            *x += ds * px;
            *y += ds * py;
            *t += ds * pt / betgam2;
        }
    }
}

/// All tiles of one refinement level, ordered by `TileIndex`.
pub type Level = BTreeMap<TileIndex, ParticleTile>;

/// The simulation side particle container. Particles live in tiles,
/// tiles live in refinement levels.
pub struct ParticleContainer {
    levels: Vec<Level>,
    ref_part: RefPart,
    rank: u32,
    next_id: u64,
}

impl ParticleContainer {
    pub fn new(rank: u32) -> ParticleContainer {
        ParticleContainer {
            levels: Vec::new(),
            ref_part: RefPart::default(),
            rank,
            // local ids start at 1
            next_id: 1,
        }
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn finest_level(&self) -> Option<usize> {
        self.levels.len().checked_sub(1)
    }

    /// Makes sure levels `0..=lev` exist.
    pub fn set_finest_level(&mut self, lev: usize) {
        if self.levels.len() <= lev {
            self.levels.resize_with(lev + 1, Level::new);
        }
    }

    /// Mutable access to a tile, creating the level and tile if they
    /// do not exist yet.
    pub fn tile_mut(&mut self, lev: usize, index: TileIndex) -> &mut ParticleTile {
        self.set_finest_level(lev);
        self.levels[lev].entry(index).or_insert_with(ParticleTile::new)
    }

    /// Adds a particle owned by this rank and returns its local id.
    /// Fails once the rank has handed out every `u32` id.
    #[allow(clippy::too_many_arguments)]
    pub fn add_particle(
        &mut self,
        lev: usize,
        index: TileIndex,
        x: Float,
        y: Float,
        t: Float,
        px: Float,
        py: Float,
        pt: Float,
    ) -> Result<u32> {
        let cpu = self.rank;
        let id = u32::try_from(self.next_id).map_err(|_| {
            anyhow::Error::msg(format!("Rank {} ran out of local particle ids", cpu))
        })?;
        self.next_id += 1;
        self.tile_mut(lev, index).push(Particle {
            x,
            y,
            t,
            id,
            cpu,
            px,
            py,
            pt,
        });
        Ok(id)
    }

    pub fn set_ref_particle(&mut self, ref_part: RefPart) {
        self.ref_part = ref_part;
    }

    pub fn total_number_of_particles(&self) -> usize {
        self.levels
            .iter()
            .flat_map(|lev| lev.values())
            .map(ParticleTile::num_particles)
            .sum()
    }

    /// Field free drift of length `ds` for the beam and the reference
    /// particle. The reference particle must be moving, `|pt| > 1`.
    pub fn drift(&mut self, ds: Float) -> Result<()> {
        let betgam = self.ref_part.beta_gamma();
        let betgam2 = betgam * betgam;
        if !(betgam2 > 0.0 && betgam2.is_finite()) {
            return Err(anyhow::Error::msg(format!(
                "Cannot drift with a reference particle at pt = {}",
                self.ref_part.pt
            )));
        }
        self.levels
            .iter_mut()
            .flat_map(|lev| lev.values_mut())
            .collect::<Vec<_>>()
            .into_par_iter()
            .for_each(|tile| tile.drift(ds, betgam2));

        let r = &mut self.ref_part;
        r.s += ds;
        r.x += ds * r.px / betgam;
        r.y += ds * r.py / betgam;
        r.z += ds * r.pz / betgam;
        r.t -= ds * r.pt / betgam;
        Ok(())
    }
}

/// What the diagnostics need from a particle container.
pub trait ParticleSource {
    /// Local host side copy of every level and tile. Blocks until the
    /// copy is complete.
    fn copy_to_host(&self) -> DiagResult<HostParticles>;

    fn ref_particle(&self) -> RefPart;
}

impl ParticleSource for ParticleContainer {
    fn copy_to_host(&self) -> DiagResult<HostParticles> {
        let levels = self
            .levels
            .par_iter()
            .enumerate()
            .map(|(lev, tiles)| {
                tiles
                    .iter()
                    .map(|(index, tile)| {
                        if !cfg!(feature = "unchecked") {
                            tile.check_layout().map_err(|reason| DiagError::Staging {
                                level: lev,
                                grid: index.grid,
                                tile: index.tile,
                                reason,
                            })?;
                        }
                        Ok((*index, tile.clone()))
                    })
                    .collect::<DiagResult<Level>>()
            })
            .collect::<DiagResult<Vec<Level>>>()?;
        Ok(HostParticles { levels })
    }

    fn ref_particle(&self) -> RefPart {
        self.ref_part
    }
}

/// Host side snapshot of a particle container. Owns its data, nothing
/// is shared with the container it was copied from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostParticles {
    levels: Vec<Level>,
}

/// One tile handed out by the level/tile traversal.
pub struct TileRef<'a> {
    pub level: usize,
    pub index: TileIndex,
    pub tile: &'a ParticleTile,
}

impl HostParticles {
    pub fn finest_level(&self) -> Option<usize> {
        self.levels.len().checked_sub(1)
    }

    /// Walks levels `0..=finest` in ascending order and, inside a
    /// level, the tiles in `TileIndex` order. Empty tiles are yielded
    /// too.
    pub fn tiles(&self) -> impl Iterator<Item = TileRef<'_>> + '_ {
        self.levels.iter().enumerate().flat_map(|(level, tiles)| {
            tiles.iter().map(move |(index, tile)| TileRef {
                level,
                index: *index,
                tile,
            })
        })
    }

    pub fn total_number_of_particles(&self) -> usize {
        self.tiles().map(|pti| pti.tile.num_particles()).sum()
    }
}
