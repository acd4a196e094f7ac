use beamdiag_rs::{Float, Particle, ParticleContainer, RefPart, TileIndex};

pub const TILE: TileIndex = TileIndex { grid: 0, tile: 0 };

pub fn single_prtl_container() -> ParticleContainer {
    // one particle with local id 3, owned by rank 2
    let mut pc = ParticleContainer::new(0);
    pc.tile_mut(0, TILE).push(Particle {
        x: 1.0,
        y: 2.0,
        t: 0.0,
        id: 3,
        cpu: 2,
        px: 0.1,
        py: 0.2,
        pt: 0.3,
    });
    pc
}

pub fn multi_level_container(
    rank: u32,
    n_levels: usize,
    tiles: usize,
    per_tile: usize,
) -> ParticleContainer {
    // This is a function that sets up a small deterministic beam
    // spread over several levels and tiles so that it can be used
    // in testing. The last tile of every level is left empty.
    let mut pc = ParticleContainer::new(rank);
    pc.set_ref_particle(RefPart::with_gamma(3.0));
    for lev in 0..n_levels {
        for tile in 0..tiles {
            let index = TileIndex { grid: 0, tile };
            pc.tile_mut(lev, index);
            if tile + 1 == tiles {
                continue;
            }
            for k in 0..per_tile {
                let v = (lev * 100 + tile * 10 + k) as Float * 1e-3;
                pc.add_particle(lev, index, v, -v, 0.5 * v, 0.1 * v, -0.1 * v, 0.01 * v)
                    .unwrap();
            }
        }
    }
    pc
}

pub fn data_lines(contents: &str) -> Vec<&str> {
    contents.lines().skip(1).collect()
}
