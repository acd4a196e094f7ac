use crate::prtls::{ParticleContainer, RefPart, TileIndex};
use crate::{Float, Params};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::Normal;

/// Builds this rank's share of an uncorrelated gaussian beam. Particles
/// are dealt round robin over levels first, then over the tiles of a
/// level.
pub fn gaussian_beam(params: &Params, seed: Option<u64>) -> Result<ParticleContainer> {
    if params.n_prtl > 0 && (params.n_levels == 0 || params.tiles_per_level == 0) {
        return Err(anyhow::Error::msg(
            "Particles need at least one level and one tile per level",
        ));
    }
    if params.gamma_ref <= 1.0 {
        return Err(anyhow::Error::msg(
            "Reference particle gamma must be larger than 1",
        ));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let normal = |sigma: Float| {
        Normal::new(0.0, sigma).with_context(|| format!("Invalid beam width {}", sigma))
    };
    let dist_x = normal(params.sigma_x)?;
    let dist_y = normal(params.sigma_y)?;
    let dist_t = normal(params.sigma_t)?;
    let dist_px = normal(params.sigma_px)?;
    let dist_py = normal(params.sigma_py)?;
    let dist_pt = normal(params.sigma_pt)?;

    let mut pc = ParticleContainer::new(params.rank);
    pc.set_ref_particle(RefPart::with_gamma(params.gamma_ref));
    if params.n_levels > 0 {
        pc.set_finest_level(params.n_levels - 1);
    }
    for k in 0..params.n_prtl {
        let lev = k % params.n_levels;
        let index = TileIndex {
            grid: 0,
            tile: (k / params.n_levels) % params.tiles_per_level,
        };
        pc.add_particle(
            lev,
            index,
            rng.sample(dist_x),
            rng.sample(dist_y),
            rng.sample(dist_t),
            rng.sample(dist_px),
            rng.sample(dist_py),
            rng.sample(dist_pt),
        )?;
    }
    Ok(pc)
}
