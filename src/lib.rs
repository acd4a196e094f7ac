use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub mod diags;
pub mod prtls;
pub mod save;

pub use diags::{
    diagnostic_output, diagnostic_output_with, DiagError, DiagResult, InvariantCalculator,
    Invariants, LensParams, NonlinearLens, OutputType,
};
pub use prtls::{
    HostParticles, Particle, ParticleContainer, ParticleSource, ParticleTile, RefPart, TileIndex,
};

// We use a type alias for f64/Float to easily support
// double and single precision.
#[cfg(feature = "dprec")]
pub type Float = f64;

#[cfg(not(feature = "dprec"))]
pub type Float = f32;

#[derive(Deserialize)]
pub struct Config {
    pub params: Params,
    pub setup: Setup,
    pub output: Output,
    #[serde(default)]
    pub diag: LensParams,
}

#[derive(Deserialize)]
pub struct Setup {
    pub t_final: u32,
    pub seed: Option<u64>,
}

#[derive(Deserialize)]
pub struct Output {
    pub write_output: bool,
    pub output_interval: u32,
    pub prefix: String,
    pub modes: Vec<OutputType>,
}

#[derive(Clone, Deserialize)]
pub struct Params {
    pub n_prtl: usize,
    pub n_levels: usize,
    pub tiles_per_level: usize,
    pub rank: u32,
    pub ds: Float,
    pub gamma_ref: Float,
    pub sigma_x: Float,
    pub sigma_y: Float,
    pub sigma_t: Float,
    pub sigma_px: Float,
    pub sigma_py: Float,
    pub sigma_pt: Float,
}

impl Config {
    pub fn new() -> Result<Config> {
        Config::from_path("config.toml")
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not open the {} file", path.display()))?;
        toml::from_str(&contents).with_context(|| "Could not parse Config file")
    }
}

pub fn run(cfg: Config) -> Result<()> {
    if cfg.output.output_interval == 0 {
        return Err(anyhow::Error::msg("Output interval must be at least 1"));
    }

    info!("initializing prtls");
    let mut pc = prtls::init::gaussian_beam(&cfg.params, cfg.setup.seed)?;
    info!(
        "rank {} holds {} prtls on {} levels",
        pc.rank(),
        pc.total_number_of_particles(),
        pc.finest_level().map_or(0, |lev| lev + 1)
    );

    for t in 0..=cfg.setup.t_final {
        if cfg.output.write_output {
            save::save_output(t, &cfg, &pc)?;
        }
        info!("{}", t);
        pc.drift(cfg.params.ds)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) const E_TOL: Float = 1e-5;

#[cfg(test)]
pub(crate) fn build_test_params() -> Params {
    Params {
        n_prtl: 60,
        n_levels: 2,
        tiles_per_level: 3,
        rank: 1,
        ds: 0.1,
        gamma_ref: 2.0,
        sigma_x: 1e-3,
        sigma_y: 1e-3,
        sigma_t: 1e-3,
        sigma_px: 1e-4,
        sigma_py: 1e-4,
        sigma_pt: 1e-4,
    }
}

#[cfg(test)]
pub(crate) fn build_test_container() -> ParticleContainer {
    // three levels with an empty tile on level 0
    let mut pc = ParticleContainer::new(2);
    pc.set_ref_particle(RefPart::with_gamma(2.0));
    let t00 = TileIndex { grid: 0, tile: 0 };
    let t01 = TileIndex { grid: 0, tile: 1 };
    let t10 = TileIndex { grid: 1, tile: 0 };
    let t03 = TileIndex { grid: 0, tile: 3 };

    pc.add_particle(0, t10, 0.1, 0.2, 0.0, 1e-3, 2e-3, 0.0).unwrap();
    pc.add_particle(0, t00, -0.1, 0.0, 0.5, 0.0, 0.0, 1e-4).unwrap();
    pc.tile_mut(0, t01);
    pc.add_particle(1, t00, 0.3, -0.3, 0.0, -1e-3, 0.0, 0.0).unwrap();
    pc.add_particle(1, t00, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0).unwrap();
    pc.add_particle(2, t03, 1.0, 2.0, 0.0, 0.1, 0.2, 0.3).unwrap();
    pc
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [setup]
        t_final = 20

        [params]
        n_prtl = 100
        n_levels = 1
        tiles_per_level = 4
        rank = 3
        ds = 0.1
        gamma_ref = 2.0
        sigma_x = 1e-3
        sigma_y = 1e-3
        sigma_t = 1e-3
        sigma_px = 1e-4
        sigma_py = 1e-4
        sigma_pt = 1e-4

        [output]
        write_output = true
        output_interval = 10
        prefix = "diags"
        modes = ["particles", "ref_particle"]
    "#;

    #[test]
    fn missing_diag_table_uses_defaults() {
        let cfg: Config = toml::from_str(CONFIG).unwrap();
        assert_eq!(cfg.diag, LensParams::default());
        assert_eq!(cfg.setup.seed, None);
        assert_eq!(
            cfg.output.modes,
            vec![OutputType::Particles, OutputType::RefParticle]
        );
    }

    #[test]
    fn partial_diag_table() {
        let contents = format!("{}\n[diag]\ntn = 0.3\n", CONFIG);
        let cfg: Config = toml::from_str(&contents).unwrap();
        assert_eq!(
            cfg.diag,
            LensParams {
                tn: 0.3,
                ..LensParams::default()
            }
        );
    }

    #[test]
    fn shipped_config_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml");
        let cfg = Config::from_path(path).unwrap();
        assert!((cfg.params.gamma_ref - 2.0).abs() < E_TOL);
        assert_eq!(cfg.output.modes.len(), 3);
    }

    #[test]
    fn gamma_ref_is_required() {
        let contents = CONFIG.replace("gamma_ref = 2.0", "");
        assert!(toml::from_str::<Config>(&contents).is_err());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let contents = CONFIG.replace("\"ref_particle\"", "\"beam_moments\"");
        assert!(toml::from_str::<Config>(&contents).is_err());
    }

    #[test]
    fn zero_output_interval_is_rejected() {
        let contents = CONFIG.replace("output_interval = 10", "output_interval = 0");
        let cfg: Config = toml::from_str(&contents).unwrap();
        assert!(run(cfg).is_err());
    }
}
