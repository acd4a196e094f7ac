use anyhow::Result;
use beamdiag_rs::{run, Config};

fn main() -> Result<()> {
    env_logger::init();
    let cfg = Config::new()?;
    run(cfg)
}
