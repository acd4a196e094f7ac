use crate::{diags::diagnostic_output, prtls::ParticleContainer, Config};
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

/// Every rank writes its own file, `{prefix}/{name}.{rank}`.
pub fn rank_file_name<P: AsRef<Path>>(prefix: P, name: &str, rank: u32) -> PathBuf {
    prefix.as_ref().join(format!("{}.{}", name, rank))
}

pub(crate) fn save_output(t: u32, cfg: &Config, pc: &ParticleContainer) -> Result<()> {
    let out = &cfg.output;
    if t % out.output_interval == 0 {
        std::fs::create_dir_all(&out.prefix).context("Unable to create output directory")?;
        // the first output of the run starts fresh files, later ones grow them
        let append = t != 0;
        info!("saving diags");
        for &otype in &out.modes {
            let file_name = rank_file_name(&out.prefix, otype.file_stem(), pc.rank());
            diagnostic_output(pc, otype, &file_name, t, append, &cfg.diag)
                .with_context(|| format!("Could not save {} data to file", otype.file_stem()))?;
        }
    }

    Ok(())
}
