use crate::prtls::{HostParticles, ParticleSource};
use log::debug;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub mod emit;
pub mod error;
pub mod invariants;

pub use error::{DiagError, DiagResult};
pub use invariants::{InvariantCalculator, Invariants, LensParams, NonlinearLens};

/// The kinds of diagnostic files this crate knows how to write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    /// raw phase space of every particle
    Particles,
    /// the two invariants of the nonlinear lens for every particle
    NonlinearLensInvariants,
    /// the reference particle, one line per call
    RefParticle,
}

impl OutputType {
    pub fn header(self) -> &'static str {
        match self {
            OutputType::Particles => "id x y t px py pt",
            OutputType::NonlinearLensInvariants => "id H I",
            OutputType::RefParticle => "step s x y z t px py pz pt",
        }
    }

    /// Base file name used when the driver picks the output path.
    pub fn file_stem(self) -> &'static str {
        match self {
            OutputType::Particles => "particles",
            OutputType::NonlinearLensInvariants => "nonlinear_lens_invariants",
            OutputType::RefParticle => "ref_particle",
        }
    }
}

/// Writes one diagnostic record set for `step` to `file_name`, using
/// the nonlinear lens for the invariants.
pub fn diagnostic_output<C, P>(
    pc: &C,
    otype: OutputType,
    file_name: P,
    step: u32,
    append: bool,
    params: &LensParams,
) -> DiagResult<()>
where
    C: ParticleSource + ?Sized,
    P: AsRef<Path>,
{
    diagnostic_output_with(pc, otype, file_name, step, append, params, &NonlinearLens)
}

/// Like `diagnostic_output` with a caller supplied invariant
/// calculator.
///
/// Without `append` the file is truncated and starts with the header of
/// `otype`. With `append` only data lines are added after whatever the
/// file already holds. The particles are read from a host copy of `pc`,
/// the reference particle straight from `pc`.
pub fn diagnostic_output_with<C, P, I>(
    pc: &C,
    otype: OutputType,
    file_name: P,
    step: u32,
    append: bool,
    params: &LensParams,
    calc: &I,
) -> DiagResult<()>
where
    C: ParticleSource + ?Sized,
    P: AsRef<Path>,
    I: InvariantCalculator + ?Sized,
{
    let path = file_name.as_ref();
    let io_err = |source: io::Error| DiagError::Io {
        path: path.to_path_buf(),
        source,
    };

    // keep the file open while we add more and more lines
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(io_err)?;
    let mut file_handler = BufWriter::new(file);

    if !append {
        emit::write_header(&mut file_handler, otype).map_err(io_err)?;
    }

    // staged for every mode so a broken container is always reported
    let host = pc.copy_to_host()?;

    let lines = match otype {
        OutputType::Particles => print_particles(&mut file_handler, &host),
        OutputType::NonlinearLensInvariants => {
            print_invariants(&mut file_handler, &host, *params, calc)
        }
        OutputType::RefParticle => {
            emit::write_ref_particle(&mut file_handler, step, &pc.ref_particle()).map(|_| 1)
        }
    }
    .map_err(io_err)?;

    file_handler.flush().map_err(io_err)?;
    debug!(
        "step {}: wrote {} {} lines to {}",
        step,
        lines,
        otype.file_stem(),
        path.display()
    );
    Ok(())
}

fn print_particles<W: Write>(w: &mut W, host: &HostParticles) -> io::Result<usize> {
    let mut lines = 0;
    for pti in host.tiles() {
        for p in pti.tile.iter() {
            emit::write_particle(w, &p)?;
        }
        lines += pti.tile.num_particles();
    }
    Ok(lines)
}

fn print_invariants<W, I>(
    w: &mut W,
    host: &HostParticles,
    params: LensParams,
    calc: &I,
) -> io::Result<usize>
where
    W: Write,
    I: InvariantCalculator + ?Sized,
{
    let mut lines = 0;
    for pti in host.tiles() {
        for p in pti.tile.iter() {
            let inv = calc.invariants(&params, p.x, p.y, p.px, p.py);
            emit::write_invariants(w, &p, &inv)?;
        }
        lines += pti.tile.num_particles();
    }
    Ok(lines)
}
