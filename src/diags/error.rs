use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagError {
    #[error("Could not write diagnostics to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Host copy failed at level {level}, tile ({grid}, {tile}): {reason}")]
    Staging {
        level: usize,
        grid: usize,
        tile: usize,
        reason: String,
    },
}

pub type DiagResult<T> = Result<T, DiagError>;
