use std::io;
use std::path::PathBuf;

use thiserror::Error;

// Everything that can go wrong while reading an iNES image
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unable to read ROM file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid iNES header")]
    InvalidHeader,

    #[error("file ends before the end of PRG ROM")]
    UnableToReadPrgRom,

    #[error("file ends before the end of CHR ROM")]
    UnableToReadChrRom,
}

// Construction time errors. Nothing in here is raised while stepping a frame.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ROM load error: {0}")]
    RomLoad(#[from] LoadError),

    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u8),

    #[error("bus configuration error: {0}")]
    Configuration(String),
}
