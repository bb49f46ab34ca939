//
// fragcat - concurrent PNG-strip fetch/assemble pipeline
// error.rs - the error taxonomy shared across the crate
//

use std::io;

use thiserror::Error;

/// Everything that can go wrong while handling one fragment or one run.
///
/// Worker-local errors (`NotAPng`, `WrongChunk`, `Truncated`, `CompressionError`,
/// `Transport`) never cross a worker boundary: they're logged and the worker
/// moves on to the next sequence. `Configuration` and `Resource` are the only
/// variants the orchestrator surfaces to its caller, since they mean the run
/// never got to start.
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing or invalid PNG signature")]
    NotAPng,

    #[error("unexpected chunk type {found:?}, expected {expected:?}")]
    WrongChunk { expected: &'static str, found: [u8; 4] },

    #[error("buffer truncated: needed {needed} bytes, had {available}")]
    Truncated { needed: usize, available: usize },

    #[error("inflate/deflate failure: {0}")]
    CompressionError(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("resource allocation failure: {0}")]
    Resource(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A CRC mismatch is deliberately *not* a variant of [`Error`]: per the
/// source's trust model it never aborts parsing. It's recorded on the parsed
/// structure instead (see [`crate::png::SimplePng::first_crc_mismatch`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcMismatch {
    pub expected: u32,
    pub computed: u32,
}

pub type Result<T> = std::result::Result<T, Error>;
