//! Error taxonomy for the solver: invariant violations, transport
//! failures and input parse failures are the only fatal cases, there is
//! no recovery discipline, a failed run is simply restarted.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed input graph: {0}")]
    Parse(String),

    #[error("I/O error reading graph file: {0}")]
    Io(#[from] std::io::Error),

    #[error("message envelope truncated while decoding")]
    Truncated,

    #[error("unknown wire-format tag byte {0:#04x}")]
    UnknownTag(u8),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("MPI transport failure: {0}")]
    Transport(String),
}
