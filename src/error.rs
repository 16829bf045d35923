use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    /// Policy selector that is none of `fifo`, `lru`, `opt`.
    #[error("unknown policy `{0}` (expected one of: fifo, lru, opt)")]
    UnknownPolicy(String),

    #[error("invalid frame count {0}: at least one frame is required")]
    InvalidFrameCount(usize),

    #[error("no trace files given")]
    NoTraces,

    #[error("no replacement policies given")]
    NoPolicies,

    #[error("cannot open trace {}: {source}", path.display())]
    TraceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read trace {}: {source}", path.display())]
    TraceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// All frames are occupied but the policy has no resident page to offer.
    #[error("replacement policy has no victim while all frames are occupied")]
    VictimUnavailable,

    #[error("cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid workload: {0}")]
    InvalidWorkload(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
