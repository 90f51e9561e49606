mod engine;
mod histogram;

pub use engine::{BatchUpdateOutcome, InitError, RankingEngine, SkippedUpdate};
pub use histogram::{HistogramStats, RatingHistogram};

use thiserror::Error;

/// Failures raised by the histogram and the engine. None of these corrupt
/// the histogram and none tear the engine down; callers that should never
/// trigger them treat an occurrence as an internal fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("rating {0} is outside the supported range [100, 5000]")]
    OutOfRange(i32),

    #[error("no users recorded at rating {0}")]
    Underflow(i32),

    #[error("ranking engine is not initialized")]
    NotReady
}
