use super::SettingsError;
use boxpush::EnvError;
use episode_data::DataError;
use episode_queues::QueueError;
use model::ModelError;
use rand::distributions::WeightedError;
use thiserror::Error;

/// Everything that aborts an exploration run. The contract-violation
/// variants signal a reshaping bug rather than bad input.
#[derive(Error, Debug)]
pub enum ExploreError {
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("environment fault: {0}")]
    Env(#[from] EnvError),
    #[error("model fault: {0}")]
    Model(#[from] ModelError),
    #[error("invalid episode data: {0}")]
    Data(#[from] DataError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("invalid action distribution: {0}")]
    Weighted(#[from] WeightedError),
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("episode split into {codes} code chunks, {actions} action chunks and {frames} frame chunks")]
    ChunkCountMismatch {
        codes: usize,
        actions: usize,
        frames: usize,
    },
    #[error("chunk {chunk} has non-zero {field} at or after its effective length {effective_length}")]
    NonZeroPadding {
        chunk: usize,
        field: &'static str,
        effective_length: usize,
    },
    #[error("chunk {chunk} has all-zero {field} before its effective length {effective_length}")]
    DegenerateInput {
        chunk: usize,
        field: &'static str,
        effective_length: usize,
    },
    #[error("{what} returned {got} rows, expected {expected}")]
    BatchSizeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("chunk capacity must be at least 2 steps, got {0}")]
    ChunkCapacity(usize),
}
