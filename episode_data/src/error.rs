use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DataError {
    #[error("{frames} frames but {actions} actions")]
    LengthMismatch { frames: usize, actions: usize },
    #[error("{field} has {got} entries along the chunk axis, expected {expected}")]
    ChunkCount {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{field} has chunk capacity {got}, expected {expected}")]
    Capacity {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("length {length} of chunk {chunk} is outside 1..={capacity}")]
    InvalidLength {
        chunk: usize,
        length: usize,
        capacity: usize,
    },
    #[error("action vectors have dimension {0}, expected {expected}", expected = crate::ACTION_DIM)]
    ActionDim(usize),
}
