use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{what} has shape {got:?}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: String,
        got: Vec<usize>,
    },
    #[error("sequence {sequence} has length {length} but only {steps} steps")]
    InvalidLength {
        sequence: usize,
        length: usize,
        steps: usize,
    },
    #[error("checkpoint {path} holds {saved}, expected {expected}")]
    CheckpointMismatch {
        path: String,
        saved: String,
        expected: String,
    },
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("checkpoint codec error: {0}")]
    Codec(#[from] file_io::CodecError),
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
    #[error("parameter map lock was poisoned")]
    ParameterLock,
}

/// Checks `shape` against `expected`, where `None` accepts any extent.
pub(crate) fn ensure_shape(
    what: &'static str,
    shape: &[usize],
    expected: &[Option<usize>],
) -> Result<(), ModelError> {
    let matches = shape.len() == expected.len()
        && shape
            .iter()
            .zip(expected)
            .all(|(got, expected)| expected.map_or(true, |expected| *got == expected));
    if matches {
        Ok(())
    } else {
        let expected = expected
            .iter()
            .map(|extent| extent.map_or("_".to_string(), |extent| extent.to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        Err(ModelError::ShapeMismatch {
            what,
            expected: format!("[{expected}]"),
            got: shape.to_vec(),
        })
    }
}
