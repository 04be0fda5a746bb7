use super::{DataError, ACTION_DIM};
use ndarray::{Array3, Array5, ArrayView3, ArrayView5, Axis};

/// All surviving chunks of one episode, stacked along axis 0, with latent
/// codes computed by the frame encoder. Codes at and after each chunk's valid
/// length are zero.
#[derive(Clone, Debug)]
pub struct DynamicsExample {
    code_chunks: Array3<f32>,
    action_chunks: Array3<f32>,
    valid_lengths: Vec<usize>,
    frame_chunks: Array5<f32>,
}

impl DynamicsExample {
    pub fn new(
        code_chunks: Array3<f32>,
        action_chunks: Array3<f32>,
        valid_lengths: Vec<usize>,
        frame_chunks: Array5<f32>,
    ) -> Result<Self, DataError> {
        let n_chunks = valid_lengths.len();
        let capacity = code_chunks.len_of(Axis(1));
        check_chunk_axes("code_chunks", code_chunks.shape(), n_chunks, capacity)?;
        check_chunk_axes("action_chunks", action_chunks.shape(), n_chunks, capacity)?;
        check_chunk_axes("frame_chunks", frame_chunks.shape(), n_chunks, capacity)?;
        if action_chunks.len_of(Axis(2)) != ACTION_DIM {
            return Err(DataError::ActionDim(action_chunks.len_of(Axis(2))));
        }
        for (chunk, &length) in valid_lengths.iter().enumerate() {
            if length == 0 || length > capacity {
                return Err(DataError::InvalidLength {
                    chunk,
                    length,
                    capacity,
                });
            }
        }
        Ok(Self {
            code_chunks,
            action_chunks,
            valid_lengths,
            frame_chunks,
        })
    }
    pub fn n_chunks(&self) -> usize {
        self.valid_lengths.len()
    }
    /// Steps per chunk including padding.
    pub fn capacity(&self) -> usize {
        self.code_chunks.len_of(Axis(1))
    }
    pub fn latent_dim(&self) -> usize {
        self.code_chunks.len_of(Axis(2))
    }
    pub fn code_chunks(&self) -> ArrayView3<f32> {
        self.code_chunks.view()
    }
    pub fn action_chunks(&self) -> ArrayView3<f32> {
        self.action_chunks.view()
    }
    pub fn valid_lengths(&self) -> &[usize] {
        &self.valid_lengths
    }
    pub fn frame_chunks(&self) -> ArrayView5<f32> {
        self.frame_chunks.view()
    }
}

pub(crate) fn check_chunk_axes(
    field: &'static str,
    shape: &[usize],
    n_chunks: usize,
    capacity: usize,
) -> Result<(), DataError> {
    if shape[0] != n_chunks {
        return Err(DataError::ChunkCount {
            field,
            expected: n_chunks,
            got: shape[0],
        });
    }
    if shape[1] != capacity {
        return Err(DataError::Capacity {
            field,
            expected: capacity,
            got: shape[1],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_chunk_counts_are_rejected() {
        let result = DynamicsExample::new(
            Array3::zeros((2, 3, 4)),
            Array3::zeros((1, 3, ACTION_DIM)),
            vec![3, 2],
            Array5::zeros((2, 3, 2, 2, 3)),
        );
        assert_eq!(
            result.unwrap_err(),
            DataError::ChunkCount {
                field: "action_chunks",
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn lengths_beyond_capacity_are_rejected() {
        let result = DynamicsExample::new(
            Array3::zeros((1, 3, 4)),
            Array3::zeros((1, 3, ACTION_DIM)),
            vec![4],
            Array5::zeros((1, 3, 2, 2, 3)),
        );
        assert!(matches!(
            result,
            Err(DataError::InvalidLength { length: 4, .. })
        ));
    }
}
