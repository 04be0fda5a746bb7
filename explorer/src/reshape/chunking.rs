use crate::ExploreError;
use ndarray::{Array, ArrayView, Axis, Dimension, Slice};

/// `capacity` consecutive steps of a sequence, zero-padded past
/// `valid_length`.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk<D: Dimension> {
    pub data: Array<f32, D>,
    pub valid_length: usize,
}

/// Splits `sequence` along axis 0 into consecutive chunks of `capacity`
/// steps. A trailing chunk shorter than 2 steps is dropped and a shorter
/// trailing chunk is zero-padded to full capacity.
///
/// Chunk boundaries only depend on the sequence length, so frames and actions
/// of one episode split into corresponding chunks.
pub fn split_into_chunks<D: Dimension>(
    sequence: ArrayView<f32, D>,
    capacity: usize,
) -> Result<Vec<Chunk<D>>, ExploreError> {
    if capacity < 2 {
        return Err(ExploreError::ChunkCapacity(capacity));
    }
    let len = sequence.len_of(Axis(0));
    let chunks = (0..len)
        .step_by(capacity)
        .filter_map(|start| {
            let end = (start + capacity).min(len);
            let valid_length = end - start;
            if valid_length < 2 {
                return None;
            }
            let steps = sequence.slice_axis(Axis(0), Slice::from(start..end));
            let mut dim = steps.raw_dim();
            dim[0] = capacity;
            let mut data = Array::zeros(dim);
            data.slice_axis_mut(Axis(0), Slice::from(0..valid_length))
                .assign(&steps);
            Some(Chunk { data, valid_length })
        })
        .collect();
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{concatenate, s, Array1, Array2};

    fn ramp(len: usize) -> Array2<f32> {
        Array2::from_shape_fn((len, 2), |(step, i)| (1 + step * 2 + i) as f32)
    }

    #[test]
    fn five_steps_in_chunks_of_three() {
        let chunks = split_into_chunks(ramp(5).view(), 3).unwrap();
        let lengths: Vec<_> = chunks.iter().map(|chunk| chunk.valid_length).collect();
        assert_eq!(lengths, vec![3, 2]);
        assert_eq!(chunks[1].data.row(0), ramp(5).row(3));
        assert_eq!(chunks[1].data.row(2), Array1::<f32>::zeros(2));
    }

    #[test]
    fn single_step_sequence_has_no_chunks() {
        assert!(split_into_chunks(ramp(1).view(), 3).unwrap().is_empty());
    }

    #[test]
    fn trailing_single_step_is_dropped() {
        let chunks = split_into_chunks(ramp(7).view(), 3).unwrap();
        let lengths: Vec<_> = chunks.iter().map(|chunk| chunk.valid_length).collect();
        assert_eq!(lengths, vec![3, 3]);
    }

    #[test]
    fn valid_prefixes_reconstruct_the_sequence() {
        for len in 2..30 {
            for capacity in 2..8 {
                let sequence = ramp(len);
                let chunks = split_into_chunks(sequence.view(), capacity).unwrap();
                let prefixes: Vec<_> = chunks
                    .iter()
                    .map(|chunk| chunk.data.slice(s![..chunk.valid_length, ..]))
                    .collect();
                let rebuilt = concatenate(Axis(0), &prefixes).unwrap();
                // only a lone trailing step may be lost
                let kept = if len % capacity == 1 { len - 1 } else { len };
                assert_eq!(rebuilt, sequence.slice(s![..kept, ..]));
                for chunk in &chunks {
                    assert_eq!(chunk.data.nrows(), capacity);
                    assert!(chunk.data.slice(s![chunk.valid_length.., ..]).iter().all(|&v| v == 0.0));
                }
            }
        }
    }

    #[test]
    fn splitting_is_deterministic() {
        let sequence = ramp(11);
        assert_eq!(
            split_into_chunks(sequence.view(), 4).unwrap(),
            split_into_chunks(sequence.view(), 4).unwrap()
        );
    }

    #[test]
    fn capacity_below_two_is_rejected() {
        for capacity in [0, 1] {
            assert!(matches!(
                split_into_chunks(ramp(5).view(), capacity),
                Err(ExploreError::ChunkCapacity(c)) if c == capacity
            ));
        }
    }
}
