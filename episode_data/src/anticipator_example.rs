use super::dynamics_example::check_chunk_axes;
use super::{DataError, ACTION_DIM};
use ndarray::{s, Array2, Array3, Array5, ArrayView1, ArrayView2, ArrayView4, Axis};

/// Anticipator training data derived from one [`crate::DynamicsExample`].
///
/// Each chunk holds the input frames and actions with the final step
/// dropped, and the predictor's per-step reconstruction loss of the frame
/// that followed. Everything at and after a chunk's effective length is zero.
#[derive(Clone, Debug)]
pub struct AnticipatorExample {
    input_frames: Array5<f32>,
    input_actions: Array3<f32>,
    losses: Array2<f32>,
    effective_lengths: Vec<usize>,
}

impl AnticipatorExample {
    pub fn new(
        input_frames: Array5<f32>,
        input_actions: Array3<f32>,
        losses: Array2<f32>,
        effective_lengths: Vec<usize>,
    ) -> Result<Self, DataError> {
        let n_chunks = effective_lengths.len();
        let steps = losses.len_of(Axis(1));
        check_chunk_axes("input_frames", input_frames.shape(), n_chunks, steps)?;
        check_chunk_axes("input_actions", input_actions.shape(), n_chunks, steps)?;
        check_chunk_axes("losses", losses.shape(), n_chunks, steps)?;
        if input_actions.len_of(Axis(2)) != ACTION_DIM {
            return Err(DataError::ActionDim(input_actions.len_of(Axis(2))));
        }
        for (chunk, &length) in effective_lengths.iter().enumerate() {
            if length == 0 || length > steps {
                return Err(DataError::InvalidLength {
                    chunk,
                    length,
                    capacity: steps,
                });
            }
        }
        Ok(Self {
            input_frames,
            input_actions,
            losses,
            effective_lengths,
        })
    }
    pub fn n_chunks(&self) -> usize {
        self.effective_lengths.len()
    }
    pub fn effective_lengths(&self) -> &[usize] {
        &self.effective_lengths
    }
    pub fn sequence(&self, chunk: usize) -> AnticipatorSequence<'_> {
        AnticipatorSequence {
            frames: self.input_frames.slice(s![chunk, .., .., .., ..]),
            actions: self.input_actions.slice(s![chunk, .., ..]),
            losses: self.losses.slice(s![chunk, ..]),
            effective_length: self.effective_lengths[chunk],
        }
    }
    pub fn sequences(&self) -> impl Iterator<Item = AnticipatorSequence<'_>> {
        (0..self.n_chunks()).map(|chunk| self.sequence(chunk))
    }
}

/// A borrowed single chunk of an [`AnticipatorExample`]; the unit the
/// anticipator trains on.
#[derive(Clone, Copy, Debug)]
pub struct AnticipatorSequence<'a> {
    pub frames: ArrayView4<'a, f32>,
    pub actions: ArrayView2<'a, f32>,
    pub losses: ArrayView1<'a, f32>,
    pub effective_length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_borrow_each_chunk() {
        let mut losses = Array2::zeros((2, 3));
        losses[[1, 0]] = 0.5;
        let example = AnticipatorExample::new(
            Array5::zeros((2, 3, 2, 2, 3)),
            Array3::zeros((2, 3, ACTION_DIM)),
            losses,
            vec![3, 1],
        )
        .unwrap();
        let sequences: Vec<_> = example.sequences().collect();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[1].effective_length, 1);
        assert_eq!(sequences[1].losses[0], 0.5);
        assert_eq!(sequences[0].frames.dim(), (3, 2, 2, 3));
    }
}
