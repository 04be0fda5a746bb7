use super::{DataError, ACTION_DIM};
use ndarray::{Array2, Array4, ArrayView2, ArrayView4, Axis};

/// One trajectory of normalized frames `(time, height, width, channel)` and
/// the action taken after each frame `(time, ACTION_DIM)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Episode {
    frames: Array4<f32>,
    actions: Array2<f32>,
}

impl Episode {
    pub fn new(frames: Array4<f32>, actions: Array2<f32>) -> Result<Self, DataError> {
        let (n_frames, n_actions) = (frames.len_of(Axis(0)), actions.len_of(Axis(0)));
        if n_frames != n_actions {
            return Err(DataError::LengthMismatch {
                frames: n_frames,
                actions: n_actions,
            });
        }
        if actions.len_of(Axis(1)) != ACTION_DIM {
            return Err(DataError::ActionDim(actions.len_of(Axis(1))));
        }
        Ok(Self { frames, actions })
    }
    pub fn len(&self) -> usize {
        self.frames.len_of(Axis(0))
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn frames(&self) -> ArrayView4<f32> {
        self.frames.view()
    }
    pub fn actions(&self) -> ArrayView2<f32> {
        self.actions.view()
    }
}
