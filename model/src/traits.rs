use super::{ModelError, TrainingStepInfo};
use episode_data::{AnticipatorSequence, PredictorSequence};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, ArrayView4};
use std::path::{Path, PathBuf};

/// Maps normalized frames to latent codes and scores how well a code
/// reconstructs a frame.
pub trait FrameEncoder {
    fn latent_dim(&self) -> usize;
    /// `(batch, height, width, channel)` frames to `(batch, latent_dim)` codes.
    fn encode(&self, frames: ArrayView4<f32>) -> Result<Array2<f32>, ModelError>;
    /// Per-example loss of decoding `codes` against `target_frames`.
    fn reconstruction_loss(
        &self,
        codes: ArrayView2<f32>,
        target_frames: ArrayView4<f32>,
    ) -> Result<Array1<f32>, ModelError>;
}

/// Latent dynamics model: predicts the next latent code from the current
/// code and action.
///
/// The batched form is stateless and starts every sequence from a zero state.
/// The step form carries one hidden state per batch row across calls.
pub trait SequencePredictor {
    fn latent_dim(&self) -> usize;
    /// `(sequence, step, latent_dim)` codes and `(sequence, step, ACTION_DIM)`
    /// actions to predicted next codes of the same shape as `codes`. Outputs at
    /// and after each sequence's length are zero.
    fn predict_sequences(
        &self,
        codes: ArrayView3<f32>,
        actions: ArrayView3<f32>,
        lengths: &[usize],
    ) -> Result<Array3<f32>, ModelError>;
    /// A `continuation_mask` entry of 0 resets that row's state before the
    /// step, 1 carries it over.
    fn predict_step_retain_state(
        &mut self,
        codes: ArrayView2<f32>,
        actions: ArrayView2<f32>,
        continuation_mask: ArrayView1<f32>,
    ) -> Result<Array2<f32>, ModelError>;
    fn reset_state(&mut self);
    fn train_batch(&mut self, batch: &[PredictorSequence])
        -> Result<TrainingStepInfo, ModelError>;
}

/// Scores (frame, action) pairs by the sequence predictor's expected error
/// on the transition they start.
pub trait Anticipator {
    /// Each row is one step of its own recurrent stream; state carries over
    /// between calls as long as the batch size doesn't change.
    fn predict_batch_retain_state(
        &mut self,
        frames: ArrayView4<f32>,
        actions: ArrayView2<f32>,
    ) -> Result<Array1<f32>, ModelError>;
    fn train_batch(
        &mut self,
        batch: &[AnticipatorSequence<'_>],
    ) -> Result<TrainingStepInfo, ModelError>;
    fn reset_state(&mut self);
}

pub trait Persistable {
    /// Name prefix of this component's checkpoint within a working directory.
    fn save_prefix(&self) -> String;
    fn save<P: AsRef<Path>>(&self, working_dir: P) -> Result<PathBuf, ModelError>;
    fn load<P: AsRef<Path>>(&mut self, working_dir: P) -> Result<(), ModelError>;
    fn checkpoint_path<P: AsRef<Path>>(&self, working_dir: P) -> PathBuf {
        working_dir
            .as_ref()
            .join(format!("{}.ckpt", self.save_prefix()))
    }
}
