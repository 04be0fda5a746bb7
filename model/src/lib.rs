mod basic_model;
mod error;
pub mod traits;

pub use basic_model::{ProjectionEncoder, ReservoirAnticipator, ReservoirPredictor};
pub use error::ModelError;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrainingStepInfo {
    /// Mean squared error over the valid steps of the batch.
    pub loss: f32,
    pub n_steps: usize,
    /// Optimizer steps taken by the model so far, this one included.
    pub train_step: u64,
}
