mod anticipator_example;
mod dynamics_example;
mod episode;
mod error;
mod predictor_sequence;

pub use anticipator_example::{AnticipatorExample, AnticipatorSequence};
pub use dynamics_example::DynamicsExample;
pub use episode::Episode;
pub use error::DataError;
pub use predictor_sequence::PredictorSequence;

pub const ACTION_DIM: usize = 2;

/// A continuous control vector, `[forward, turn]`.
pub type Action = [f32; ACTION_DIM];
