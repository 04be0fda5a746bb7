mod generator;
mod policy;

pub use generator::{generate_rollouts, RolloutSettings, RolloutStats};
pub use policy::{action_probabilities, sample_actions, SCORE_FLOOR};
