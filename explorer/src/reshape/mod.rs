//! Conversion of raw episodes into fixed-capacity training chunks, first for
//! the sequence predictor and then for the anticipator.

mod anticipator;
mod chunking;
mod dynamics;

pub use anticipator::{dynamics_to_anticipator_example, reshape_for_anticipator};
pub use chunking::{split_into_chunks, Chunk};
pub use dynamics::{episode_to_dynamics_example, reshape_for_dynamics};
