mod anticipator;
mod predictor;

pub use anticipator::{train_anticipator, ANTICIPATOR_BATCH_SIZE, ANTICIPATOR_EPOCHS};
pub use predictor::{format_predictor_sequences, train_predictor, PREDICTOR_BATCH_SIZE, PREDICTOR_EPOCHS};

use crate::ExploreError;
use model::{ModelError, TrainingStepInfo};
use rand::seq::SliceRandom;
use rand::Rng;

/// Trains on `items` for `epochs` passes, reshuffling before each pass.
/// Returns the step-weighted mean loss of every epoch.
fn run_epochs<T, R, F>(
    name: &str,
    items: &mut [T],
    batch_size: usize,
    epochs: usize,
    rng: &mut R,
    mut train_batch: F,
) -> Result<Vec<f32>, ExploreError>
where
    R: Rng,
    F: FnMut(&[T]) -> Result<TrainingStepInfo, ModelError>,
{
    if items.is_empty() {
        log::debug!("no {name} training data this iteration");
        return Ok(vec![]);
    }
    let mut epoch_losses = Vec::with_capacity(epochs);
    for epoch in 1..=epochs {
        items.shuffle(rng);
        let mut weighted_loss = 0.0;
        let mut n_steps = 0;
        let mut train_step = 0;
        for batch in items.chunks(batch_size) {
            let info = train_batch(batch)?;
            weighted_loss += info.loss * info.n_steps as f32;
            n_steps += info.n_steps;
            train_step = info.train_step;
        }
        let mean_loss = if n_steps > 0 {
            weighted_loss / n_steps as f32
        } else {
            0.0
        };
        log::debug!(
            "{name} epoch {epoch}/{epochs} (train step {train_step}): mean loss {mean_loss:.6} over {n_steps} steps"
        );
        epoch_losses.push(mean_loss);
    }
    Ok(epoch_losses)
}
