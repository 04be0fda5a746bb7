use ndarray::{Array2, ArrayView2};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;

/// Smallest score an action can have, so every action keeps a chance of
/// being picked.
pub const SCORE_FLOOR: f32 = 0.0001;

/// Turns `(env, action)` anticipator scores into one categorical
/// distribution per row.
pub fn action_probabilities(scores: ArrayView2<f32>) -> Array2<f32> {
    // f32::max maps NaN to the floor
    let mut probabilities = scores.mapv(|score| score.max(SCORE_FLOOR));
    for mut row in probabilities.rows_mut() {
        let sum = row.sum();
        if sum.is_finite() {
            row /= sum;
        } else {
            row.fill(1.0 / row.len() as f32);
        }
    }
    probabilities
}

/// Picks one action index per row of `probabilities`.
pub fn sample_actions<R: Rng>(
    probabilities: ArrayView2<f32>,
    random_policy: bool,
    rng: &mut R,
) -> Result<Vec<usize>, WeightedError> {
    probabilities
        .rows()
        .into_iter()
        .map(|row| -> Result<usize, WeightedError> {
            if random_policy {
                Ok(rng.gen_range(0..row.len()))
            } else {
                Ok(WeightedIndex::<f32>::new(row.iter())?.sample(rng))
            }
        })
        .collect()
}
