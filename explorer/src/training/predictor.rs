use super::run_epochs;
use crate::ExploreError;
use episode_data::{DynamicsExample, PredictorSequence};
use episode_queues::EpisodeQueue;
use model::traits::SequencePredictor;
use ndarray::{concatenate, s, Axis};
use rand::Rng;

pub const PREDICTOR_BATCH_SIZE: usize = 64;
pub const PREDICTOR_EPOCHS: usize = 5;

/// Teacher-forced training sequences for every chunk of `example`: the input
/// at step `t` is `concat(code_t, action_t)` and the target is `code_{t+1}`.
pub fn format_predictor_sequences(
    example: &DynamicsExample,
) -> Result<Vec<PredictorSequence>, ExploreError> {
    let capacity = example.capacity();
    let steps = capacity - 1;
    let codes = example.code_chunks();
    let actions = example.action_chunks();
    example
        .valid_lengths()
        .iter()
        .enumerate()
        .map(|(chunk, &valid_length)| -> Result<PredictorSequence, ExploreError> {
            let mut inputs = concatenate(
                Axis(1),
                &[
                    codes.slice(s![chunk, ..steps, ..]),
                    actions.slice(s![chunk, ..steps, ..]),
                ],
            )?;
            if valid_length < capacity {
                inputs.row_mut(valid_length - 1).fill(0.0);
            }
            Ok(PredictorSequence {
                inputs,
                targets: codes.slice(s![chunk, 1.., ..]).to_owned(),
                length: valid_length - 1,
            })
        })
        .collect()
}

/// Trains on every queued example without removing it; the anticipator
/// stage still needs them.
pub fn train_predictor<P, R>(
    predictor: &mut P,
    dynamics_queue: &EpisodeQueue<DynamicsExample>,
    rng: &mut R,
) -> Result<Vec<f32>, ExploreError>
where
    P: SequencePredictor,
    R: Rng,
{
    let per_example = dynamics_queue.with_contents(|examples| {
        examples
            .iter()
            .map(format_predictor_sequences)
            .collect::<Result<Vec<_>, _>>()
    })?;
    let mut sequences = per_example.into_iter().flatten().collect::<Vec<_>>();
    log::debug!("training sequence predictor on {} sequences", sequences.len());
    run_epochs(
        "sequence predictor",
        &mut sequences,
        PREDICTOR_BATCH_SIZE,
        PREDICTOR_EPOCHS,
        rng,
        |batch| predictor.train_batch(batch),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::episode_to_dynamics_example;
    use crate::reshape::test_support::{episode, EchoPredictor, SumEncoder, LATENT_DIM};
    use episode_data::ACTION_DIM;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dynamics_example(len: usize, capacity: usize) -> DynamicsExample {
        episode_to_dynamics_example(&SumEncoder, &episode(len), capacity)
            .unwrap()
            .1
            .unwrap()
    }

    #[test]
    fn sequences_pair_each_step_with_the_next_code() {
        let example = dynamics_example(5, 3);
        let sequences = format_predictor_sequences(&example).unwrap();
        assert_eq!(sequences.len(), 2);
        let full = &sequences[0];
        assert_eq!(full.length, 2);
        assert_eq!(full.inputs.dim(), (2, LATENT_DIM + ACTION_DIM));
        assert_eq!(full.inputs.slice(s![.., ..LATENT_DIM]), example.code_chunks().slice(s![0, ..2, ..]));
        assert_eq!(full.inputs.slice(s![.., LATENT_DIM..]), example.action_chunks().slice(s![0, ..2, ..]));
        assert_eq!(full.targets, example.code_chunks().slice(s![0, 1.., ..]));

        let padded = &sequences[1];
        assert_eq!(padded.length, 1);
        assert!(padded.inputs.row(0).iter().all(|&v| v != 0.0));
        assert!(padded.inputs.row(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn training_keeps_the_dynamics_queue() {
        let queue = EpisodeQueue::with_max_size("dynamics", 2);
        queue.push(dynamics_example(5, 3)).unwrap();
        queue.push(dynamics_example(9, 3)).unwrap();
        let losses =
            train_predictor(&mut EchoPredictor, &queue, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(losses.len(), PREDICTOR_EPOCHS);
        assert_eq!(queue.len(), 2);
    }
}
