use super::run_epochs;
use crate::ExploreError;
use episode_data::AnticipatorExample;
use episode_queues::EpisodeQueue;
use model::traits::Anticipator;
use rand::Rng;

pub const ANTICIPATOR_BATCH_SIZE: usize = 16;
pub const ANTICIPATOR_EPOCHS: usize = 3;

/// Consumes every queued example, training on each of their chunks as one
/// sequence. The queue is empty afterwards.
pub fn train_anticipator<A, R>(
    anticipator: &mut A,
    anticipator_queue: &EpisodeQueue<AnticipatorExample>,
    rng: &mut R,
) -> Result<Vec<f32>, ExploreError>
where
    A: Anticipator,
    R: Rng,
{
    let examples = anticipator_queue.drain_all();
    let mut sequences = examples
        .iter()
        .flat_map(|example| example.sequences())
        .collect::<Vec<_>>();
    log::debug!(
        "training anticipator on {} sequences from {} episodes",
        sequences.len(),
        examples.len()
    );
    run_epochs(
        "anticipator",
        &mut sequences,
        ANTICIPATOR_BATCH_SIZE,
        ANTICIPATOR_EPOCHS,
        rng,
        |batch| anticipator.train_batch(batch),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use episode_data::{AnticipatorSequence, ACTION_DIM};
    use model::{ModelError, TrainingStepInfo};
    use ndarray::{Array1, Array2, Array3, Array5, ArrayView2, ArrayView4};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Default)]
    struct CountingAnticipator {
        batch_sizes: Vec<usize>,
    }

    impl Anticipator for CountingAnticipator {
        fn predict_batch_retain_state(
            &mut self,
            frames: ArrayView4<f32>,
            _actions: ArrayView2<f32>,
        ) -> Result<Array1<f32>, ModelError> {
            Ok(Array1::zeros(frames.len_of(ndarray::Axis(0))))
        }
        fn train_batch(
            &mut self,
            batch: &[AnticipatorSequence<'_>],
        ) -> Result<TrainingStepInfo, ModelError> {
            self.batch_sizes.push(batch.len());
            Ok(TrainingStepInfo {
                loss: 0.5,
                n_steps: batch.iter().map(|sequence| sequence.effective_length).sum(),
                train_step: self.batch_sizes.len() as u64,
            })
        }
        fn reset_state(&mut self) {}
    }

    fn example(n_chunks: usize) -> AnticipatorExample {
        AnticipatorExample::new(
            Array5::from_elem((n_chunks, 3, 2, 2, 3), 0.5),
            Array3::from_elem((n_chunks, 3, ACTION_DIM), 1.0),
            Array2::from_elem((n_chunks, 3), 0.1),
            vec![3; n_chunks],
        )
        .unwrap()
    }

    #[test]
    fn every_chunk_is_trained_each_epoch_and_the_queue_is_cleared() {
        let queue = EpisodeQueue::with_max_size("anticipator", 3);
        for n_chunks in [10, 7, 3] {
            queue.push(example(n_chunks)).unwrap();
        }
        let mut anticipator = CountingAnticipator::default();
        let losses =
            train_anticipator(&mut anticipator, &queue, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(losses, vec![0.5; ANTICIPATOR_EPOCHS]);
        assert_eq!(anticipator.batch_sizes, vec![16, 4, 16, 4, 16, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn empty_queue_trains_nothing() {
        let queue = EpisodeQueue::with_max_size("anticipator", 1);
        let mut anticipator = CountingAnticipator::default();
        let losses =
            train_anticipator(&mut anticipator, &queue, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(losses.is_empty());
        assert!(anticipator.batch_sizes.is_empty());
    }
}
