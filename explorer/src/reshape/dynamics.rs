use super::chunking::split_into_chunks;
use crate::ExploreError;
use episode_data::{DynamicsExample, Episode};
use episode_queues::EpisodeQueue;
use model::traits::FrameEncoder;
use ndarray::{s, stack, Axis};
use rayon::prelude::*;

/// Drains `episode_queue`, splits every episode into chunks of
/// `max_sequence_length` steps, encodes them and pushes one
/// [`DynamicsExample`] per episode into `dynamics_queue`.
///
/// Episodes are processed concurrently on the rayon pool, so examples arrive
/// in completion order. Returns the valid lengths of each episode's chunks in
/// the order the episodes were queued.
pub fn reshape_for_dynamics<E>(
    encoder: &E,
    episode_queue: &EpisodeQueue<Episode>,
    dynamics_queue: &EpisodeQueue<DynamicsExample>,
    max_sequence_length: usize,
) -> Result<Vec<Vec<usize>>, ExploreError>
where
    E: FrameEncoder + Sync,
{
    episode_queue
        .drain_all()
        .into_par_iter()
        .map(|episode| -> Result<Vec<usize>, ExploreError> {
            let (valid_lengths, example) =
                episode_to_dynamics_example(encoder, &episode, max_sequence_length)?;
            match example {
                Some(example) => dynamics_queue.push(example)?,
                None => log::debug!("dropped an episode of {} steps", episode.len()),
            }
            Ok(valid_lengths)
        })
        .collect()
}

/// Chunks and encodes a single episode. Returns `None` in place of the
/// example when no chunk has at least two steps.
pub fn episode_to_dynamics_example<E: FrameEncoder>(
    encoder: &E,
    episode: &Episode,
    capacity: usize,
) -> Result<(Vec<usize>, Option<DynamicsExample>), ExploreError> {
    let frame_chunks = split_into_chunks(episode.frames(), capacity)?;
    let action_chunks = split_into_chunks(episode.actions(), capacity)?;

    let mut code_chunks = Vec::with_capacity(frame_chunks.len());
    for chunk in frame_chunks.iter().filter(|chunk| chunk.valid_length >= 2) {
        let mut codes = encoder.encode(chunk.data.view())?;
        if codes.nrows() != capacity {
            return Err(ExploreError::BatchSizeMismatch {
                what: "frame encoder",
                expected: capacity,
                got: codes.nrows(),
            });
        }
        codes.slice_mut(s![chunk.valid_length.., ..]).fill(0.0);
        code_chunks.push(codes);
    }
    let boundaries_match = frame_chunks
        .iter()
        .zip(&action_chunks)
        .all(|(frames, actions)| frames.valid_length == actions.valid_length);
    if code_chunks.len() != frame_chunks.len()
        || action_chunks.len() != frame_chunks.len()
        || !boundaries_match
    {
        return Err(ExploreError::ChunkCountMismatch {
            codes: code_chunks.len(),
            actions: action_chunks.len(),
            frames: frame_chunks.len(),
        });
    }

    let valid_lengths: Vec<usize> = frame_chunks.iter().map(|chunk| chunk.valid_length).collect();
    if valid_lengths.is_empty() {
        return Ok((valid_lengths, None));
    }
    let codes = code_chunks.iter().map(|codes| codes.view()).collect::<Vec<_>>();
    let actions = action_chunks.iter().map(|chunk| chunk.data.view()).collect::<Vec<_>>();
    let frames = frame_chunks.iter().map(|chunk| chunk.data.view()).collect::<Vec<_>>();
    let example = DynamicsExample::new(
        stack(Axis(0), &codes)?,
        stack(Axis(0), &actions)?,
        valid_lengths.clone(),
        stack(Axis(0), &frames)?,
    )?;
    Ok((valid_lengths, Some(example)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::test_support::{episode, SumEncoder};

    #[test]
    fn five_steps_make_a_full_and_a_padded_chunk() {
        let (lengths, example) = episode_to_dynamics_example(&SumEncoder, &episode(5), 3).unwrap();
        let example = example.unwrap();
        assert_eq!(lengths, vec![3, 2]);
        assert_eq!(example.n_chunks(), 2);
        assert_eq!(example.capacity(), 3);
        let padded = example.frame_chunks().slice(s![1, 2, .., .., ..]).to_owned();
        assert!(padded.iter().all(|&v| v == 0.0));
        assert!(example.action_chunks().slice(s![1, 2, ..]).iter().all(|&v| v == 0.0));
        assert!(example.code_chunks().slice(s![1, 2.., ..]).iter().all(|&v| v == 0.0));
        assert!(example.code_chunks().slice(s![1, ..2, ..]).iter().all(|&v| v != 0.0));
    }

    #[test]
    fn single_step_episode_contributes_nothing() {
        let episodes = EpisodeQueue::with_max_size("policy", 1);
        let dynamics = EpisodeQueue::with_max_size("dynamics", 1);
        episodes.push(episode(1)).unwrap();
        let lengths = reshape_for_dynamics(&SumEncoder, &episodes, &dynamics, 3).unwrap();
        assert_eq!(lengths, vec![Vec::<usize>::new()]);
        assert!(episodes.is_empty());
        assert!(dynamics.is_empty());
    }

    #[test]
    fn reshaping_the_same_episodes_twice_gives_the_same_examples() {
        let input: Vec<Episode> = [4, 9, 2].into_iter().map(episode).collect();
        let reshape = || {
            let episodes = EpisodeQueue::with_max_size("policy", input.len());
            let dynamics = EpisodeQueue::with_max_size("dynamics", input.len());
            for episode in &input {
                episodes.push(episode.clone()).unwrap();
            }
            let lengths = reshape_for_dynamics(&SumEncoder, &episodes, &dynamics, 4).unwrap();
            let mut examples = dynamics.drain_all();
            examples.sort_by_key(|example| example.valid_lengths().to_vec());
            (lengths, examples)
        };
        let (first_lengths, first_examples) = reshape();
        let (second_lengths, second_examples) = reshape();
        assert_eq!(first_lengths, vec![vec![4], vec![4, 4], vec![2]]);
        assert_eq!(first_lengths, second_lengths);
        assert_eq!(first_examples.len(), 3);
        for (first, second) in first_examples.iter().zip(&second_examples) {
            assert_eq!(first.valid_lengths(), second.valid_lengths());
            assert_eq!(first.code_chunks(), second.code_chunks());
            assert_eq!(first.action_chunks(), second.action_chunks());
            assert_eq!(first.frame_chunks(), second.frame_chunks());
        }
    }

    #[test]
    fn capacity_of_one_is_an_error() {
        assert!(matches!(
            episode_to_dynamics_example(&SumEncoder, &episode(5), 1),
            Err(ExploreError::ChunkCapacity(1))
        ));
    }
}
