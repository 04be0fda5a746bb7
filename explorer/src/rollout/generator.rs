use super::policy::{action_probabilities, sample_actions};
use crate::ExploreError;
use boxpush::VecEnv;
use episode_data::{Action, Episode, ACTION_DIM};
use episode_queues::EpisodeQueue;
use model::traits::Anticipator;
use ndarray::{s, Array2, Array4, ArrayView1, ArrayView4, Axis};
use rand::Rng;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RolloutSettings {
    pub episodes_per_env: usize,
    pub max_episode_length: usize,
    /// Per-step chance of ending an episode that already has two steps.
    pub termination_probability: f64,
    pub random_policy: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RolloutStats {
    pub episodes: usize,
    pub frames: usize,
}

/// Runs `episodes_per_env` rounds of one episode per environment, choosing
/// actions by the anticipator's scores, and pushes every episode into
/// `episode_queue`.
///
/// The anticipator's recurrent state is reset at the start of each round and
/// carried across the steps within it.
pub fn generate_rollouts<A, V, R>(
    episode_queue: &EpisodeQueue<Episode>,
    anticipator: &mut A,
    env: &mut V,
    settings: &RolloutSettings,
    action_set: &[Action],
    rng: &mut R,
) -> Result<RolloutStats, ExploreError>
where
    A: Anticipator,
    V: VecEnv,
    R: Rng,
{
    let num_env = env.num_envs();
    let max_length = settings.max_episode_length;
    let mut stats = RolloutStats::default();
    for _ in 0..settings.episodes_per_env {
        let start = Instant::now();
        let mut observations = normalize(env.reset()?);
        anticipator.reset_state();
        let (_, height, width, channels) = observations.dim();
        let mut frames = vec![Array4::<f32>::zeros((max_length, height, width, channels)); num_env];
        let mut actions = vec![Array2::<f32>::zeros((max_length, ACTION_DIM)); num_env];
        let mut lengths = vec![0usize; num_env];
        let mut dones = vec![false; num_env];

        for _ in 0..max_length {
            let scores = score_actions(anticipator, observations.view(), action_set)?;
            let probabilities = action_probabilities(scores.view());
            let choices = sample_actions(probabilities.view(), settings.random_policy, rng)?;
            let mut chosen_actions = Array2::zeros((num_env, ACTION_DIM));
            for (mut row, &choice) in chosen_actions.rows_mut().into_iter().zip(&choices) {
                row.assign(&ArrayView1::from(&action_set[choice]));
            }

            for env_index in 0..num_env {
                if dones[env_index] {
                    continue;
                }
                let step = lengths[env_index];
                frames[env_index]
                    .index_axis_mut(Axis(0), step)
                    .assign(&observations.index_axis(Axis(0), env_index));
                actions[env_index]
                    .row_mut(step)
                    .assign(&chosen_actions.row(env_index));
                lengths[env_index] += 1;
                let stop = rng.gen::<f64>() < settings.termination_probability;
                if stop && lengths[env_index] >= 2 {
                    dones[env_index] = true;
                }
            }

            observations = normalize(env.step(chosen_actions.view())?.observations);
            if dones.iter().all(|&done| done) {
                break;
            }
        }

        for ((frames, actions), &length) in frames.into_iter().zip(actions).zip(&lengths) {
            let episode = Episode::new(
                frames.slice(s![..length, .., .., ..]).to_owned(),
                actions.slice(s![..length, ..]).to_owned(),
            )?;
            episode_queue.push(episode)?;
        }
        let running_time = start.elapsed().as_secs_f64();
        log::debug!("generated episodes with lengths: {:?}", lengths);
        log::debug!(
            "took {:.3} seconds, per-environment efficiency is {:.3}",
            running_time,
            num_env as f64 / running_time
        );
        stats.episodes += num_env;
        stats.frames += lengths.iter().sum::<usize>();
    }
    Ok(stats)
}

/// Scores every (environment, candidate action) pair in one batched call and
/// returns them as `(env, action)`.
fn score_actions<A: Anticipator>(
    anticipator: &mut A,
    observations: ArrayView4<f32>,
    action_set: &[Action],
) -> Result<Array2<f32>, ExploreError> {
    let (num_env, height, width, channels) = observations.dim();
    let n_actions = action_set.len();
    let mut frame_batch = Array4::zeros((num_env * n_actions, height, width, channels));
    let mut action_batch = Array2::zeros((num_env * n_actions, ACTION_DIM));
    for env_index in 0..num_env {
        for (action_index, action) in action_set.iter().enumerate() {
            let row = env_index * n_actions + action_index;
            frame_batch
                .index_axis_mut(Axis(0), row)
                .assign(&observations.index_axis(Axis(0), env_index));
            action_batch.row_mut(row).assign(&ArrayView1::from(action));
        }
    }
    let scores = anticipator.predict_batch_retain_state(frame_batch.view(), action_batch.view())?;
    if scores.len() != num_env * n_actions {
        return Err(ExploreError::BatchSizeMismatch {
            what: "anticipator",
            expected: num_env * n_actions,
            got: scores.len(),
        });
    }
    Ok(scores.into_shape((num_env, n_actions))?)
}

fn normalize(observations: Array4<u8>) -> Array4<f32> {
    observations.mapv(|pixel| f32::from(pixel) / 255.0)
}
