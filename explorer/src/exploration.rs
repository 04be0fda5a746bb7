use crate::reshape::{reshape_for_anticipator, reshape_for_dynamics};
use crate::rollout::{generate_rollouts, RolloutSettings};
use crate::training::{train_anticipator, train_predictor};
use crate::{ExplorationSchedule, ExplorationSettings, ExploreError};
use boxpush::{make_vec_env, VecEnv, ACTIONS, FRAME_CHANNELS};
use episode_data::{AnticipatorExample, DynamicsExample, Episode};
use episode_queues::EpisodeQueue;
use model::traits::{Anticipator, FrameEncoder, Persistable, SequencePredictor};
use model::{ModelError, ProjectionEncoder, ReservoirAnticipator, ReservoirPredictor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

/// The three learned components of a run.
pub struct Components<E, P, A> {
    pub encoder: E,
    pub predictor: P,
    pub anticipator: A,
}

/// Fresh components sized for `settings`, each seeded from `settings.seed`.
pub fn build_components(
    settings: &ExplorationSettings,
) -> Result<Components<ProjectionEncoder, ReservoirPredictor, ReservoirAnticipator>, ModelError> {
    Ok(Components {
        encoder: ProjectionEncoder::new(settings.latent_dim, FRAME_CHANNELS, settings.seed),
        predictor: ReservoirPredictor::new(settings.latent_dim, settings.seed.wrapping_add(1))?,
        anticipator: ReservoirAnticipator::new(FRAME_CHANNELS, settings.seed.wrapping_add(2))?,
    })
}

/// Builds the environment and components for `settings`, restores any
/// checkpoints found in the working directory and runs every iteration.
pub fn run_exploration(settings: &ExplorationSettings) -> Result<ExplorationSchedule, ExploreError> {
    log_configuration(settings);
    std::fs::create_dir_all(&settings.working_dir)?;
    let env = make_vec_env(&settings.env_id, settings.num_env, settings.seed)?;
    let mut exploration = Exploration::new(settings.clone(), env, build_components(settings)?);
    exploration.restore_checkpoints()?;
    exploration.run()
}

fn log_configuration(settings: &ExplorationSettings) {
    log::info!("Iterative exploration on {}", settings.env_id);
    log::info!(
        "{} iterations over {} environments (with {} episodes per env per iteration).",
        settings.num_iterations,
        settings.num_env,
        settings.episodes_per_env
    );
    log::info!(
        "Max episode length {}, max sequence length {}",
        settings.max_episode_length,
        settings.max_sequence_length
    );
    match &settings.validation_data_dir {
        Some(dir) => log::info!("Validation data dir: {}", dir.display()),
        None => log::info!("No validation data provided."),
    }
    if settings.random_policy {
        log::warn!("USING RANDOM POLICY INSTEAD OF ANTICIPATOR POLICY");
    }
}

/// The iteration loop: rollouts, both reshaping stages, anticipator training
/// and periodic checkpoints.
pub struct Exploration<V, E, P, A> {
    settings: ExplorationSettings,
    env: V,
    components: Components<E, P, A>,
    episode_queue: EpisodeQueue<Episode>,
    dynamics_queue: EpisodeQueue<DynamicsExample>,
    anticipator_queue: EpisodeQueue<AnticipatorExample>,
    schedule: ExplorationSchedule,
    rng: StdRng,
}

impl<V, E, P, A> Exploration<V, E, P, A>
where
    V: VecEnv,
    E: FrameEncoder + Persistable + Sync,
    P: SequencePredictor + Persistable + Sync,
    A: Anticipator + Persistable,
{
    pub fn new(settings: ExplorationSettings, env: V, components: Components<E, P, A>) -> Self {
        let capacity = settings.queue_capacity();
        Self {
            schedule: ExplorationSchedule::new(settings.num_iterations),
            rng: StdRng::seed_from_u64(settings.seed),
            settings,
            env,
            components,
            episode_queue: EpisodeQueue::with_max_size("policy rollouts", capacity),
            dynamics_queue: EpisodeQueue::with_max_size("dynamics training", capacity),
            anticipator_queue: EpisodeQueue::with_max_size("anticipator training", capacity),
        }
    }

    pub fn schedule(&self) -> &ExplorationSchedule {
        &self.schedule
    }

    pub fn components(&self) -> &Components<E, P, A> {
        &self.components
    }

    /// Loads the parameters of every component that has a checkpoint in the
    /// working directory.
    pub fn restore_checkpoints(&mut self) -> Result<(), ExploreError> {
        let dir = &self.settings.working_dir;
        restore(&mut self.components.encoder, dir)?;
        restore(&mut self.components.predictor, dir)?;
        restore(&mut self.components.anticipator, dir)?;
        Ok(())
    }

    /// Runs every remaining iteration, then saves the components and closes
    /// the environment.
    pub fn run(mut self) -> Result<ExplorationSchedule, ExploreError> {
        while let Some(iteration) = self.schedule.next_iteration() {
            self.run_iteration(iteration)?;
        }
        log::info!("Done.");
        self.save_components()?;
        self.env.close()?;
        Ok(self.schedule)
    }

    fn run_iteration(&mut self, iteration: u32) -> Result<(), ExploreError> {
        log::info!("{}", "_".repeat(20));
        log::info!("Iteration {}", iteration);

        log::debug!("Exploring and generating rollouts...");
        self.env
            .set_record_write(&self.settings.heatmap_dir(), &format!("it{iteration}"))?;
        let rollout_settings = RolloutSettings {
            episodes_per_env: self.settings.episodes_per_env,
            max_episode_length: self.settings.max_episode_length,
            termination_probability: self.settings.termination_probability,
            random_policy: self.settings.random_policy,
        };
        let stats = generate_rollouts(
            &self.episode_queue,
            &mut self.components.anticipator,
            &mut self.env,
            &rollout_settings,
            &ACTIONS,
            &mut self.rng,
        )?;
        log::debug!(
            "Generated {} episodes in total ({} frames)",
            stats.episodes,
            stats.frames
        );

        log::debug!("Formatting rollouts for the sequence predictor...");
        let chunk_lengths = reshape_for_dynamics(
            &self.components.encoder,
            &self.episode_queue,
            &self.dynamics_queue,
            self.settings.max_sequence_length,
        )?;
        log_conversion(&chunk_lengths);

        if self.settings.train_predictor {
            log::debug!("Training sequence predictor on rollouts...");
            train_predictor(
                &mut self.components.predictor,
                &self.dynamics_queue,
                &mut self.rng,
            )?;
        }

        log::debug!("Labelling rollout frames with predictor reconstruction loss for the anticipator...");
        let chunk_lengths = reshape_for_anticipator(
            &self.components.encoder,
            &self.components.predictor,
            &self.dynamics_queue,
            &self.anticipator_queue,
        )?;
        log_conversion(&chunk_lengths);

        log::debug!("Training anticipator on rollouts...");
        train_anticipator(
            &mut self.components.anticipator,
            &self.anticipator_queue,
            &mut self.rng,
        )?;

        if self.schedule.is_time_to_checkpoint() {
            log::info!("Saving...");
            self.save_components()?;
        }

        self.schedule.record_rollouts(stats);
        log::info!(
            "Total episodes seen so far: {}",
            self.schedule.total_episodes_seen()
        );
        log::info!("Total frames: {}", self.schedule.total_frames_seen());
        Ok(())
    }

    fn save_components(&self) -> Result<(), ExploreError> {
        let dir = &self.settings.working_dir;
        for path in [
            self.components.encoder.save(dir)?,
            self.components.predictor.save(dir)?,
            self.components.anticipator.save(dir)?,
        ] {
            log::debug!("saved {}", path.display());
        }
        Ok(())
    }
}

fn restore<C: Persistable>(component: &mut C, dir: &Path) -> Result<(), ModelError> {
    let path = component.checkpoint_path(dir);
    if path.exists() {
        component.load(dir)?;
        log::info!("restored {} from {}", component.save_prefix(), path.display());
    }
    Ok(())
}

fn log_conversion(chunk_lengths: &[Vec<usize>]) {
    let n_sequences: usize = chunk_lengths.iter().map(Vec::len).sum();
    let n_frames: usize = chunk_lengths.iter().flatten().sum();
    log::debug!(
        "Converted {} episodes to {} sequences ({} frames).",
        chunk_lengths.len(),
        n_sequences,
        n_frames
    );
}
