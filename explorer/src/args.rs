use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Curiosity-driven exploration of a box pushing world", long_about = None)]
pub struct Args {
    /// Environment to explore (boxpush-v0 or boxpush-empty-v0).
    #[arg(long, default_value = "boxpush-v0")]
    pub env_id: String,
    /// Number of environments stepped in parallel.
    #[arg(long, default_value_t = 8)]
    pub num_env: usize,
    #[arg(long, default_value_t = 100)]
    pub num_iterations: u32,
    /// Dimensionality of the frame encoder's latent codes.
    #[arg(long, default_value_t = 4)]
    pub latent_dim: usize,
    /// Directory holding checkpoints and heatmap records. Created if absent.
    #[arg(long, default_value = "runs/default")]
    pub working_dir: PathBuf,
    #[arg(long, default_value_t = 1)]
    pub episodes_per_env: usize,
    #[arg(long, default_value_t = 200)]
    pub max_episode_length: usize,
    /// Capacity of the sequence chunks the recurrent models train on.
    #[arg(long, default_value_t = 50)]
    pub max_sequence_length: usize,
    #[arg(long)]
    pub validation_data_dir: Option<PathBuf>,
    /// Pick actions uniformly instead of following the anticipator.
    #[arg(long)]
    pub random_policy: bool,
    /// Per-step probability of ending an episode once it has two steps.
    /// Defaults to 1 / (2 * max_episode_length).
    #[arg(long)]
    pub termination_probability: Option<f64>,
    /// Also train the sequence predictor on every iteration's rollouts.
    #[arg(long)]
    pub train_predictor: bool,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "debug")]
    pub log_level: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("{0} must be positive")]
    NotPositive(&'static str),
    #[error("max sequence length must be at least 2, got {0}")]
    SequenceTooShort(usize),
    #[error("termination probability must lie in [0, 1], got {0}")]
    Probability(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExplorationSettings {
    pub env_id: String,
    pub num_env: usize,
    pub num_iterations: u32,
    pub latent_dim: usize,
    pub working_dir: PathBuf,
    pub episodes_per_env: usize,
    pub max_episode_length: usize,
    pub max_sequence_length: usize,
    pub validation_data_dir: Option<PathBuf>,
    pub random_policy: bool,
    pub termination_probability: f64,
    pub train_predictor: bool,
    pub seed: u64,
}

impl ExplorationSettings {
    pub fn from_args(args: &Args) -> Result<Self, SettingsError> {
        let positive = [
            ("num_env", args.num_env),
            ("num_iterations", args.num_iterations as usize),
            ("latent_dim", args.latent_dim),
            ("episodes_per_env", args.episodes_per_env),
            ("max_episode_length", args.max_episode_length),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(SettingsError::NotPositive(*name));
        }
        if args.max_sequence_length < 2 {
            return Err(SettingsError::SequenceTooShort(args.max_sequence_length));
        }
        let termination_probability = args
            .termination_probability
            .unwrap_or(1.0 / (2.0 * args.max_episode_length as f64));
        if !(0.0..=1.0).contains(&termination_probability) {
            return Err(SettingsError::Probability(termination_probability));
        }
        Ok(Self {
            env_id: args.env_id.clone(),
            num_env: args.num_env,
            num_iterations: args.num_iterations,
            latent_dim: args.latent_dim,
            working_dir: args.working_dir.clone(),
            episodes_per_env: args.episodes_per_env,
            max_episode_length: args.max_episode_length,
            max_sequence_length: args.max_sequence_length,
            validation_data_dir: args.validation_data_dir.clone(),
            random_policy: args.random_policy,
            termination_probability,
            train_predictor: args.train_predictor,
            seed: args.seed,
        })
    }
    /// Episodes produced per iteration; every queue holds at most this many
    /// items.
    pub fn queue_capacity(&self) -> usize {
        self.num_env * self.episodes_per_env
    }
    pub fn heatmap_dir(&self) -> PathBuf {
        self.working_dir.join("heatmap_records")
    }
}
