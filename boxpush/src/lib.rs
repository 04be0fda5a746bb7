mod error;
mod heatmap_record;
mod render;
mod vec_env;
mod world;

pub use error::EnvError;
pub use heatmap_record::HeatmapRecord;
pub use vec_env::{BoxPushVecEnv, StepResult, VecEnv};
pub use world::{BoxPushWorld, WorldConfig};

use episode_data::Action;

/// No-op, straight ahead, and forward with three turn rates.
pub const ACTIONS: [Action; 5] = [[0.0, 0.0], [1.0, 0.0], [1.0, 0.5], [1.0, -0.5], [1.0, 1.0]];

pub const FRAME_SIZE: usize = 64;
pub const FRAME_CHANNELS: usize = 3;

pub const ENV_IDS: [&str; 2] = ["boxpush-v0", "boxpush-empty-v0"];

/// Builds `num_env` independent worlds of the given kind; world `i` is seeded
/// with `seed + i`.
pub fn make_vec_env(env_id: &str, num_env: usize, seed: u64) -> Result<BoxPushVecEnv, EnvError> {
    let config = match env_id {
        "boxpush-v0" => WorldConfig { with_box: true },
        "boxpush-empty-v0" => WorldConfig { with_box: false },
        _ => return Err(EnvError::UnknownEnv(env_id.to_string())),
    };
    if num_env == 0 {
        return Err(EnvError::NoEnvironments);
    }
    let worlds = (0..num_env as u64)
        .map(|rank| BoxPushWorld::new(config, seed.wrapping_add(rank)))
        .collect();
    Ok(BoxPushVecEnv::new(worlds))
}
