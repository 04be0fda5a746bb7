mod args;
mod error;
mod exploration;
mod logging;
pub mod reshape;
pub mod rollout;
mod schedule;
pub mod training;

pub use args::{Args, ExplorationSettings, SettingsError};
pub use error::ExploreError;
pub use exploration::{build_components, run_exploration, Components, Exploration};
pub use logging::init_logging;
pub use schedule::ExplorationSchedule;
