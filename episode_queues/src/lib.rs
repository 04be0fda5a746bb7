mod episode_queue;

pub use episode_queue::{EpisodeQueue, QueueError};
