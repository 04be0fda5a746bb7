use crate::rollout::RolloutStats;

/// Iteration counter and cumulative rollout totals of one run. Totals only
/// ever grow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplorationSchedule {
    num_iterations: u32,
    iteration: u32,
    total_episodes_seen: u64,
    total_frames_seen: u64,
}

impl ExplorationSchedule {
    pub fn new(num_iterations: u32) -> Self {
        Self {
            num_iterations,
            iteration: 0,
            total_episodes_seen: 0,
            total_frames_seen: 0,
        }
    }
    /// Advances to the next iteration, numbered from 1. Returns `None` once
    /// every iteration has started.
    pub fn next_iteration(&mut self) -> Option<u32> {
        if self.iteration >= self.num_iterations {
            return None;
        }
        self.iteration += 1;
        Some(self.iteration)
    }
    pub fn iteration(&self) -> u32 {
        self.iteration
    }
    pub fn num_iterations(&self) -> u32 {
        self.num_iterations
    }
    pub fn is_time_to_checkpoint(&self) -> bool {
        self.iteration == 1 || self.iteration % 2 == 0
    }
    pub fn record_rollouts(&mut self, stats: RolloutStats) {
        self.total_episodes_seen += stats.episodes as u64;
        self.total_frames_seen += stats.frames as u64;
    }
    pub fn total_episodes_seen(&self) -> u64 {
        self.total_episodes_seen
    }
    pub fn total_frames_seen(&self) -> u64 {
        self.total_frames_seen
    }
}
