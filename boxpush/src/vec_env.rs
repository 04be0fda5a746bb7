use super::heatmap_record::HeatmapRecord;
use super::render::render;
use super::world::BoxPushWorld;
use super::{EnvError, FRAME_SIZE};
use episode_data::ACTION_DIM;
use ndarray::{stack, Array4, ArrayView2, Axis};
use std::path::Path;

pub struct StepResult {
    /// `(env, height, width, channel)` pixels in `[0, 255]`.
    pub observations: Array4<u8>,
    pub rewards: Vec<f32>,
    pub dones: Vec<bool>,
}

/// A batch of environments stepped in lockstep.
pub trait VecEnv {
    fn num_envs(&self) -> usize;
    fn reset(&mut self) -> Result<Array4<u8>, EnvError>;
    /// `actions` holds one `[forward, turn]` row per environment.
    fn step(&mut self, actions: ArrayView2<f32>) -> Result<StepResult, EnvError>;
    /// Starts a new heatmap record, flushing the previous one if any.
    fn set_record_write(&mut self, dir: &Path, prefix: &str) -> Result<(), EnvError>;
    fn close(&mut self) -> Result<(), EnvError>;
}

pub struct BoxPushVecEnv {
    worlds: Vec<BoxPushWorld>,
    record: Option<HeatmapRecord>,
    closed: bool,
}

impl BoxPushVecEnv {
    pub fn new(worlds: Vec<BoxPushWorld>) -> Self {
        Self {
            worlds,
            record: None,
            closed: false,
        }
    }
    fn ensure_open(&self) -> Result<(), EnvError> {
        if self.closed {
            Err(EnvError::Closed)
        } else {
            Ok(())
        }
    }
    fn observations(&mut self) -> Result<Array4<u8>, EnvError> {
        let frames = self
            .worlds
            .iter()
            .map(|world| render(world, FRAME_SIZE))
            .collect::<Vec<_>>();
        let views = frames.iter().map(|frame| frame.view()).collect::<Vec<_>>();
        if let Some(record) = &mut self.record {
            for (env_index, world) in self.worlds.iter().enumerate() {
                record.record(env_index, world.agent());
            }
        }
        Ok(stack(Axis(0), &views)?)
    }
    fn flush_record(&mut self) -> Result<(), EnvError> {
        match self.record.take() {
            Some(record) => record.write(),
            None => Ok(()),
        }
    }
}

impl VecEnv for BoxPushVecEnv {
    fn num_envs(&self) -> usize {
        self.worlds.len()
    }
    fn reset(&mut self) -> Result<Array4<u8>, EnvError> {
        self.ensure_open()?;
        for world in &mut self.worlds {
            world.reset();
        }
        self.observations()
    }
    fn step(&mut self, actions: ArrayView2<f32>) -> Result<StepResult, EnvError> {
        self.ensure_open()?;
        if actions.dim() != (self.worlds.len(), ACTION_DIM) {
            return Err(EnvError::ActionShape {
                expected_envs: self.worlds.len(),
                expected_dim: ACTION_DIM,
                got: actions.shape().to_vec(),
            });
        }
        let rewards = self
            .worlds
            .iter_mut()
            .zip(actions.outer_iter())
            .map(|(world, action)| world.step([action[0], action[1]]))
            .collect::<Vec<_>>();
        let dones = vec![false; self.worlds.len()];
        Ok(StepResult {
            observations: self.observations()?,
            rewards,
            dones,
        })
    }
    fn set_record_write(&mut self, dir: &Path, prefix: &str) -> Result<(), EnvError> {
        self.ensure_open()?;
        self.flush_record()?;
        self.record = Some(HeatmapRecord::new(dir, prefix, self.worlds.len()));
        Ok(())
    }
    fn close(&mut self) -> Result<(), EnvError> {
        self.ensure_open()?;
        self.flush_record()?;
        self.closed = true;
        Ok(())
    }
}
