use super::features::{feature_len, pooled_batch};
use super::reservoir::Reservoir;
use super::{
    array1_from_tensor, load_checkpoint, save_checkpoint, tensor_from_view, var_builder,
    zeroed_linear, CheckpointHeader,
};
use crate::error::ensure_shape;
use crate::traits::{Anticipator, Persistable};
use crate::{ModelError, TrainingStepInfo};
use candle_core::Tensor;
use candle_nn::{AdamW, Linear, Module, Optimizer, ParamsAdamW, VarMap};
use episode_data::{AnticipatorSequence, ACTION_DIM};
use ndarray::{s, Array1, ArrayView2, ArrayView4, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

const RESERVOIR_SIZE: usize = 128;
const LEARNING_RATE: f64 = 1e-2;

/// Reservoir recurrent scorer over pooled frame features and the candidate
/// action, with a trained scalar read-out of the expected prediction loss.
pub struct ReservoirAnticipator {
    channels: usize,
    varmap: VarMap,
    reservoir: Reservoir,
    readout: Linear,
    optimizer: AdamW,
    train_steps: u64,
    saved_state: Option<Tensor>,
}

impl ReservoirAnticipator {
    pub fn new(channels: usize, seed: u64) -> Result<Self, ModelError> {
        let varmap = VarMap::new();
        // a zero read-out scores every action equally until the first training
        let readout = zeroed_linear(RESERVOIR_SIZE, 1, var_builder(&varmap).pp("readout"))?;
        let optimizer = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: LEARNING_RATE,
                ..Default::default()
            },
        )?;
        let reservoir = Reservoir::new(
            &varmap,
            &mut StdRng::seed_from_u64(seed),
            feature_len(channels) + ACTION_DIM,
            RESERVOIR_SIZE,
        )?;
        Ok(Self {
            channels,
            varmap,
            reservoir,
            readout,
            optimizer,
            train_steps: 0,
            saved_state: None,
        })
    }
    pub fn train_steps(&self) -> u64 {
        self.train_steps
    }
    fn step_inputs(
        &self,
        frames: ArrayView4<f32>,
        actions: ArrayView2<f32>,
    ) -> Result<Tensor, ModelError> {
        Ok(Tensor::cat(
            &[
                tensor_from_view(pooled_batch(frames).view())?,
                tensor_from_view(actions)?,
            ],
            1,
        )?)
    }
}

impl Anticipator for ReservoirAnticipator {
    fn predict_batch_retain_state(
        &mut self,
        frames: ArrayView4<f32>,
        actions: ArrayView2<f32>,
    ) -> Result<Array1<f32>, ModelError> {
        let batch_len = frames.len_of(Axis(0));
        ensure_shape("frames", frames.shape(), &[None, None, None, Some(self.channels)])?;
        ensure_shape("actions", actions.shape(), &[Some(batch_len), Some(ACTION_DIM)])?;
        let hidden = match self.saved_state.take() {
            Some(state) if state.dim(0).ok() == Some(batch_len) => state,
            _ => self.reservoir.zero_state(batch_len)?,
        };
        let inputs = self.step_inputs(frames, actions)?;
        let hidden = self.reservoir.step(&inputs, &hidden)?;
        let scores = array1_from_tensor(&self.readout.forward(&hidden)?)?;
        self.saved_state = Some(hidden);
        Ok(scores)
    }
    fn train_batch(
        &mut self,
        batch: &[AnticipatorSequence<'_>],
    ) -> Result<TrainingStepInfo, ModelError> {
        let mut states = Vec::with_capacity(batch.len());
        let mut targets = Vec::with_capacity(batch.len());
        for (index, sequence) in batch.iter().enumerate() {
            let steps = sequence.losses.len();
            let length = sequence.effective_length;
            ensure_shape(
                "frames",
                sequence.frames.shape(),
                &[Some(steps), None, None, Some(self.channels)],
            )?;
            ensure_shape(
                "actions",
                sequence.actions.shape(),
                &[Some(steps), Some(ACTION_DIM)],
            )?;
            if length > steps {
                return Err(ModelError::InvalidLength {
                    sequence: index,
                    length,
                    steps,
                });
            }
            if length == 0 {
                continue;
            }
            let inputs = self.step_inputs(
                sequence.frames.slice(s![..length, .., .., ..]),
                sequence.actions.slice(s![..length, ..]),
            )?;
            states.push(self.reservoir.unroll(&inputs)?);
            let losses = tensor_from_view(sequence.losses.slice(s![..length]))?;
            targets.push(losses.reshape((length, 1))?);
        }
        if states.is_empty() {
            return Ok(TrainingStepInfo {
                train_step: self.train_steps,
                ..Default::default()
            });
        }
        let states = Tensor::cat(&states, 0)?;
        let targets = Tensor::cat(&targets, 0)?;
        let loss = candle_nn::loss::mse(&self.readout.forward(&states)?, &targets)?;
        self.optimizer.backward_step(&loss)?;
        self.train_steps += 1;
        Ok(TrainingStepInfo {
            loss: loss.to_scalar::<f32>()?,
            n_steps: states.dim(0)?,
            train_step: self.train_steps,
        })
    }
    fn reset_state(&mut self) {
        self.saved_state = None;
    }
}

impl Persistable for ReservoirAnticipator {
    fn save_prefix(&self) -> String {
        "anticipator".to_string()
    }
    fn save<P: AsRef<Path>>(&self, working_dir: P) -> Result<PathBuf, ModelError> {
        let path = self.checkpoint_path(working_dir);
        let header = CheckpointHeader {
            input_len: feature_len(self.channels) + ACTION_DIM,
            output_len: 1,
            train_steps: self.train_steps,
        };
        save_checkpoint(&path, &self.varmap, &header)?;
        Ok(path)
    }
    fn load<P: AsRef<Path>>(&mut self, working_dir: P) -> Result<(), ModelError> {
        let path = self.checkpoint_path(working_dir);
        self.train_steps = load_checkpoint(
            &path,
            &mut self.varmap,
            (feature_len(self.channels) + ACTION_DIM, 1),
        )?;
        self.saved_state = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array2, Array4};

    fn frames(len: usize) -> Array4<f32> {
        Array::from_shape_fn((len, 4, 4, 3), |(t, y, x, c)| {
            ((t + y + x + c) % 5) as f32 / 5.0
        })
    }

    #[test]
    fn untrained_scores_are_uniform() {
        let mut anticipator = ReservoirAnticipator::new(3, 0).unwrap();
        let scores = anticipator
            .predict_batch_retain_state(frames(6).view(), Array2::ones((6, ACTION_DIM)).view())
            .unwrap();
        assert_eq!(scores.len(), 6);
        assert!(scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn retained_state_changes_the_next_score() {
        let mut anticipator = ReservoirAnticipator::new(3, 2).unwrap();
        let losses = Array1::from_elem(3, 0.4_f32);
        let frames = frames(3);
        let actions = Array2::from_elem((3, ACTION_DIM), 0.5_f32);
        let sequence = AnticipatorSequence {
            frames: frames.view(),
            actions: actions.view(),
            losses: losses.view(),
            effective_length: 3,
        };
        anticipator.train_batch(&[sequence]).unwrap();

        let frame = frames.slice(s![..1, .., .., ..]);
        let action = actions.slice(s![..1, ..]);
        let first = anticipator.predict_batch_retain_state(frame, action).unwrap();
        let second = anticipator.predict_batch_retain_state(frame, action).unwrap();
        anticipator.reset_state();
        let after_reset = anticipator.predict_batch_retain_state(frame, action).unwrap();
        assert_ne!(first, second);
        assert_eq!(first, after_reset);
    }

    #[test]
    fn training_moves_scores_toward_losses() {
        let mut anticipator = ReservoirAnticipator::new(3, 4).unwrap();
        let frames = frames(4);
        let actions = Array2::from_elem((4, ACTION_DIM), 1.0_f32);
        let losses = Array1::from_vec(vec![0.3, 0.2, 0.1, 0.0]);
        let sequence = AnticipatorSequence {
            frames: frames.view(),
            actions: actions.view(),
            losses: losses.view(),
            effective_length: 3,
        };
        let first = anticipator.train_batch(&[sequence]).unwrap();
        let mut last = first;
        for _ in 0..30 {
            last = anticipator.train_batch(&[sequence]).unwrap();
        }
        assert_eq!(first.n_steps, 3);
        assert!(last.loss < first.loss);
    }

    #[test]
    fn checkpoint_keeps_the_step_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut trained = ReservoirAnticipator::new(3, 6).unwrap();
        let frames = frames(3);
        let actions = Array2::from_elem((3, ACTION_DIM), 1.0_f32);
        let losses = Array1::from_elem(3, 0.2_f32);
        let sequence = AnticipatorSequence {
            frames: frames.view(),
            actions: actions.view(),
            losses: losses.view(),
            effective_length: 2,
        };
        for _ in 0..3 {
            trained.train_batch(&[sequence]).unwrap();
        }
        trained.save(dir.path()).unwrap();
        let expected = trained
            .predict_batch_retain_state(frames.view(), actions.view())
            .unwrap();

        let mut restored = ReservoirAnticipator::new(3, 7).unwrap();
        restored.load(dir.path()).unwrap();
        assert_eq!(restored.train_steps(), 3);
        let scores = restored
            .predict_batch_retain_state(frames.view(), actions.view())
            .unwrap();
        for (a, b) in scores.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
