use super::reservoir::Reservoir;
use super::{
    array2_from_tensor, load_checkpoint, save_checkpoint, tensor_from_view, var_builder,
    CheckpointHeader,
};
use crate::error::ensure_shape;
use crate::traits::{Persistable, SequencePredictor};
use crate::{ModelError, TrainingStepInfo};
use candle_core::Tensor;
use candle_nn::{AdamW, Linear, Module, Optimizer, ParamsAdamW, VarMap};
use episode_data::{PredictorSequence, ACTION_DIM};
use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, ArrayView3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

const RESERVOIR_SIZE: usize = 256;
const LEARNING_RATE: f64 = 1e-2;

/// Reservoir recurrent dynamics model with a trained linear read-out to the
/// next latent code.
pub struct ReservoirPredictor {
    latent_dim: usize,
    varmap: VarMap,
    reservoir: Reservoir,
    readout: Linear,
    optimizer: AdamW,
    train_steps: u64,
    saved_state: Option<Tensor>,
}

impl ReservoirPredictor {
    pub fn new(latent_dim: usize, seed: u64) -> Result<Self, ModelError> {
        let varmap = VarMap::new();
        let readout = candle_nn::linear(
            RESERVOIR_SIZE,
            latent_dim,
            var_builder(&varmap).pp("readout"),
        )?;
        // only the read-out is in the map yet, so only it is optimized
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
            latent_dim + ACTION_DIM,
            RESERVOIR_SIZE,
        )?;
        Ok(Self {
            latent_dim,
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
    /// Reservoir states of the first `length` steps of one sequence.
    fn sequence_states(
        &self,
        codes: ArrayView2<f32>,
        actions: ArrayView2<f32>,
        length: usize,
    ) -> Result<Tensor, ModelError> {
        let inputs = Tensor::cat(
            &[
                tensor_from_view(codes.slice(s![..length, ..]))?,
                tensor_from_view(actions.slice(s![..length, ..]))?,
            ],
            1,
        )?;
        self.reservoir.unroll(&inputs)
    }
}

impl SequencePredictor for ReservoirPredictor {
    fn latent_dim(&self) -> usize {
        self.latent_dim
    }
    fn predict_sequences(
        &self,
        codes: ArrayView3<f32>,
        actions: ArrayView3<f32>,
        lengths: &[usize],
    ) -> Result<Array3<f32>, ModelError> {
        let (n_sequences, steps, _) = codes.dim();
        ensure_shape(
            "codes",
            codes.shape(),
            &[Some(lengths.len()), None, Some(self.latent_dim)],
        )?;
        ensure_shape(
            "actions",
            actions.shape(),
            &[Some(n_sequences), Some(steps), Some(ACTION_DIM)],
        )?;
        let mut predictions = Array3::zeros((n_sequences, steps, self.latent_dim));
        for (sequence, &length) in lengths.iter().enumerate() {
            if length > steps {
                return Err(ModelError::InvalidLength {
                    sequence,
                    length,
                    steps,
                });
            }
            if length == 0 {
                continue;
            }
            let states = self.sequence_states(
                codes.slice(s![sequence, .., ..]),
                actions.slice(s![sequence, .., ..]),
                length,
            )?;
            let predicted = array2_from_tensor(&self.readout.forward(&states)?)?;
            predictions
                .slice_mut(s![sequence, ..length, ..])
                .assign(&predicted);
        }
        Ok(predictions)
    }
    fn predict_step_retain_state(
        &mut self,
        codes: ArrayView2<f32>,
        actions: ArrayView2<f32>,
        continuation_mask: ArrayView1<f32>,
    ) -> Result<Array2<f32>, ModelError> {
        let batch_len = continuation_mask.len();
        ensure_shape("codes", codes.shape(), &[Some(batch_len), Some(self.latent_dim)])?;
        ensure_shape("actions", actions.shape(), &[Some(batch_len), Some(ACTION_DIM)])?;
        let hidden = match self.saved_state.take() {
            Some(state) if state.dim(0).ok() == Some(batch_len) => {
                let mask = tensor_from_view(continuation_mask)?.reshape((batch_len, 1))?;
                state.broadcast_mul(&mask)?
            }
            _ => self.reservoir.zero_state(batch_len)?,
        };
        let inputs = Tensor::cat(&[tensor_from_view(codes)?, tensor_from_view(actions)?], 1)?;
        let hidden = self.reservoir.step(&inputs, &hidden)?;
        let predictions = array2_from_tensor(&self.readout.forward(&hidden)?)?;
        self.saved_state = Some(hidden);
        Ok(predictions)
    }
    fn reset_state(&mut self) {
        self.saved_state = None;
    }
    fn train_batch(
        &mut self,
        batch: &[PredictorSequence],
    ) -> Result<TrainingStepInfo, ModelError> {
        let mut states = Vec::with_capacity(batch.len());
        let mut targets = Vec::with_capacity(batch.len());
        for (index, sequence) in batch.iter().enumerate() {
            let steps = sequence.inputs.nrows();
            ensure_shape(
                "inputs",
                sequence.inputs.shape(),
                &[None, Some(self.latent_dim + ACTION_DIM)],
            )?;
            ensure_shape(
                "targets",
                sequence.targets.shape(),
                &[Some(steps), Some(self.latent_dim)],
            )?;
            if sequence.length > steps {
                return Err(ModelError::InvalidLength {
                    sequence: index,
                    length: sequence.length,
                    steps,
                });
            }
            if sequence.length == 0 {
                continue;
            }
            let inputs = tensor_from_view(sequence.inputs.slice(s![..sequence.length, ..]))?;
            states.push(self.reservoir.unroll(&inputs)?);
            targets.push(tensor_from_view(
                sequence.targets.slice(s![..sequence.length, ..]),
            )?);
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
}

impl Persistable for ReservoirPredictor {
    fn save_prefix(&self) -> String {
        format!("sequence_predictor_{}dim", self.latent_dim)
    }
    fn save<P: AsRef<Path>>(&self, working_dir: P) -> Result<PathBuf, ModelError> {
        let path = self.checkpoint_path(working_dir);
        let header = CheckpointHeader {
            input_len: self.latent_dim + ACTION_DIM,
            output_len: self.latent_dim,
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
            (self.latent_dim + ACTION_DIM, self.latent_dim),
        )?;
        self.saved_state = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array1};

    fn ramp(shape: (usize, usize, usize)) -> Array3<f32> {
        Array::from_shape_fn(shape, |(i, j, k)| 0.1 * (i + j + k) as f32 + 0.05)
    }

    fn fixed_batch() -> Vec<PredictorSequence> {
        vec![PredictorSequence {
            inputs: Array2::from_shape_fn((4, 2 + ACTION_DIM), |(i, j)| 0.2 * (i * j) as f32),
            targets: Array2::from_shape_fn((4, 2), |(i, _)| 0.5 - 0.1 * i as f32),
            length: 3,
        }]
    }

    #[test]
    fn outputs_beyond_length_are_zero() {
        let predictor = ReservoirPredictor::new(3, 0).unwrap();
        let predictions = predictor
            .predict_sequences(
                ramp((2, 4, 3)).view(),
                ramp((2, 4, ACTION_DIM)).view(),
                &[4, 2],
            )
            .unwrap();
        assert_eq!(predictions.dim(), (2, 4, 3));
        assert!(predictions.slice(s![1, 2.., ..]).iter().all(|&p| p == 0.0));
        assert!(predictions.slice(s![1, ..2, ..]).iter().any(|&p| p != 0.0));
    }

    #[test]
    fn stepwise_prediction_matches_batched_prediction() {
        let mut predictor = ReservoirPredictor::new(3, 5).unwrap();
        let codes = ramp((1, 3, 3));
        let actions = ramp((1, 3, ACTION_DIM));
        let batched = predictor
            .predict_sequences(codes.view(), actions.view(), &[3])
            .unwrap();
        predictor.reset_state();
        let mask = Array1::ones(1);
        for step in 0..3 {
            let prediction = predictor
                .predict_step_retain_state(
                    codes.slice(s![.., step, ..]),
                    actions.slice(s![.., step, ..]),
                    mask.view(),
                )
                .unwrap();
            for (a, b) in prediction.iter().zip(batched.slice(s![0, step, ..])) {
                assert!((a - b).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn zero_mask_restarts_the_state() {
        let mut predictor = ReservoirPredictor::new(2, 8).unwrap();
        let codes = Array2::from_elem((1, 2), 0.3_f32);
        let actions = Array2::from_elem((1, ACTION_DIM), 1.0_f32);
        let first = predictor
            .predict_step_retain_state(codes.view(), actions.view(), Array1::ones(1).view())
            .unwrap();
        let restarted = predictor
            .predict_step_retain_state(codes.view(), actions.view(), Array1::zeros(1).view())
            .unwrap();
        for (a, b) in first.iter().zip(restarted.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn training_lowers_loss_on_a_fixed_batch() {
        let mut predictor = ReservoirPredictor::new(2, 13).unwrap();
        let batch = fixed_batch();
        let first = predictor.train_batch(&batch).unwrap();
        let mut last = first;
        for _ in 0..50 {
            last = predictor.train_batch(&batch).unwrap();
        }
        assert_eq!(first.n_steps, 3);
        assert_eq!(first.train_step, 1);
        assert_eq!(last.train_step, 51);
        assert!(last.loss < first.loss);
    }

    #[test]
    fn checkpoint_keeps_parameters_and_step_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut trained = ReservoirPredictor::new(2, 21).unwrap();
        for _ in 0..4 {
            trained.train_batch(&fixed_batch()).unwrap();
        }
        let path = trained.save(dir.path()).unwrap();
        assert!(path.ends_with("sequence_predictor_2dim.ckpt"));
        assert!(path.with_extension("safetensors").exists());

        let codes = ramp((1, 3, 2));
        let actions = ramp((1, 3, ACTION_DIM));
        let expected = trained
            .predict_sequences(codes.view(), actions.view(), &[3])
            .unwrap();
        let mut restored = ReservoirPredictor::new(2, 22).unwrap();
        restored.load(dir.path()).unwrap();
        assert_eq!(restored.train_steps(), 4);
        let predictions = restored
            .predict_sequences(codes.view(), actions.view(), &[3])
            .unwrap();
        for (a, b) in predictions.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        let next = restored.train_batch(&fixed_batch()).unwrap();
        assert_eq!(next.train_step, 5);
    }

    #[test]
    fn checkpoint_of_another_latent_dim_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let saved = ReservoirPredictor::new(2, 1).unwrap();
        let path = saved.save(dir.path()).unwrap();
        std::fs::rename(&path, dir.path().join("sequence_predictor_3dim.ckpt")).unwrap();
        let mut other = ReservoirPredictor::new(3, 1).unwrap();
        assert!(matches!(
            other.load(dir.path()),
            Err(ModelError::CheckpointMismatch { .. })
        ));
    }
}
