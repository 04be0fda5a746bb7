use super::fixed_uniform;
use crate::ModelError;
use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module, VarMap};
use rand::rngs::StdRng;

/// Spectral scale of the recurrent weights; below 1 so the state fades out
/// instead of saturating.
const RECURRENT_SCALE: f32 = 0.9;

/// A fixed, randomly initialized recurrent layer (echo-state network). Only
/// the read-outs on top of it are trained.
pub struct Reservoir {
    input: Linear,
    recurrent: Linear,
    size: usize,
}

impl Reservoir {
    /// Draws the weights from `rng` and registers them in `varmap` under
    /// `reservoir.*` so they are checkpointed with the read-out.
    pub fn new(
        varmap: &VarMap,
        rng: &mut StdRng,
        input_len: usize,
        size: usize,
    ) -> Result<Self, ModelError> {
        let input_scale = 1.0 / (input_len.max(1) as f32).sqrt();
        // uniform(-a, a) has std a / sqrt(3)
        let recurrent_scale = RECURRENT_SCALE * 3.0_f32.sqrt() / (size.max(1) as f32).sqrt();
        let input_weight = fixed_uniform(
            varmap,
            "reservoir.input.weight",
            (size, input_len),
            input_scale,
            rng,
        )?;
        let recurrent_weight = fixed_uniform(
            varmap,
            "reservoir.recurrent.weight",
            (size, size),
            recurrent_scale,
            rng,
        )?;
        let bias = fixed_uniform(varmap, "reservoir.input.bias", size, 0.1, rng)?;
        Ok(Self {
            input: Linear::new(input_weight, Some(bias)),
            recurrent: Linear::new(recurrent_weight, None),
            size,
        })
    }
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn zero_state(&self, batch_len: usize) -> Result<Tensor, ModelError> {
        Ok(Tensor::zeros((batch_len, self.size), DType::F32, &Device::Cpu)?)
    }
    /// One step for every row of `inputs` with the matching row of `hidden`.
    pub fn step(&self, inputs: &Tensor, hidden: &Tensor) -> Result<Tensor, ModelError> {
        let activation = (self.input.forward(inputs)? + self.recurrent.forward(hidden)?)?;
        Ok(activation.tanh()?)
    }
    /// Runs the `(steps, input_len)` rows of `inputs` as one stream from a
    /// zero state and returns the `(steps, size)` states it passes through.
    pub fn unroll(&self, inputs: &Tensor) -> Result<Tensor, ModelError> {
        let steps = inputs.dim(0)?;
        if steps == 0 {
            return self.zero_state(0);
        }
        let mut hidden = self.zero_state(1)?;
        let mut states = Vec::with_capacity(steps);
        for step in 0..steps {
            hidden = self.step(&inputs.narrow(0, step, 1)?, &hidden)?;
            states.push(hidden.clone());
        }
        Ok(Tensor::cat(&states, 0)?)
    }
}
