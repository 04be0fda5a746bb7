mod anticipator;
mod encoder;
mod features;
mod predictor;
mod reservoir;

pub use anticipator::ReservoirAnticipator;
pub use encoder::ProjectionEncoder;
pub use predictor::ReservoirPredictor;

use crate::ModelError;
use candle_core::{DType, Device, Shape, Tensor, Var};
use candle_nn::{Init, Linear, VarBuilder, VarMap};
use ndarray::{Array1, Array2, ArrayView, Dimension};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn check_checkpoint<T: PartialEq + std::fmt::Debug>(
    path: &Path,
    saved: T,
    expected: T,
) -> Result<(), ModelError> {
    if saved == expected {
        Ok(())
    } else {
        Err(ModelError::CheckpointMismatch {
            path: path.display().to_string(),
            saved: format!("{saved:?}"),
            expected: format!("{expected:?}"),
        })
    }
}

fn tensor_from_view<D: Dimension>(view: ArrayView<f32, D>) -> Result<Tensor, ModelError> {
    let shape = view.shape().to_vec();
    let values = view.iter().copied().collect::<Vec<_>>();
    Ok(Tensor::from_vec(values, shape, &Device::Cpu)?)
}

fn array2_from_tensor(tensor: &Tensor) -> Result<Array2<f32>, ModelError> {
    let (rows, cols) = tensor.dims2()?;
    let values = tensor.flatten_all()?.to_vec1::<f32>()?;
    Ok(Array2::from_shape_vec((rows, cols), values)?)
}

fn array1_from_tensor(tensor: &Tensor) -> Result<Array1<f32>, ModelError> {
    Ok(Array1::from_vec(tensor.flatten_all()?.to_vec1::<f32>()?))
}

/// Registers a fixed uniform(-scale, scale) parameter drawn from `rng`. It is
/// saved with the map but returned detached, so no gradient reaches it.
fn fixed_uniform<S: Into<Shape>>(
    varmap: &VarMap,
    name: &str,
    shape: S,
    scale: f32,
    rng: &mut StdRng,
) -> Result<Tensor, ModelError> {
    let shape = shape.into();
    let values = (0..shape.elem_count())
        .map(|_| rng.gen_range(-scale..=scale))
        .collect::<Vec<f32>>();
    let var = Var::from_tensor(&Tensor::from_vec(values, shape, &Device::Cpu)?)?;
    let tensor = var.as_tensor().detach();
    varmap
        .data()
        .lock()
        .map_err(|_| ModelError::ParameterLock)?
        .insert(name.to_string(), var);
    Ok(tensor)
}

/// A trainable read-out layer starting from all-zero weights.
fn zeroed_linear(
    input_len: usize,
    output_len: usize,
    vb: VarBuilder,
) -> Result<Linear, ModelError> {
    let weight = vb.get_with_hints((output_len, input_len), "weight", Init::Const(0.0))?;
    let bias = vb.get_with_hints(output_len, "bias", Init::Const(0.0))?;
    Ok(Linear::new(weight, Some(bias)))
}

fn var_builder(varmap: &VarMap) -> VarBuilder<'_> {
    VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu)
}

/// Everything of a recurrent model's checkpoint except its parameters, which
/// go to a safetensors file next to it.
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointHeader {
    input_len: usize,
    output_len: usize,
    train_steps: u64,
}

fn save_checkpoint(
    path: &Path,
    varmap: &VarMap,
    header: &CheckpointHeader,
) -> Result<(), ModelError> {
    varmap.save(path.with_extension("safetensors"))?;
    file_io::save_compressed(path, header)?;
    Ok(())
}

/// Checks the saved sizes against `expected` and loads the parameters into
/// `varmap`. Returns the saved step counter.
fn load_checkpoint(
    path: &Path,
    varmap: &mut VarMap,
    expected: (usize, usize),
) -> Result<u64, ModelError> {
    let header: CheckpointHeader = file_io::load_compressed(path)?;
    check_checkpoint(path, (header.input_len, header.output_len), expected)?;
    varmap.load(path.with_extension("safetensors"))?;
    Ok(header.train_steps)
}
