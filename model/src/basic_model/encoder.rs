use super::check_checkpoint;
use super::features::{feature_len, pooled_batch};
use crate::error::ensure_shape;
use crate::traits::{FrameEncoder, Persistable};
use crate::ModelError;
use ndarray::{Array1, Array2, ArrayView2, ArrayView4, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pixel value subtracted before projecting; mid-gray decodes from a zero code.
const FEATURE_MEAN: f32 = 0.5;

/// Encodes pooled frame features by a fixed random projection with unit-norm
/// rows, and decodes with its transpose.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectionEncoder {
    channels: usize,
    projection: Array2<f32>,
}

impl ProjectionEncoder {
    pub fn new(latent_dim: usize, channels: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut projection = Array2::from_shape_fn((latent_dim, feature_len(channels)), |_| {
            rng.gen_range(-1.0_f32..=1.0)
        });
        for mut row in projection.outer_iter_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row /= norm;
            }
        }
        Self {
            channels,
            projection,
        }
    }
    fn features(&self, frames: ArrayView4<f32>, what: &'static str) -> Result<Array2<f32>, ModelError> {
        ensure_shape(what, frames.shape(), &[None, None, None, Some(self.channels)])?;
        Ok(pooled_batch(frames))
    }
}

impl FrameEncoder for ProjectionEncoder {
    fn latent_dim(&self) -> usize {
        self.projection.nrows()
    }
    fn encode(&self, frames: ArrayView4<f32>) -> Result<Array2<f32>, ModelError> {
        let features = self.features(frames, "frames")? - FEATURE_MEAN;
        Ok(features.dot(&self.projection.t()))
    }
    fn reconstruction_loss(
        &self,
        codes: ArrayView2<f32>,
        target_frames: ArrayView4<f32>,
    ) -> Result<Array1<f32>, ModelError> {
        let batch_len = target_frames.len_of(Axis(0));
        ensure_shape("codes", codes.shape(), &[Some(batch_len), Some(self.latent_dim())])?;
        let targets = self.features(target_frames, "target_frames")?;
        let reconstructions = codes.dot(&self.projection) + FEATURE_MEAN;
        let squared_errors = (reconstructions - targets).mapv_into(|e| e * e);
        Ok(squared_errors
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(batch_len)))
    }
}

impl Persistable for ProjectionEncoder {
    fn save_prefix(&self) -> String {
        format!("frame_encoder_{}dim", self.latent_dim())
    }
    fn save<P: AsRef<Path>>(&self, working_dir: P) -> Result<PathBuf, ModelError> {
        let path = self.checkpoint_path(working_dir);
        file_io::save_compressed(&path, self)?;
        Ok(path)
    }
    fn load<P: AsRef<Path>>(&mut self, working_dir: P) -> Result<(), ModelError> {
        let path = self.checkpoint_path(working_dir);
        let loaded: Self = file_io::load_compressed(&path)?;
        check_checkpoint(
            &path,
            loaded.projection.dim(),
            self.projection.dim(),
        )?;
        *self = loaded;
        Ok(())
    }
}
