use ndarray::{Array1, Array2, Array3, ArrayView3, ArrayView4, Axis};

/// Side length of the pooling grid frames are reduced to.
pub const POOL_GRID: usize = 8;

pub fn feature_len(channels: usize) -> usize {
    POOL_GRID * POOL_GRID * channels
}

/// Average-pools a `(height, width, channel)` frame onto a
/// `POOL_GRID`×`POOL_GRID` grid and flattens it. Grid cells that receive no
/// pixel (frames smaller than the grid) stay zero.
pub fn pooled_features(frame: ArrayView3<f32>) -> Array1<f32> {
    let (height, width, channels) = frame.dim();
    let mut sums = Array3::<f32>::zeros((POOL_GRID, POOL_GRID, channels));
    let mut counts = Array2::<f32>::zeros((POOL_GRID, POOL_GRID));
    for ((y, x, c), &value) in frame.indexed_iter() {
        let (cell_y, cell_x) = (y * POOL_GRID / height, x * POOL_GRID / width);
        sums[[cell_y, cell_x, c]] += value;
        if c == 0 {
            counts[[cell_y, cell_x]] += 1.0;
        }
    }
    for ((cell_y, cell_x, _), sum) in sums.indexed_iter_mut() {
        let count = counts[[cell_y, cell_x]];
        if count > 0.0 {
            *sum /= count;
        }
    }
    Array1::from_iter(sums.iter().copied())
}

pub fn pooled_batch(frames: ArrayView4<f32>) -> Array2<f32> {
    let channels = frames.len_of(Axis(3));
    let mut features = Array2::zeros((frames.len_of(Axis(0)), feature_len(channels)));
    for (frame, mut row) in frames.outer_iter().zip(features.outer_iter_mut()) {
        row.assign(&pooled_features(frame));
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn pooling_averages_each_cell() {
        let mut frame = Array3::<f32>::zeros((16, 16, 3));
        // top-left cell is 2x2 pixels, one of which is lit in channel 1
        frame[[0, 0, 1]] = 1.0;
        let features = pooled_features(frame.view());
        assert_eq!(features.len(), feature_len(3));
        assert_eq!(features[1], 0.25);
        assert_eq!(features.sum(), 0.25);
    }

    #[test]
    fn frames_smaller_than_grid_are_supported() {
        let frames = Array4::<f32>::ones((2, 2, 2, 3));
        let features = pooled_batch(frames.view());
        assert_eq!(features.dim(), (2, feature_len(3)));
        // 4 pixels land in 4 distinct cells
        assert_eq!(features.row(0).sum(), 12.0);
    }
}
