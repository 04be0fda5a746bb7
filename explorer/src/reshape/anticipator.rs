use crate::ExploreError;
use episode_data::{AnticipatorExample, DynamicsExample};
use episode_queues::EpisodeQueue;
use model::traits::{FrameEncoder, SequencePredictor};
use ndarray::{s, Array4, ArrayView2, ArrayView3, ArrayView5, Axis};
use rayon::prelude::*;

/// Drains `dynamics_queue` and pushes one [`AnticipatorExample`] per dynamics
/// example into `anticipator_queue`, labelling every step with the
/// predictor's reconstruction loss on the frame that followed it.
///
/// Examples are processed concurrently on the rayon pool. Returns the valid
/// lengths of each example's chunks in the order they were queued.
pub fn reshape_for_anticipator<E, P>(
    encoder: &E,
    predictor: &P,
    dynamics_queue: &EpisodeQueue<DynamicsExample>,
    anticipator_queue: &EpisodeQueue<AnticipatorExample>,
) -> Result<Vec<Vec<usize>>, ExploreError>
where
    E: FrameEncoder + Sync,
    P: SequencePredictor + Sync,
{
    dynamics_queue
        .drain_all()
        .into_par_iter()
        .map(|example| -> Result<Vec<usize>, ExploreError> {
            let valid_lengths = example.valid_lengths().to_vec();
            anticipator_queue.push(dynamics_to_anticipator_example(encoder, predictor, &example)?)?;
            Ok(valid_lengths)
        })
        .collect()
}

pub fn dynamics_to_anticipator_example<E, P>(
    encoder: &E,
    predictor: &P,
    example: &DynamicsExample,
) -> Result<AnticipatorExample, ExploreError>
where
    E: FrameEncoder,
    P: SequencePredictor,
{
    let n_chunks = example.n_chunks();
    let capacity = example.capacity();
    let steps = capacity - 1;
    let valid_lengths = example.valid_lengths();

    // every input step is paired with the step after it, so the last one goes
    let mut input_codes = example.code_chunks().slice(s![.., ..steps, ..]).to_owned();
    let mut input_actions = example.action_chunks().slice(s![.., ..steps, ..]).to_owned();
    let mut input_frames = example
        .frame_chunks()
        .slice(s![.., ..steps, .., .., ..])
        .to_owned();
    for (chunk, &valid_length) in valid_lengths.iter().enumerate() {
        if valid_length < capacity {
            // the last real step of a padded chunk has no successor
            input_codes.slice_mut(s![chunk, valid_length - 1, ..]).fill(0.0);
            input_actions.slice_mut(s![chunk, valid_length - 1, ..]).fill(0.0);
            input_frames
                .slice_mut(s![chunk, valid_length - 1, .., .., ..])
                .fill(0.0);
        }
    }
    let effective_lengths: Vec<usize> = valid_lengths.iter().map(|length| length - 1).collect();

    let predictions =
        predictor.predict_sequences(input_codes.view(), input_actions.view(), &effective_lengths)?;
    let latent_dim = predictions.len_of(Axis(2));
    if predictions.len() != n_chunks * steps * latent_dim {
        return Err(ExploreError::BatchSizeMismatch {
            what: "sequence predictor",
            expected: n_chunks * steps,
            got: predictions.len() / latent_dim.max(1),
        });
    }
    let predictions = predictions.into_shape((n_chunks * steps, latent_dim))?;

    let next_frames = example.frame_chunks().slice_move(s![.., 1.., .., .., ..]);
    let (_, _, height, width, channels) = next_frames.dim();
    let next_frames = Array4::from_shape_vec(
        (n_chunks * steps, height, width, channels),
        next_frames.iter().copied().collect(),
    )?;

    let losses = encoder.reconstruction_loss(predictions.view(), next_frames.view())?;
    if losses.len() != n_chunks * steps {
        return Err(ExploreError::BatchSizeMismatch {
            what: "frame encoder loss",
            expected: n_chunks * steps,
            got: losses.len(),
        });
    }
    let mut losses = losses.into_shape((n_chunks, steps))?;
    for (chunk, &effective_length) in effective_lengths.iter().enumerate() {
        losses.slice_mut(s![chunk, effective_length..]).fill(0.0);
    }

    check_anticipator_inputs(
        input_frames.view(),
        input_actions.view(),
        losses.view(),
        &effective_lengths,
    )?;
    Ok(AnticipatorExample::new(
        input_frames,
        input_actions,
        losses,
        effective_lengths,
    )?)
}

/// Everything at and after each chunk's effective length must be zero, and
/// the frames before it must not all be.
fn check_anticipator_inputs(
    frames: ArrayView5<f32>,
    actions: ArrayView3<f32>,
    losses: ArrayView2<f32>,
    effective_lengths: &[usize],
) -> Result<(), ExploreError> {
    for (chunk, &effective_length) in effective_lengths.iter().enumerate() {
        let padding = [
            (
                "input frames",
                frames
                    .slice(s![chunk, effective_length.., .., .., ..])
                    .iter()
                    .all(|&value| value == 0.0),
            ),
            (
                "input actions",
                actions
                    .slice(s![chunk, effective_length.., ..])
                    .iter()
                    .all(|&value| value == 0.0),
            ),
            (
                "losses",
                losses
                    .slice(s![chunk, effective_length..])
                    .iter()
                    .all(|&value| value == 0.0),
            ),
        ];
        if let Some((field, _)) = padding.iter().find(|(_, is_zero)| !is_zero) {
            return Err(ExploreError::NonZeroPadding {
                chunk,
                field: *field,
                effective_length,
            });
        }
        if frames
            .slice(s![chunk, ..effective_length, .., .., ..])
            .iter()
            .all(|&value| value == 0.0)
        {
            return Err(ExploreError::DegenerateInput {
                chunk,
                field: "input frames",
                effective_length,
            });
        }
    }
    Ok(())
}
