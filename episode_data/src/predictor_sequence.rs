use ndarray::Array2;

/// One teacher-forced training sequence for the sequence predictor: row `t`
/// of `inputs` is `concat(code_t, action_t)` and row `t` of `targets` is
/// `code_{t+1}`. Only the first `length` rows are meaningful.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictorSequence {
    pub inputs: Array2<f32>,
    pub targets: Array2<f32>,
    pub length: usize,
}
