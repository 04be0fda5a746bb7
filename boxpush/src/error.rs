use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("unknown environment id {0:?}")]
    UnknownEnv(String),
    #[error("at least one environment is required")]
    NoEnvironments,
    #[error("expected actions of shape [{expected_envs}, {expected_dim}], got {got:?}")]
    ActionShape {
        expected_envs: usize,
        expected_dim: usize,
        got: Vec<usize>,
    },
    #[error("environment is closed")]
    Closed,
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("record io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
