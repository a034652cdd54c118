use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("No entity named '{name}'")]
    NoSuchEntity { name: String },

    #[error("Buffer length mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Entity schema field '{field}' cannot be classified")]
    MalformedSchema { field: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
