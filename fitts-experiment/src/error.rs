use fitts_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    #[error("no {0} configured; the trial design needs at least one")]
    EmptyCombinationSet(&'static str),

    #[error("invalid experiment configuration: {0}")]
    InvalidConfig(String),

    #[error("persistence failed: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
