use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}
