use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaystoneError {
    #[error("invalid progress key '{0}': expected '<project-id>:<milestone>'")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DaystoneError>;
