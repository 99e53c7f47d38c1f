use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Artifact error: {0}")]
    ArtifactError(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(format!("JSON serialization error: {}", err))
    }
}
