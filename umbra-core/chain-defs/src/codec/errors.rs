use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to serialize: {0}")]
    Serialize(#[source] bincode::Error),
    #[error("Failed to deserialize: {0}")]
    Deserialize(#[source] bincode::Error),
}
