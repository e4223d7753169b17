use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scenario JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid parking configuration for facility {facility}: {reason}")]
    InvalidParkingConfig { facility: String, reason: String },

    #[error("Agent {agent} references unknown facility {facility}")]
    UnknownFacility { agent: String, facility: String },

    #[error("Failed to build simulation world: {0}")]
    WorldConstructionError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
