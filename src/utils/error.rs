use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("serial '{serial}' has {length} significant characters but the canonical width is {width}")]
    SerialOverflow {
        serial: String,
        length: usize,
        width: usize,
    },

    #[error("serial value is empty")]
    EmptySerial,

    #[error("could not parse '{value}' as a date")]
    InvalidDate { value: String },

    #[error("storage error: {message}")]
    StorageError { message: String },

    #[error("SMS gateway request failed: {0}")]
    SmsError(#[from] reqwest::Error),

    #[error("SMS gateway rejected the message with status {status}")]
    SmsRejected { status: u16 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },
}

impl RegistryError {
    pub fn storage(message: impl Into<String>) -> Self {
        RegistryError::StorageError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
