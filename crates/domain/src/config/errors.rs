#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(String, String),

    #[error("Failed to write config file {0}: {1}")]
    FileWrite(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
