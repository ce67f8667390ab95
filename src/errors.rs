use thiserror::Error;

pub const INVALID_CONSTRUCT_CONFIGURATION: &str = "LIFT_INVALID_CONSTRUCT_CONFIGURATION";
pub const UNKNOWN_CONSTRUCT_TYPE: &str = "LIFT_UNKNOWN_CONSTRUCT_TYPE";

/// The only way construction reports a problem with user configuration.
/// `code` is stable, `message` names the offending configuration path
/// and how to fix it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConfigurationError {
    pub code: &'static str,
    pub message: String,
}

impl ConfigurationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self { code: INVALID_CONSTRUCT_CONFIGURATION, message: message.into() }
    }

    pub fn unknown_type(message: impl Into<String>) -> Self {
        Self { code: UNKNOWN_CONSTRUCT_TYPE, message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum LiftError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid provider configuration: {0}")]
    Provider(String),

    #[error("Failed to synthesize stack {stack_name}\n{reason}")]
    Synthesis { stack_name: String, reason: String },

    #[error("Failed to read output '{output_key}' of stack {stack_name}\n{reason}")]
    Output { stack_name: String, output_key: String, reason: String },

    #[error("Failed to parse service file: {0}")]
    Parse(String),
}

impl From<serde_yaml::Error> for LiftError {
    fn from(e: serde_yaml::Error) -> Self {
        LiftError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for LiftError {
    fn from(e: serde_json::Error) -> Self {
        LiftError::Parse(e.to_string())
    }
}
