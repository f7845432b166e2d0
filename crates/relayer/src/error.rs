use swift_exit_types::VerificationError;

#[derive(Debug, thiserror::Error)]
pub enum RelayerError {
    #[error("invalid config: {field}: {message}")]
    InvalidConfig { field: String, message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("signer {validator} failed: {reason}")]
    SignerFailed { validator: String, reason: String },

    #[error("signer {0} timed out")]
    Timeout(String),

    #[error("not enough attestations: required {required}, collected {collected}")]
    InsufficientAttestations { required: usize, collected: usize },

    #[error("verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RelayerError {
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
