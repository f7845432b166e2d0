use async_trait::async_trait;
use cosmwasm_std::Binary;
use swift_exit_types::{derive_public_key, sign_request, validate_withdraw_hash, SwiftExitRequest};

use crate::RelayerError;

/// A validator able to attest swift-exit requests
#[async_trait]
pub trait ValidatorSigner: Send + Sync {
    /// Address the validator is registered under in the pool
    fn validator(&self) -> &str;

    /// Key registered for the validator in the pool
    fn public_key(&self) -> &Binary;

    /// Sign `request` for the pool at `pool`
    async fn attest(&self, request: &SwiftExitRequest, pool: &str) -> Result<Binary, RelayerError>;
}

/// Signer holding the validator key in process
pub struct LocalSigner {
    validator: String,
    secret: Vec<u8>,
    public_key: Binary,
}

impl LocalSigner {
    pub fn new(validator: impl Into<String>, secret: &[u8]) -> Result<Self, RelayerError> {
        Ok(Self {
            validator: validator.into(),
            public_key: derive_public_key(secret)?,
            secret: secret.to_vec(),
        })
    }
}

#[async_trait]
impl ValidatorSigner for LocalSigner {
    fn validator(&self) -> &str {
        &self.validator
    }

    fn public_key(&self) -> &Binary {
        &self.public_key
    }

    async fn attest(&self, request: &SwiftExitRequest, pool: &str) -> Result<Binary, RelayerError> {
        validate_withdraw_hash(request.withdraw_hash.as_slice())
            .map_err(|e| RelayerError::InvalidRequest(e.to_string()))?;
        if request.token_amount.is_zero() {
            return Err(RelayerError::InvalidRequest(
                "token amount must be nonzero".to_string(),
            ));
        }

        Ok(sign_request(request, pool, &self.secret)?)
    }
}
