use std::sync::Arc;
use std::time::Duration;

use cosmwasm_std::{Binary, HexBinary, Uint128};
use serde::{Deserialize, Serialize};
use swift_exit_types::{verify_signature, SwiftExitRequest};

use crate::{CollectorConfig, RelayerError, ValidatorSigner};

/// Verified signatures, in the same order as their validators
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attestations {
    pub signatures: Vec<Binary>,
    pub validators: Vec<String>,
}

impl Attestations {
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// Execute message of the pool contract submitted by the relayer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolExecuteMsg {
    AddSwiftExit {
        block_number: u64,
        withdraw_op_offset: u64,
        withdraw_hash: HexBinary,
        token_id: u32,
        token_amount: Uint128,
        recipient: String,
        signatures: Vec<Binary>,
        validators: Vec<String>,
    },
}

impl PoolExecuteMsg {
    pub fn add_swift_exit(request: &SwiftExitRequest, attestations: Attestations) -> Self {
        PoolExecuteMsg::AddSwiftExit {
            block_number: request.block_number,
            withdraw_op_offset: request.withdraw_op_offset,
            withdraw_hash: request.withdraw_hash.clone(),
            token_id: request.token_id,
            token_amount: request.token_amount,
            recipient: request.recipient.clone(),
            signatures: attestations.signatures,
            validators: attestations.validators,
        }
    }
}

/// Gathers validator signatures for swift-exit requests.
///
/// Every signer is asked concurrently. Signatures that fail, time out or do
/// not verify under the signer's registered key are dropped; the request is
/// relayed only if at least `min_signers` remain.
pub struct AttestationCollector {
    config: CollectorConfig,
    signers: Vec<Arc<dyn ValidatorSigner>>,
}

impl AttestationCollector {
    pub fn new(
        config: CollectorConfig,
        signers: Vec<Arc<dyn ValidatorSigner>>,
    ) -> Result<Self, RelayerError> {
        config.validate()?;
        Ok(Self { config, signers })
    }

    pub fn signer_count(&self) -> usize {
        self.signers.len()
    }

    /// Collect attestations for `request` from all signers
    pub async fn collect(&self, request: &SwiftExitRequest) -> Result<Attestations, RelayerError> {
        let pool = self.config.pool_address.as_str();
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let attest_futures: Vec<_> = self
            .signers
            .iter()
            .map(|signer| async move {
                let result = match tokio::time::timeout(timeout, signer.attest(request, pool)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(RelayerError::Timeout(signer.validator().to_string())),
                };
                (signer, result)
            })
            .collect();

        let results = futures::future::join_all(attest_futures).await;

        let message = request.signing_bytes(pool);
        let mut attestations = Attestations::default();

        for (signer, result) in results {
            let checked = result.and_then(|signature| {
                verify_signature(&message, &signature, signer.public_key())?;
                Ok(signature)
            });

            match checked {
                Ok(signature) => {
                    attestations.signatures.push(signature);
                    attestations.validators.push(signer.validator().to_string());
                }
                Err(e) => {
                    tracing::warn!(
                        validator = %signer.validator(),
                        withdraw_hash = %request.withdraw_hash.to_hex(),
                        error = %e,
                        "Dropping attestation"
                    );
                }
            }
        }

        if attestations.len() < self.config.min_signers {
            return Err(RelayerError::InsufficientAttestations {
                required: self.config.min_signers,
                collected: attestations.len(),
            });
        }

        tracing::info!(
            withdraw_hash = %request.withdraw_hash.to_hex(),
            block_number = request.block_number,
            collected = attestations.len(),
            "Collected swift exit attestations"
        );

        Ok(attestations)
    }

    /// Collect attestations and encode the pool's `add_swift_exit` message
    pub async fn relay(&self, request: &SwiftExitRequest) -> Result<String, RelayerError> {
        let attestations = self.collect(request).await?;
        let msg = PoolExecuteMsg::add_swift_exit(request, attestations);
        Ok(serde_json::to_string(&msg)?)
    }
}
