use cosmwasm_schema::cw_serde;
use cosmwasm_std::{HexBinary, Uint128};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of a rollup withdraw-operation hash
pub const WITHDRAW_HASH_LEN: usize = 32;

const SIGNING_DOMAIN: &[u8] = b"swift-exit/request/v1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("withdraw hash must be {WITHDRAW_HASH_LEN} bytes, got {len}")]
pub struct InvalidWithdrawHash {
    pub len: usize,
}

/// Reject anything that is not a full withdraw-operation hash
pub fn validate_withdraw_hash(hash: &[u8]) -> Result<(), InvalidWithdrawHash> {
    if hash.len() != WITHDRAW_HASH_LEN {
        return Err(InvalidWithdrawHash { len: hash.len() });
    }
    Ok(())
}

/// A swift-exit request as attested by the validator set.
///
/// The relayer collects one signature per validator over
/// [`SwiftExitRequest::signing_bytes`] and submits them together with the
/// request to the pool contract.
#[cw_serde]
pub struct SwiftExitRequest {
    /// Rollup block containing the withdraw operation
    pub block_number: u64,
    /// Offset of the withdraw operation inside the block's op list
    pub withdraw_op_offset: u64,
    /// Hash of the withdraw operation, the order's unique key
    pub withdraw_hash: HexBinary,
    /// Rollup token id being withdrawn
    pub token_id: u32,
    /// Amount of the token the user withdraws
    pub token_amount: Uint128,
    /// Address that receives the fronted funds
    pub recipient: String,
}

impl SwiftExitRequest {
    /// Canonical bytes covered by validator signatures.
    ///
    /// `pool` is the address of the pool contract, binding the attestation
    /// to a single deployment. Variable-length fields are length-prefixed.
    pub fn signing_bytes(&self, pool: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            SIGNING_DOMAIN.len() + 8 + pool.len() + 8 + 8 + 4 + WITHDRAW_HASH_LEN + 4 + 16 + 4
                + self.recipient.len(),
        );
        bytes.extend_from_slice(SIGNING_DOMAIN);
        push_prefixed(&mut bytes, pool.as_bytes());
        bytes.extend_from_slice(&self.block_number.to_be_bytes());
        bytes.extend_from_slice(&self.withdraw_op_offset.to_be_bytes());
        push_prefixed(&mut bytes, self.withdraw_hash.as_slice());
        bytes.extend_from_slice(&self.token_id.to_be_bytes());
        bytes.extend_from_slice(&self.token_amount.u128().to_be_bytes());
        push_prefixed(&mut bytes, self.recipient.as_bytes());
        bytes
    }

    /// SHA-256 of the signing bytes, the prehash checked on-chain
    pub fn signing_digest(&self, pool: &str) -> Vec<u8> {
        Sha256::digest(self.signing_bytes(pool)).to_vec()
    }
}

fn push_prefixed(bytes: &mut Vec<u8>, field: &[u8]) {
    bytes.extend_from_slice(&(field.len() as u32).to_be_bytes());
    bytes.extend_from_slice(field);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SwiftExitRequest {
        SwiftExitRequest {
            block_number: 101,
            withdraw_op_offset: 7,
            withdraw_hash: HexBinary::from(vec![0xab; WITHDRAW_HASH_LEN]),
            token_id: 2,
            token_amount: Uint128::new(300),
            recipient: "cosmos1recipient".to_string(),
        }
    }

    #[test]
    fn test_signing_bytes_are_deterministic() {
        let req = request();
        assert_eq!(req.signing_bytes("pool"), req.signing_bytes("pool"));
        assert_eq!(req.signing_digest("pool").len(), 32);
    }

    #[test]
    fn test_signing_bytes_bind_pool_address() {
        let req = request();
        assert_ne!(req.signing_digest("pool-a"), req.signing_digest("pool-b"));
    }

    #[test]
    fn test_every_field_changes_digest() {
        let base = request().signing_digest("pool");

        let mut req = request();
        req.block_number = 102;
        assert_ne!(req.signing_digest("pool"), base);

        let mut req = request();
        req.withdraw_op_offset = 8;
        assert_ne!(req.signing_digest("pool"), base);

        let mut req = request();
        req.token_id = 3;
        assert_ne!(req.signing_digest("pool"), base);

        let mut req = request();
        req.token_amount = Uint128::new(301);
        assert_ne!(req.signing_digest("pool"), base);

        let mut req = request();
        req.recipient = "cosmos1other".to_string();
        assert_ne!(req.signing_digest("pool"), base);
    }

    #[test]
    fn test_hash_length_check() {
        assert!(validate_withdraw_hash(request().withdraw_hash.as_slice()).is_ok());
        assert_eq!(
            validate_withdraw_hash(&[1u8; 20]),
            Err(InvalidWithdrawHash { len: 20 })
        );
        assert!(validate_withdraw_hash(&[]).is_err());
    }
}
