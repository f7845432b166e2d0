use cosmwasm_std::Binary;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use thiserror::Error;

use crate::SwiftExitRequest;

/// Length of a raw secp256k1 secret key
const SECRET_KEY_LEN: usize = 32;

/// Errors raised while signing or checking attestations
#[derive(Debug, Error, PartialEq)]
pub enum VerificationError {
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("missing signature")]
    MissingSignature,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("signature verification failed")]
    VerificationFailed,
}

/// Check that `public_key` is a SEC1-encoded secp256k1 point
///
/// Both compressed (33 bytes) and uncompressed (65 bytes) encodings are
/// accepted, matching what the chain's `secp256k1_verify` accepts.
pub fn validate_public_key(public_key: &[u8]) -> Result<(), VerificationError> {
    verifying_key(public_key).map(|_| ())
}

/// Sign `message` (SHA-256 prehashed) with a raw secret key.
/// Relayers and tests sign; the contract only verifies.
pub fn sign_message(message: &[u8], private_key_bytes: &[u8]) -> Result<Binary, VerificationError> {
    let signature: Signature = signing_key(private_key_bytes)?.sign(message);
    Ok(Binary::from(signature.to_bytes().to_vec()))
}

/// Sign a swift-exit request for the pool deployed at `pool`
pub fn sign_request(
    request: &SwiftExitRequest,
    pool: &str,
    private_key_bytes: &[u8],
) -> Result<Binary, VerificationError> {
    sign_message(&request.signing_bytes(pool), private_key_bytes)
}

/// Check a compact 64-byte signature over `message`
pub fn verify_signature(
    message: &[u8],
    signature: &Binary,
    public_key: &Binary,
) -> Result<bool, VerificationError> {
    if signature.is_empty() {
        return Err(VerificationError::MissingSignature);
    }
    let key = verifying_key(public_key)?;
    let signature = Signature::from_slice(signature)
        .map_err(|e| VerificationError::InvalidSignature(e.to_string()))?;

    key.verify(message, &signature)
        .map(|_| true)
        .map_err(|_| VerificationError::VerificationFailed)
}

/// Compressed SEC1 public key of a raw secret key
pub fn derive_public_key(private_key_bytes: &[u8]) -> Result<Binary, VerificationError> {
    let key = signing_key(private_key_bytes)?;
    Ok(Binary::from(key.verifying_key().to_sec1_bytes().to_vec()))
}

fn signing_key(private_key_bytes: &[u8]) -> Result<SigningKey, VerificationError> {
    if private_key_bytes.len() != SECRET_KEY_LEN {
        return Err(VerificationError::EncodingError(format!(
            "private key must be {} bytes, got {}",
            SECRET_KEY_LEN,
            private_key_bytes.len()
        )));
    }
    SigningKey::from_slice(private_key_bytes)
        .map_err(|e| VerificationError::EncodingError(e.to_string()))
}

fn verifying_key(public_key: &[u8]) -> Result<VerifyingKey, VerificationError> {
    if public_key.is_empty() {
        return Err(VerificationError::InvalidPublicKey(
            "public key is empty".to_string(),
        ));
    }
    VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| VerificationError::InvalidPublicKey(e.to_string()))
}
