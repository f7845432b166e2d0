use cosmwasm_std::{
    CheckedFromRatioError, CheckedMultiplyFractionError, CheckedMultiplyRatioError, OverflowError,
    StdError,
};
use swift_exit_types::InterestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    MultiplyRatio(#[from] CheckedMultiplyRatioError),

    #[error("{0}")]
    MultiplyFraction(#[from] CheckedMultiplyFractionError),

    #[error("{0}")]
    FromRatio(#[from] CheckedFromRatioError),

    #[error("Interest model: {0}")]
    Interest(#[from] InterestError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Validator not found: {id}")]
    ValidatorNotFound { id: String },

    #[error("Validator already exists: {id}")]
    ValidatorAlreadyExists { id: String },

    #[error("Unknown validator: {id}")]
    UnknownValidator { id: String },

    #[error("Invalid public key: {reason}")]
    InvalidPublicKey { reason: String },

    #[error("Bad signature from validator {validator}")]
    BadSignature { validator: String },

    #[error("Duplicate signer: {validator}")]
    DuplicateSigner { validator: String },

    #[error("Insufficient signers: required {required}, provided {provided}")]
    InsufficientSigners { required: u32, provided: u32 },

    #[error("Length mismatch: {left} has {left_len} entries, {right} has {right_len}")]
    LengthMismatch {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },

    #[error("Invalid withdraw hash: expected 32 bytes, got {len}")]
    InvalidWithdrawHash { len: usize },

    #[error("Exit order already exists: {hash}")]
    DuplicateOrder { hash: String },

    #[error("Exit order not found: {hash}")]
    ExitOrderNotFound { hash: String },

    #[error("Exit order is not deferred: {hash}")]
    NotDeferred { hash: String },

    #[error("Block {block_number} is already verified")]
    AlreadyVerified { block_number: u64 },

    #[error("Block mismatch: order is in block {expected}, got {got}")]
    BlockMismatch { expected: u64, got: u64 },

    #[error("Block {block_number} is not after last verified block {last_verified}")]
    BlockAlreadyVerified { block_number: u64, last_verified: u64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: String, available: String },

    #[error("Insufficient funds: required {required}, provided {provided}")]
    InsufficientFunds { required: String, provided: String },

    #[error("Invalid funds: expected {expected}, got {got}")]
    InvalidFunds { expected: String, got: String },

    #[error("Amount must be greater than zero")]
    ZeroAmount {},

    #[error("Pool solvency violated: borrowed {borrowed} exceeds supply {supply}")]
    SolvencyViolation { borrowed: String, supply: String },
}
