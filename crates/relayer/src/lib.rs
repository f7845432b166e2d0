pub mod collector;
pub mod config;
pub mod error;
pub mod signer;

pub use collector::{AttestationCollector, Attestations, PoolExecuteMsg};
pub use config::CollectorConfig;
pub use error::RelayerError;
pub use signer::{LocalSigner, ValidatorSigner};
