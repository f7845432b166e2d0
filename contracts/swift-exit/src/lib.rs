#[cfg(not(feature = "library"))]
pub mod contract;
pub mod collaborators;
pub mod error;
pub mod exits;
pub mod helpers;
pub mod msg;
pub mod pool;
pub mod queries;
pub mod registry;
pub mod settlement;
pub mod state;

pub use crate::error::ContractError;
