pub mod exit;
pub mod interest;
pub mod verification;

pub use exit::*;
pub use interest::*;
pub use verification::*;
