//! Chain reconstruction and per-certificate checks.

mod chain;
mod pairwise;
mod signature;
mod validity;

pub use chain::{build_chain, Chain, MAX_CHAIN_DEPTH};
pub use pairwise::{PairOutcome, PairwiseValidator};
pub use signature::{verify_self_signed, verify_signed_by, SignatureError};
pub use validity::{classify, ValidityWindow};
