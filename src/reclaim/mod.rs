//! Refund estimation, batching and transaction building

pub mod batch;
pub mod builder;
pub mod estimate;

pub use batch::{batch_count, make_batches, make_default_batches};
pub use builder::{FeeSchedule, Operation, Reclaimable, TransactionBuilder, UnsignedClaim};
pub use estimate::{estimate_refund, format_sol, format_usd, lamports_to_sol, quote, ClaimQuote};
