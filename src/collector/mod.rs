//! Vote Collection
//!
//! Boundary between the orchestrator and whatever produces votes:
//! - `VoteCollector` trait, implemented by callers
//! - `VoteResponse`, the untrusted reply and its validation into a `Vote`
//! - `BlockingCollector`, an adapter for synchronous collectors

#[allow(clippy::module_inception)]
pub mod collector;
pub mod response;

pub use collector::{BlockingCollector, VoteCollector};
pub use response::VoteResponse;
