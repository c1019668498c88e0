//! In-memory query cache with tag-based invalidation.
//!
//! Queries register their result under the tags they declare; mutations
//! mark matching entries stale and subscribed queries re-fetch. The cache
//! lives for the process: no persistence, no cross-process sharing.

mod engine;
mod state;

pub use engine::{fetcher, FetchFuture, Fetcher, QueryCache, Subscription};
pub use state::{QueryState, Snapshot};
