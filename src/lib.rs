//! Client data layer for the Drone Services Management System.
//!
//! The crate is organized around three pieces:
//!
//! - [`transport`]: HTTP adapter over the two REST backends, with bearer
//!   auth, JSON/multipart content negotiation, and centralized error
//!   logging.
//! - [`endpoint`] + [`tags`]: declarative endpoint registry; every endpoint
//!   states the cache tags it provides or invalidates.
//! - [`cache`]: in-memory query cache keyed by request fingerprint, with
//!   tag-based invalidation, request de-duplication, and live
//!   subscriptions that re-fetch when a mutation touches their tags.
//!
//! [`api`] composes the three into typed per-domain operations; the `dsms`
//! binary is a thin CLI over it.

pub mod api;
pub mod cache;
pub mod config;
pub mod endpoint;
pub mod notify;
pub mod session;
pub mod tags;
pub mod transport;

pub use api::{DsmsApi, Envelope};
pub use cache::{QueryCache, QueryState, Snapshot, Subscription};
pub use config::{Config, Environment};
pub use notify::{ConsoleNotifier, LogNotifier, Notifier};
pub use session::{Session, SessionStore};
pub use tags::{Tag, TagSpec, TagType};
pub use transport::{ApiError, Transport};
