//! `tetherfs-core`: the algorithmic heart of the lazy-materialization
//! engine (§4) plus the aggregated context that wires it together (§9).
//!
//! A small aggregating crate built out of lower-level
//! `tetherfs-dtyp`/`tetherfs-fscc`/`tetherfs-wire`/`tetherfs-transport`
//! crates. Rather than a request/response stack driving protocol exchanges
//! against a remote peer, this crate owns the interception pipeline, the
//! per-file fetch lock table, the chunked pipelined copier, the policy
//! store, and the demand-helper bridge — the pieces a front-end (a
//! minifilter or `dokan`/`winfsp` driver shim, out of scope for this
//! crate) drives against the four hook points in [`pipeline`].

pub mod config;
pub mod context;
pub mod copier;
pub mod error;
pub mod helper_bridge;
pub mod lock_table;
pub mod pipeline;
pub mod platform;
pub mod policy;
pub mod stream_marker;

pub use context::CoreContext;
pub use error::{Error, Result};
pub use helper_bridge::HelperBridge;
pub use lock_table::{FetchLockHandle, FetchLockTable};
pub use pipeline::SampledReporter;
pub use platform::{InMemoryPlatform, Platform, StubRecord};
#[cfg(windows)]
pub use platform::WindowsPlatform;
pub use policy::{OperationMode, PolicyStore};
pub use stream_marker::{StreamMarker, StreamMarkerTable};
