//! Bi-directional synchronization engine between a host CRM store and
//! a remote rate-limited REST CRM.
//!
//! The engine is transport- and storage-agnostic: the host supplies
//! record persistence ([`LocalStore`]), configuration
//! ([`ConfigSource`]), and durable tables for correlations,
//! checkpoints, reference mappings and the retry queue. In-memory
//! implementations of every seam ship with the crate for tests and
//! embedding; a reqwest-backed HTTP transport is available behind the
//! `reqwest-client` feature.
//!
//! ```
//! use std::sync::Arc;
//! use crmlink_engine::{
//!     MemoryCheckpointStore, MemoryConfigSource, MemoryCorrelationStore, MemoryLocalStore,
//!     MemoryMappingStore, MemoryRetryQueue, MockHttpClient, RemoteClient, SyncConfiguration,
//!     SyncEngine,
//! };
//!
//! let engine = SyncEngine::new(
//!     Arc::new(MemoryConfigSource::new(SyncConfiguration::new("token", "location"))),
//!     RemoteClient::new(MockHttpClient::new()),
//!     Arc::new(MemoryLocalStore::new()),
//!     Arc::new(MemoryCorrelationStore::new()),
//!     Arc::new(MemoryCheckpointStore::new()),
//!     Arc::new(MemoryMappingStore::new()),
//!     Arc::new(MemoryRetryQueue::new()),
//! );
//! let report = engine.poll_all();
//! assert_eq!(report.len(), 2); // contacts and opportunities by default
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod checkpoint;
pub mod config;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod local;
pub mod mapping;
pub mod remote;
pub mod retry;

pub use adapter::{adapter_for, EntityAdapter, MappingContext};
pub use checkpoint::{CheckpointStore, MemoryCheckpointStore};
pub use config::{
    ConfigSource, MemoryConfigSource, SyncConfiguration, SyncDirection, TriggerMode,
};
pub use correlation::{CorrelationRecord, CorrelationStore, MemoryCorrelationStore};
pub use engine::{synced_fields, PollReport, PullOutcome, PushOutcome, SweepOutcome, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use local::{FieldValues, LocalId, LocalRecord, LocalStore, MemoryLocalStore, PullScope};
pub use mapping::{MappingStore, MemoryMappingStore, StageMapping, UserMapping};
pub use remote::{
    HttpClient, HttpMethod, HttpRequest, HttpResponse, MockHttpClient, RemoteClient,
    API_VERSION, DEFAULT_BASE_URL,
};
#[cfg(feature = "reqwest-client")]
pub use remote::reqwest_client::ReqwestClient;
pub use retry::{MemoryRetryQueue, RetryAction, RetryItem, RetryQueue, RetryState};

pub use crmlink_protocol::EntityKind;
