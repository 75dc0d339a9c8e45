//! # CRM Link Protocol
//!
//! Wire types for the remote CRM REST API.
//!
//! This crate provides:
//! - `EntityKind` routing (endpoint paths, page keys, envelope keys)
//! - Typed payloads for contacts, opportunities, tasks and notes
//! - Directory types for users and pipelines (mapping refresh)
//! - Error-body parsing, including the duplicate-record metadata
//! - Lenient remote timestamp parsing
//!
//! This is a pure protocol crate with no I/O operations. The remote
//! API is tolerant in ways this crate mirrors: list pages may arrive
//! under a kind-specific key or under `items`, and single objects may
//! arrive bare or wrapped under a kind key.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod contact;
mod directory;
mod envelope;
mod error_body;
mod kind;
mod note;
mod opportunity;
mod task;
mod timestamp;

pub use contact::RemoteContact;
pub use directory::{pipeline_items, user_items, RemotePipeline, RemoteStage, RemoteUser};
pub use envelope::{from_value, page_items, remote_id, remote_updated_at, to_value, unwrap_envelope};
pub use error_body::{ApiErrorBody, ErrorMeta};
pub use kind::EntityKind;
pub use note::RemoteNote;
pub use opportunity::RemoteOpportunity;
pub use task::RemoteTask;
pub use timestamp::parse_remote_timestamp;

use thiserror::Error;

/// Errors produced while converting wire payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload did not match the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(String),
}
