//! # beacon-store
//!
//! The document-store boundary of the Beacon application.
//!
//! The backend is a hosted, keyed-document database reachable by
//! collection/document path. This crate defines the [`DocumentStore`]
//! trait the services are written against (point reads, merge writes,
//! atomic multi-document batches, live query subscriptions), the typed
//! paths of the persisted layout, the decode step from raw documents to
//! the `beacon-shared` entities, and [`MemoryStore`], an in-process
//! implementation used by tests and embedders.

pub mod client;
pub mod decode;
pub mod document;
pub mod memory;
pub mod paths;

mod error;

pub use client::{DocumentStore, Query, QuerySnapshot, SnapshotHandler, Subscription};
pub use document::{Document, FieldValue, Fields, WriteBatch, WriteOp};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use paths::{CollectionPath, DocumentPath};
