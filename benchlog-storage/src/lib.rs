//! Benchlog Storage - Storage Traits and In-Memory Implementation
//!
//! Defines the storage abstraction layer for Benchlog entities.
//! The PostgreSQL implementation lives in benchlog-api.

pub mod async_trait;
pub mod memory;

pub use async_trait::{
    AttachmentStore, EntityStore, LabStore, LinkStore, SearchStore, UserStore,
};
pub use memory::{InMemoryStore, MemoryTable, StoreState, Table};
