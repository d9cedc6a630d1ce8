//! Service Layer
//!
//! Business logic that sits between the HTTP handlers and storage. Services
//! take the store as `&dyn LabStore` so they run unchanged over either
//! backend.

pub mod link_service;
pub mod record_service;
pub mod search_service;
pub mod upload_service;
pub mod user_service;

pub use link_service::*;
pub use record_service::*;
pub use search_service::*;
pub use upload_service::{list_attachments, store_upload, UploadSettings, UploadedFile};
pub use user_service::*;
