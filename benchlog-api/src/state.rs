//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use benchlog_storage::LabStore;

use crate::auth::AuthConfig;
use crate::services::upload_service::UploadSettings;

/// The storage backend chosen at startup.
pub type SharedStore = Arc<dyn LabStore>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub auth_config: Arc<AuthConfig>,
    /// Where uploaded files go and how large they may be.
    pub uploads: Arc<UploadSettings>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: SharedStore, auth_config: AuthConfig, uploads: UploadSettings) -> Self {
        Self {
            store,
            auth_config: Arc::new(auth_config),
            uploads: Arc::new(uploads),
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(SharedStore, store);
crate::impl_from_ref!(Arc<AuthConfig>, auth_config);
crate::impl_from_ref!(Arc<UploadSettings>, uploads);
crate::impl_from_ref!(Instant, start_time);
