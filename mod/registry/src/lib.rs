pub mod api;
pub mod classify;
pub mod config;
pub mod model;
pub mod service;
pub mod slug;

use std::sync::Arc;

use axum::Router;
use certreg_core::Module;

use service::RegistryService;

/// Registry module — students, courses, and certification tracking.
pub struct RegistryModule {
    service: Arc<RegistryService>,
}

impl RegistryModule {
    pub fn new(service: RegistryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl Module for RegistryModule {
    fn name(&self) -> &str {
        "registry"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
