use std::sync::Arc;

use tracing::{info, warn};
use utoipa::OpenApi;

use crate::api::rest::{openapi::UsersApiDoc, routes};
use crate::config::UsersConfig;
use crate::contract::client::UsersApi;
use crate::domain::repo::UsersRepository;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::UsersLocalClient;
use crate::infra::storage::InMemoryUsersRepository;

/// Users module: wires the repository to the domain service and exposes it
/// over REST and as an in-process client.
#[derive(Clone)]
pub struct Users {
    service: Arc<Service>,
}

impl Users {
    /// Build the module on top of the process-local in-memory store.
    pub fn new(cfg: UsersConfig) -> Self {
        info!(
            min_password_length = cfg.min_password_length,
            "Initializing users module"
        );
        warn!("User passwords are validated but never stored; storage is in-memory only");
        Self::with_repository(Arc::new(InMemoryUsersRepository::new()), &cfg)
    }

    pub fn with_repository(repo: Arc<dyn UsersRepository>, cfg: &UsersConfig) -> Self {
        let service = Service::new(repo, ServiceConfig::from(cfg));
        Self {
            service: Arc::new(service),
        }
    }

    /// Local in-process client implementation
    pub fn client(&self) -> Arc<dyn UsersApi> {
        Arc::new(UsersLocalClient::new(self.service.clone()))
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering users REST routes");
        routes::register_routes(router, self.service.clone())
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        UsersApiDoc::openapi()
    }
}

impl Default for Users {
    fn default() -> Self {
        Self::new(UsersConfig::default())
    }
}
