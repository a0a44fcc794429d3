//! Identity and ownership tokens for the polls service.
//!
//! Three credential paths share one signed-token codec:
//! - guests own their comments through a purpose-scoped ownership token,
//! - votes are deduplicated per browser (cookie) or per account (durable),
//! - accounts come from federated OAuth login and authenticate with
//!   locally minted access/refresh tokens.

pub mod api;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;
pub mod token;

use std::sync::Arc;

use axum::Router;

use polls_core::Module;

use crate::service::IdentityService;

pub struct IdentityModule {
    service: Arc<IdentityService>,
}

impl IdentityModule {
    pub fn new(service: Arc<IdentityService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<IdentityService> {
        &self.service
    }
}

impl Module for IdentityModule {
    fn name(&self) -> &str {
        "identity"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
