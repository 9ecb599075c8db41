//! Read-only collaborators: the service catalog and the company directory.

use crate::task::domain::{CompanyId, ServiceId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Catalog entry a task refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    /// Service identifier.
    pub id: ServiceId,
    /// Display name.
    pub name: String,
    /// Display name of the service category.
    pub category: String,
}

/// Failure of a catalog or directory dependency.
#[derive(Debug, Clone, Error)]
#[error("catalog dependency failed: {0}")]
pub struct CatalogError(pub Arc<dyn std::error::Error + Send + Sync>);

impl CatalogError {
    /// Wraps an upstream error.
    pub fn upstream(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Service catalog lookup.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// Returns the service summary, or `None` when the service is unknown.
    async fn get(&self, id: ServiceId) -> Result<Option<ServiceSummary>, CatalogError>;

    /// Returns whether the service exists.
    async fn exists(&self, id: ServiceId) -> Result<bool, CatalogError> {
        Ok(self.get(id).await?.is_some())
    }
}

/// Resolves which company fulfils a new request.
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    /// Picks a company for `service`, or `None` when no company is available.
    async fn pick_company(&self, service: &ServiceSummary)
    -> Result<Option<CompanyId>, CatalogError>;
}
