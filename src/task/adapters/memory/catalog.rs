//! In-memory service catalog and company directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{CompanyId, ServiceId},
    ports::{CatalogError, CompanyDirectory, ServiceCatalog, ServiceSummary},
};

/// Thread-safe in-memory service catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServiceCatalog {
    services: Arc<RwLock<HashMap<ServiceId, ServiceSummary>>>,
}

impl InMemoryServiceCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service and returns its summary.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog lock is poisoned.
    pub fn add(
        &self,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<ServiceSummary, CatalogError> {
        let summary = ServiceSummary {
            id: ServiceId::new(),
            name: name.into(),
            category: category.into(),
        };
        let mut services = self
            .services
            .write()
            .map_err(|err| CatalogError::upstream(std::io::Error::other(err.to_string())))?;
        services.insert(summary.id, summary.clone());
        Ok(summary)
    }
}

#[async_trait]
impl ServiceCatalog for InMemoryServiceCatalog {
    async fn get(&self, id: ServiceId) -> Result<Option<ServiceSummary>, CatalogError> {
        let services = self
            .services
            .read()
            .map_err(|err| CatalogError::upstream(std::io::Error::other(err.to_string())))?;
        Ok(services.get(&id).cloned())
    }
}

/// Company directory that routes every request to the first registered
/// company.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCompanyDirectory {
    companies: Arc<RwLock<Vec<CompanyId>>>,
}

impl InMemoryCompanyDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a company.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the directory lock is poisoned.
    pub fn register(&self, company: CompanyId) -> Result<(), CatalogError> {
        self.companies
            .write()
            .map_err(|err| CatalogError::upstream(std::io::Error::other(err.to_string())))?
            .push(company);
        Ok(())
    }
}

#[async_trait]
impl CompanyDirectory for InMemoryCompanyDirectory {
    async fn pick_company(
        &self,
        _service: &ServiceSummary,
    ) -> Result<Option<CompanyId>, CatalogError> {
        let companies = self
            .companies
            .read()
            .map_err(|err| CatalogError::upstream(std::io::Error::other(err.to_string())))?;
        Ok(companies.first().copied())
    }
}
