//! Active catalog snapshot.
//!
//! The store holds the catalog behind an `Arc` that is replaced as a whole.
//! Readers clone the `Arc` under a momentary read lock and then evaluate
//! without holding any lock. A reload builds and validates the new catalog
//! before taking the write lock, so a failed reload never touches the
//! active snapshot.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::{Catalog, CatalogError, CatalogSource};
use crate::engine::Engine;

static GLOBAL: OnceLock<CatalogStore> = OnceLock::new();

/// Holder of the active catalog snapshot.
pub struct CatalogStore {
    active: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            active: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Process-wide store, initialized with the built-in catalog.
    ///
    /// If the built-in catalog fails to compile, the store starts empty and
    /// every evaluation resolves to the undefined tier until a valid catalog
    /// is installed.
    pub fn global() -> &'static CatalogStore {
        GLOBAL.get_or_init(|| match Catalog::builtin() {
            Ok(catalog) => {
                log_installed(&catalog);
                CatalogStore::new(catalog)
            }
            Err(error) => {
                tracing::error!(error = %error, "Built-in catalog failed to load, starting empty");
                CatalogStore::new(Catalog::empty())
            }
        })
    }

    /// The current snapshot. It stays valid and unchanged for as long as the
    /// caller holds it, whatever reloads happen meanwhile.
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.active.read())
    }

    /// An engine bound to the current snapshot.
    pub fn engine(&self) -> Engine {
        Engine::new(self.snapshot())
    }

    /// Replace the active catalog, returning the new snapshot.
    pub fn install(&self, catalog: Catalog) -> Arc<Catalog> {
        let catalog = Arc::new(catalog);
        *self.active.write() = Arc::clone(&catalog);
        log_installed(&catalog);
        catalog
    }

    /// Load, validate and install a catalog. On error the active catalog
    /// stays in force.
    pub fn reload(&self, source: &CatalogSource) -> Result<Arc<Catalog>, CatalogError> {
        match Catalog::load(source) {
            Ok(catalog) => Ok(self.install(catalog)),
            Err(error) => {
                let active = self.snapshot();
                tracing::warn!(
                    error = %error,
                    active_catalog = active.name(),
                    active_version = active.version(),
                    "Catalog reload rejected, keeping active catalog"
                );
                Err(error)
            }
        }
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(Catalog::empty())
    }
}

fn log_installed(catalog: &Catalog) {
    tracing::info!(
        catalog = catalog.name(),
        version = catalog.version(),
        rules = catalog.rules().len(),
        risk_factors = catalog.risk_factors().len(),
        "Catalog installed"
    );
}
