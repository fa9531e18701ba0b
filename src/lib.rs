//! Workspace umbrella crate for the bookstore lookup service.
//!
//! Wires a YAML [`LookupConfig`] into an [`InMemoryStore`] and a
//! [`Matcher`] so callers get a single entry point for approximate book and
//! customer lookups.

pub mod config;

pub use config::{ConfigLoadError, LookupConfig, MatcherYamlConfig, StoreYamlConfig};
pub use matcher::{
    AcceptMode, BookMatch, BookQuery, CustomerMatch, CustomerQuery, DefaultMatcher, LookupKind,
    LookupResponse, MatchError, MatchMetrics, MatchThreshold, MatchedField, Matcher,
    MatcherConfig, set_match_metrics,
};
pub use store::{
    Book, CatalogSeed, CatalogStore, Customer, CustomerOrder, InMemoryStore, PrefilterMode,
    StoreConfig, StoreError,
};

use std::sync::Arc;

use thiserror::Error;

/// Errors raised while assembling or running a [`Lookup`].
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Match(#[from] MatchError),
}

/// A seeded in-memory store plus the matcher serving it.
pub struct Lookup {
    matcher: DefaultMatcher,
}

impl Lookup {
    /// Build the store described by `config` (seeding it when a seed path is
    /// set) and a matcher over it.
    pub fn from_config(config: &LookupConfig) -> Result<Self, LookupError> {
        let store = config.store_config().build();
        if let Some(path) = &config.store.seed_path {
            tracing::info!(path = %path.display(), "loading catalogue seed");
            store.load_seed(path)?;
        }
        Self::with_store(Arc::new(store), config.matcher_config())
    }

    pub fn with_store(
        store: Arc<InMemoryStore>,
        config: MatcherConfig,
    ) -> Result<Self, LookupError> {
        let matcher = Matcher::with_config(store, config)?;
        Ok(Self { matcher })
    }

    pub fn store(&self) -> &Arc<InMemoryStore> {
        self.matcher.store()
    }

    pub fn matcher(&self) -> &DefaultMatcher {
        &self.matcher
    }

    pub async fn query_books(
        &self,
        query: &BookQuery,
    ) -> Result<LookupResponse<BookMatch>, LookupError> {
        Ok(self.matcher.query_books(query).await?)
    }

    pub async fn query_customers(
        &self,
        query: &CustomerQuery,
    ) -> Result<LookupResponse<CustomerMatch>, LookupError> {
        Ok(self.matcher.query_customers(query).await?)
    }
}

impl Default for Lookup {
    fn default() -> Self {
        Self {
            matcher: Matcher::new(Arc::new(InMemoryStore::new())),
        }
    }
}
