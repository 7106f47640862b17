//! A primary store composed with its alternates into one lookup surface.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::debug;
use wts_types::ObjectId;

use crate::alternates::{
    AlternateChain, AlternatesConfig, FsStoreResolver, StoreHandle, StoreResolver,
};
use crate::error::{AlternateError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Object store that reads from a primary store, then from every store in
/// its alternate chain.
///
/// The chain is resolved on first use and cached for the lifetime of the
/// instance, failure included: a store whose alternates cannot be resolved
/// fails every lookup with the same error. Concurrent first users block on a
/// single resolution. Writes go to the primary store only.
pub struct LayeredObjectStore {
    primary: StoreHandle,
    resolver: Arc<dyn StoreResolver>,
    config: AlternatesConfig,
    chain: OnceLock<Result<AlternateChain, AlternateError>>,
}

impl LayeredObjectStore {
    pub fn new(primary: StoreHandle, resolver: Arc<dyn StoreResolver>) -> Self {
        Self::with_config(primary, resolver, AlternatesConfig::default())
    }

    pub fn with_config(
        primary: StoreHandle,
        resolver: Arc<dyn StoreResolver>,
        config: AlternatesConfig,
    ) -> Self {
        Self {
            primary,
            resolver,
            config,
            chain: OnceLock::new(),
        }
    }

    /// Open the loose-object directory at `objects_dir` with its on-disk
    /// alternates.
    pub fn open(objects_dir: &Path, config: AlternatesConfig) -> StoreResult<Self> {
        let resolver = FsStoreResolver;
        let primary = resolver.open_primary(objects_dir)?;
        Ok(Self::with_config(primary, Arc::new(resolver), config))
    }

    pub fn primary(&self) -> &StoreHandle {
        &self.primary
    }

    /// The resolved alternate chain, resolving it if this is the first call.
    pub fn alternates(&self) -> StoreResult<&AlternateChain> {
        let resolved = self.chain.get_or_init(|| {
            let result =
                AlternateChain::resolve(&self.primary, self.resolver.as_ref(), &self.config);
            match &result {
                Ok(chain) => debug!(
                    primary = %self.primary.location().display(),
                    alternates = chain.len(),
                    "resolved alternate chain"
                ),
                Err(e) => debug!(
                    primary = %self.primary.location().display(),
                    error = %e,
                    "alternate chain resolution failed"
                ),
            }
            result
        });
        resolved.as_ref().map_err(|e| e.clone().into())
    }

    /// Whether the chain has been resolved (successfully or not).
    pub fn is_resolved(&self) -> bool {
        self.chain.get().is_some()
    }

    /// The primary followed by the alternates, in lookup order.
    fn members(&self) -> StoreResult<impl Iterator<Item = &StoreHandle>> {
        let chain = self.alternates()?;
        Ok(std::iter::once(&self.primary).chain(chain.iter()))
    }
}

impl ObjectStore for LayeredObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        for member in self.members()? {
            if let Some(object) = member.store().read(id)? {
                return Ok(Some(object));
            }
        }
        Ok(None)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        self.primary.store().write(object)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        for member in self.members()? {
            if member.store().exists(id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl std::fmt::Debug for LayeredObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredObjectStore")
            .field("primary", &self.primary)
            .field("chain", &self.chain.get())
            .finish()
    }
}
