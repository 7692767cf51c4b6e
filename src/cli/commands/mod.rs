//! CLI command implementations

pub mod bake;
pub mod config;
pub mod fingerprint;
pub mod list;
pub mod resolve;
pub mod sweep;

pub use bake::execute as bake;
pub use config::execute as config;
pub use fingerprint::execute as fingerprint;
pub use list::execute as list;
pub use resolve::execute as resolve;
pub use sweep::execute as sweep;

use crate::bake::Baker;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::BakeResult;
use crate::overlay::{ArtifactResolver, SearchRoots};

/// Resolver over the configured search roots and aliases
pub(crate) fn resolver_from_config(config: &Config) -> ArtifactResolver {
    ArtifactResolver::new(SearchRoots {
        data_root: config.data_root(),
        bundled_assets: config.paths.bundled_assets.clone(),
    })
    .with_aliases(config.resolve.aliases.clone())
}

/// Cache store under the configured data root
pub(crate) async fn store_from_config(config: &Config) -> BakeResult<CacheStore> {
    CacheStore::open(&config.data_root()).await
}

/// Fully wired baker
pub(crate) async fn baker_from_config(config: &Config) -> BakeResult<Baker> {
    let store = store_from_config(config).await?;
    Ok(Baker::new(store, resolver_from_config(config)))
}
