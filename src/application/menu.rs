use std::{sync::Arc, time::Instant};

use metrics::{counter, histogram};
use serde::de::IgnoredAny;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::application::render::{RenderError, RenderSink};
use crate::application::repos::{MenuSource, SourceError};
use crate::cache::{CachePolicy, CacheStore, menu_cache_key};
use crate::domain::menu::{MenuId, MenuTree};
use crate::domain::tree::{MenuTreeError, organize};

pub(crate) const METRIC_CACHE_HIT: &str = "menutree_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "menutree_cache_miss_total";
pub(crate) const METRIC_BUILD: &str = "menutree_build_total";
pub(crate) const METRIC_BUILD_MS: &str = "menutree_build_ms";

#[derive(Debug, Error)]
pub enum MenuError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("menu entries could not be organized")]
    Tree(#[from] MenuTreeError),
    #[error("failed to serialize menu tree")]
    Serialize(#[from] serde_json::Error),
}

/// The current tree in one of the two shapes callers ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuItems {
    /// Generic nested value, detached from the typed entries.
    Structured(Value),
    /// Compact JSON text.
    Json(String),
}

/// Loads one menu, organizes it into a tree and keeps the cache in step.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use menutree::application::menu::MenuTreeBuilder;
/// # use menutree::cache::{CacheStore, MemoryCacheStore};
/// # use menutree::domain::menu::MenuId;
/// # use menutree::infra::source::JsonFileMenuSource;
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let source = Arc::new(JsonFileMenuSource::new("menus.json"));
/// let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::with_capacity(
///     std::num::NonZeroUsize::MIN,
///     None,
/// ));
/// let mut builder = MenuTreeBuilder::new(MenuId::new(5), source, Some(cache));
/// let json = builder.fetch().await?.get_items(true)?;
/// # let _ = json;
/// # Ok(())
/// # }
/// ```
pub struct MenuTreeBuilder {
    menu_id: MenuId,
    items: MenuTree,
    source: Arc<dyn MenuSource>,
    cache: Option<Arc<dyn CacheStore>>,
    policy: CachePolicy,
}

impl MenuTreeBuilder {
    pub fn new(
        menu_id: MenuId,
        source: Arc<dyn MenuSource>,
        cache: Option<Arc<dyn CacheStore>>,
    ) -> Self {
        Self {
            menu_id,
            items: MenuTree::default(),
            source,
            cache,
            policy: CachePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn menu_id(&self) -> MenuId {
        self.menu_id
    }

    pub fn cache_key(&self) -> String {
        menu_cache_key(self.menu_id)
    }

    /// Resolve the tree, from the cache when possible.
    ///
    /// Cache trouble never fails the call: unreadable or undecodable entries
    /// count as misses and failed writes are only logged.
    #[instrument(skip(self), fields(menu = %self.menu_id))]
    pub async fn fetch(&mut self) -> Result<&mut Self, MenuError> {
        let key = self.cache_key();

        if let Some(tree) = self.cached_tree(&key) {
            counter!(METRIC_CACHE_HIT).increment(1);
            debug!(key = %key, roots = tree.roots().len(), "Menu served from cache");
            self.items = tree;
            return Ok(self);
        }

        let entries = self.source.list_menu_entries(self.menu_id).await?;

        let started_at = Instant::now();
        let entry_count = entries.len();
        let tree = organize(entries)?;
        histogram!(METRIC_BUILD_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        counter!(METRIC_BUILD).increment(1);
        info!(
            entries = entry_count,
            roots = tree.roots().len(),
            "Menu tree built"
        );

        self.store(&key, &tree)?;
        self.items = tree;
        Ok(self)
    }

    pub fn items(&self) -> &MenuTree {
        &self.items
    }

    pub fn get_items(&self, as_json: bool) -> Result<MenuItems, MenuError> {
        if as_json {
            Ok(MenuItems::Json(serde_json::to_string(&self.items)?))
        } else {
            Ok(MenuItems::Structured(serde_json::to_value(&self.items)?))
        }
    }

    /// Hand the current tree to `sink` under the template name `template`.
    pub fn render(&self, sink: &dyn RenderSink, template: &str) -> Result<(), RenderError> {
        debug!(menu = %self.menu_id, template, "Rendering menu");
        sink.render(template, &self.items)
    }

    fn cached_tree(&self, key: &str) -> Option<MenuTree> {
        let cache = self.cache.as_ref()?;

        if self.policy == CachePolicy::Refresh {
            debug!(key, "Cache read skipped by refresh policy");
            return None;
        }

        if !cache.has(key) {
            counter!(METRIC_CACHE_MISS).increment(1);
            return None;
        }

        let tree = match cache.get(key) {
            Ok(Some(raw)) => serde_json::from_str::<MenuTree>(&raw)
                .inspect_err(|err| {
                    warn!(key, error = %err, "Discarding undecodable menu cache entry");
                })
                .ok(),
            Ok(None) => None,
            Err(err) => {
                warn!(key, error = %err, "Menu cache read failed");
                None
            }
        };

        if tree.is_none() {
            counter!(METRIC_CACHE_MISS).increment(1);
        }
        tree
    }

    fn store(&self, key: &str, tree: &MenuTree) -> Result<(), MenuError> {
        let Some(cache) = self.cache.as_ref() else {
            return Ok(());
        };

        let value = serde_json::to_string(tree)?;
        // Host attributes can nest arbitrarily; keep out values a later read would reject.
        if let Err(err) = serde_json::from_str::<IgnoredAny>(&value) {
            warn!(key, error = %err, "Menu tree not cached: value cannot be read back");
            return Ok(());
        }
        if let Err(err) = cache.set(key, value) {
            warn!(key, error = %err, "Menu cache write failed");
        }
        Ok(())
    }
}
