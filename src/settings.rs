//! Settings, scoped to the whole network or to a single blog
//!
//! There is no "current blog": whoever needs blog settings creates a view for that blog
//! explicitly.

use std::collections::BTreeMap;

use crate::blogs::BlogId;
use crate::storage::Result;
use crate::storage::Storage;
use crate::utils::is_truthy;

/// Master switch of the alias redirects, network scope
pub const SUNRISE_ACTIVE: &str = "sunrise_active";

/// Append the request path to the redirect target, network or blog scope
pub const REDIRECT_WITH_PATH: &str = "redirect_with_path";

/// Last version the lifecycle upgrade ran for, network scope
pub const VERSION: &str = "blog_alias_version";

/// Base URL of a blog, blog scope
pub const SITE_URL: &str = "siteurl";

/// Network settings that can be managed from the outside
pub const NETWORK_KEYS: &[&str] = &[SUNRISE_ACTIVE, REDIRECT_WITH_PATH];

/// Blog settings that can be managed from the outside
pub const BLOG_KEYS: &[&str] = &[SITE_URL, REDIRECT_WITH_PATH];

/// Scope of a setting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Shared by all blogs
    Network,

    /// Owned by a single blog
    Blog(BlogId),
}

/// Settings of a single scope
pub struct Settings<'a, S: Storage> {
    /// Where the settings live
    storage: &'a S,

    /// Scope of this view
    scope: Scope,
}

impl<'a, S: Storage> Settings<'a, S> {
    /// Network-wide settings
    pub fn network(storage: &'a S) -> Self {
        Self {
            storage,
            scope: Scope::Network,
        }
    }

    /// Settings of a single blog
    pub fn blog(storage: &'a S, blog_id: BlogId) -> Self {
        Self {
            storage,
            scope: Scope::Blog(blog_id),
        }
    }

    /// Scope of this view
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Get a raw value
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_setting(self.scope, key).await
    }

    /// Get a value as flag, see [`is_truthy`]
    pub async fn is_enabled(&self, key: &str) -> Result<bool> {
        let value = self.get(key).await?;

        Ok(is_truthy(value.as_deref()))
    }

    /// Set a value, replacing the existing one
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_setting(self.scope, key, value).await
    }

    /// Remove a value
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.storage.delete_setting(self.scope, key).await
    }

    /// All values of this scope
    pub async fn all(&self) -> Result<BTreeMap<String, String>> {
        self.storage.find_all_settings(self.scope).await
    }
}
