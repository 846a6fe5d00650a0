//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::aliases::AliasDomain;
use crate::blogs::Blog;
use crate::blogs::BlogId;
use crate::settings::Scope;

use super::CreateAliasValues;
use super::CreateBlogValues;
use super::Error;
use super::Result;
use super::Storage;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All blogs in storage, by ID
    blogs: Arc<Mutex<BTreeMap<BlogId, Blog>>>,

    /// All alias domains in storage, in order of creation
    aliases: Arc<Mutex<Vec<AliasDomain>>>,

    /// All settings in storage, per scope
    settings: Arc<Mutex<HashMap<Scope, BTreeMap<String, String>>>>,

    /// Number of lookups by alias domain
    alias_lookups: Arc<AtomicUsize>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times an alias domain was looked up by domain
    #[cfg(test)]
    pub fn alias_lookups(&self) -> usize {
        self.alias_lookups.load(Ordering::SeqCst)
    }
}

impl Storage for Memory {
    async fn install(&self) -> Result<()> {
        Ok(())
    }

    async fn find_all_blogs(&self) -> Result<Vec<Blog>> {
        Ok(self.blogs.lock().await.values().cloned().collect())
    }

    async fn find_single_blog_by_id(&self, id: BlogId) -> Result<Option<Blog>> {
        Ok(self.blogs.lock().await.get(&id).cloned())
    }

    async fn find_single_blog_by_domain_and_path(
        &self,
        domain: &str,
        path: &str,
    ) -> Result<Option<Blog>> {
        Ok(self
            .blogs
            .lock()
            .await
            .values()
            .filter(|blog| blog.domain == domain && blog.contains_path(path))
            .max_by_key(|blog| blog.path.len())
            .cloned())
    }

    async fn find_any_blog_by_domain(&self, domain: &str) -> Result<Option<Blog>> {
        Ok(self
            .blogs
            .lock()
            .await
            .values()
            .find(|blog| blog.domain == domain)
            .cloned())
    }

    async fn create_blog(&self, values: &CreateBlogValues<'_>) -> Result<Blog> {
        let mut blogs = self.blogs.lock().await;

        if blogs
            .values()
            .any(|blog| blog.domain == values.domain && blog.path == values.path)
        {
            return Err(Error::Conflict(format!(
                "Blog {}{} already exists",
                values.domain, values.path
            )));
        }

        let id = blogs.keys().next_back().map_or(1, |id| id + 1);

        let blog = Blog {
            id,
            domain: values.domain.to_string(),
            path: values.path.to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };

        blogs.insert(blog.id, blog.clone());

        Ok(blog)
    }

    async fn find_all_aliases(&self) -> Result<Vec<AliasDomain>> {
        Ok(self.aliases.lock().await.clone())
    }

    async fn find_all_aliases_by_blog(&self, blog: &Blog) -> Result<Vec<AliasDomain>> {
        Ok(self
            .aliases
            .lock()
            .await
            .iter()
            .filter(|alias| alias.blog_id == blog.id)
            .cloned()
            .collect())
    }

    async fn find_single_alias_by_id(&self, id: &Uuid) -> Result<Option<AliasDomain>> {
        Ok(self
            .aliases
            .lock()
            .await
            .iter()
            .find(|alias| &alias.id == id)
            .cloned())
    }

    async fn find_single_alias_by_domain(&self, domain: &str) -> Result<Option<AliasDomain>> {
        self.alias_lookups.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .aliases
            .lock()
            .await
            .iter()
            .find(|alias| alias.domain_alias == domain)
            .cloned())
    }

    async fn create_alias(
        &self,
        blog: &Blog,
        values: &CreateAliasValues<'_>,
    ) -> Result<AliasDomain> {
        let mut aliases = self.aliases.lock().await;

        if aliases
            .iter()
            .any(|alias| alias.domain_alias == values.domain_alias)
        {
            return Err(Error::Conflict(format!(
                "Alias {} already exists",
                values.domain_alias
            )));
        }

        let alias = AliasDomain {
            id: Uuid::new_v4(),
            domain_alias: values.domain_alias.to_string(),
            blog_id: blog.id,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };

        aliases.push(alias.clone());

        Ok(alias)
    }

    async fn delete_alias(&self, alias: &AliasDomain) -> Result<()> {
        self.aliases
            .lock()
            .await
            .retain(|existing| existing.id != alias.id);

        Ok(())
    }

    async fn delete_all_aliases(&self) -> Result<()> {
        self.aliases.lock().await.clear();

        Ok(())
    }

    async fn find_all_settings(&self, scope: Scope) -> Result<BTreeMap<String, String>> {
        Ok(self
            .settings
            .lock()
            .await
            .get(&scope)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_setting(&self, scope: Scope, key: &str) -> Result<Option<String>> {
        Ok(self
            .settings
            .lock()
            .await
            .get(&scope)
            .and_then(|settings| settings.get(key))
            .cloned())
    }

    async fn set_setting(&self, scope: Scope, key: &str, value: &str) -> Result<()> {
        self.settings
            .lock()
            .await
            .entry(scope)
            .or_default()
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    async fn delete_setting(&self, scope: Scope, key: &str) -> Result<()> {
        if let Some(settings) = self.settings.lock().await.get_mut(&scope) {
            settings.remove(key);
        }

        Ok(())
    }
}
