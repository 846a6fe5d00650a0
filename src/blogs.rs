//! Blogs, the tenants of the network

use chrono::naive::NaiveDateTime;

/// Identifier of a blog within the network
pub type BlogId = i64;

/// A single blog
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Blog {
    /// Blog ID
    pub id: BlogId,

    /// Primary domain of the blog
    pub domain: String,

    /// Path of the blog on its domain, starts and ends with a `/`
    pub path: String,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,
}

impl Blog {
    /// Does the request path live below the path of this blog?
    pub fn contains_path(&self, path: &str) -> bool {
        path.starts_with(&self.path) || self.path.strip_suffix('/') == Some(path)
    }
}

/// Normalize a blog path: a leading and trailing slash, `/` for the root
pub fn normalize_path(path: &str) -> String {
    let path = path.trim().trim_matches('/');

    if path.is_empty() {
        String::from("/")
    } else {
        format!("/{path}/")
    }
}
