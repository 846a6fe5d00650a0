//! Alias domains

use chrono::naive::NaiveDateTime;
use uuid::Uuid;

use crate::blogs::BlogId;

/// Secondary domain pointing to a blog
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AliasDomain {
    /// Alias ID
    pub id: Uuid,

    /// The normalized secondary domain, unique over all aliases
    pub domain_alias: String,

    /// The blog the alias redirects to
    pub blog_id: BlogId,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,
}

/// Normalize a requested host so it can be compared with stored domains
///
/// Strips the port and a trailing dot, lowercases the rest
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();

    let host = if host.starts_with('[') {
        // IPv6 literal, the port comes after the closing bracket
        host.find(']').map_or(host, |end| &host[..=end])
    } else {
        host.split_once(':').map_or(host, |(host, _port)| host)
    };

    host.strip_suffix('.').unwrap_or(host).to_ascii_lowercase()
}
