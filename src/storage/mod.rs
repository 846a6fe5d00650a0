//! All things related to the storage of blogs, alias domains and settings

use core::fmt;
use std::collections::BTreeMap;
use std::future::Future;

use uuid::Uuid;

pub use memory::Memory;
pub use postgres::Postgres;

use crate::aliases::AliasDomain;
use crate::blogs::Blog;
use crate::blogs::BlogId;
use crate::settings::Scope;

mod memory;
mod postgres;

/// Storage errors
#[derive(Debug)]
pub enum Error {
    /// A connection error with the storage
    Connection(String),

    /// The value already exists
    Conflict(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(error) => write!(f, "Connection error: {error}"),
            Error::Conflict(error) => write!(f, "Conflict: {error}"),
        }
    }
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a Blog
pub struct CreateBlogValues<'a> {
    /// Normalized primary domain
    pub domain: &'a str,

    /// Normalized path
    pub path: &'a str,
}

/// Values to create an alias domain
pub struct CreateAliasValues<'a> {
    /// Normalized secondary domain
    pub domain_alias: &'a str,
}

/// Storage with all supported operations
pub trait Storage: Clone + Send + Sync + 'static {
    /// Prepare the storage for use
    ///
    /// Safe to call multiple times
    fn install(&self) -> impl Future<Output = Result<()>> + Send;

    /// Find all blogs, ordered by ID
    fn find_all_blogs(&self) -> impl Future<Output = Result<Vec<Blog>>> + Send;

    /// Find a single blog by its ID
    fn find_single_blog_by_id(&self, id: BlogId)
    -> impl Future<Output = Result<Option<Blog>>> + Send;

    /// Find the blog serving a request
    ///
    /// The domain has to match exactly, the blog with the longest path containing the request
    /// path wins
    fn find_single_blog_by_domain_and_path(
        &self,
        domain: &str,
        path: &str,
    ) -> impl Future<Output = Result<Option<Blog>>> + Send;

    /// Find any blog using a domain, regardless of its path
    fn find_any_blog_by_domain(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Option<Blog>>> + Send;

    /// Create a blog
    fn create_blog(&self, values: &CreateBlogValues<'_>)
    -> impl Future<Output = Result<Blog>> + Send;

    /// Find all alias domains
    fn find_all_aliases(&self) -> impl Future<Output = Result<Vec<AliasDomain>>> + Send;

    /// Find all alias domains of a blog
    fn find_all_aliases_by_blog(
        &self,
        blog: &Blog,
    ) -> impl Future<Output = Result<Vec<AliasDomain>>> + Send;

    /// Find a single alias domain by its ID
    fn find_single_alias_by_id(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<AliasDomain>>> + Send;

    /// Find a single alias domain by exact domain
    ///
    /// Domains are unique, the first match is returned
    fn find_single_alias_by_domain(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Option<AliasDomain>>> + Send;

    /// Create an alias domain for a blog
    fn create_alias(
        &self,
        blog: &Blog,
        values: &CreateAliasValues<'_>,
    ) -> impl Future<Output = Result<AliasDomain>> + Send;

    /// Delete an alias domain
    fn delete_alias(&self, alias: &AliasDomain) -> impl Future<Output = Result<()>> + Send;

    /// Delete all alias domains
    fn delete_all_aliases(&self) -> impl Future<Output = Result<()>> + Send;

    /// All settings of a scope
    fn find_all_settings(
        &self,
        scope: Scope,
    ) -> impl Future<Output = Result<BTreeMap<String, String>>> + Send;

    /// Get a single setting
    fn get_setting(
        &self,
        scope: Scope,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Set a single setting, replacing the existing value
    fn set_setting(
        &self,
        scope: Scope,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove a single setting
    fn delete_setting(&self, scope: Scope, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Convert driver error to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
