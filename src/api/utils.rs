//! Utility functions for the API

use uuid::Uuid;

use crate::aliases::AliasDomain;
use crate::api::Error;
use crate::blogs::Blog;
use crate::blogs::BlogId;
use crate::storage;
use crate::storage::Storage;

/// Fetch blog from storage
pub async fn fetch_blog<S: Storage>(storage: &S, blog_id: BlogId) -> Result<Blog, Error> {
    storage
        .find_single_blog_by_id(blog_id)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("Blog not found")), Ok)
}

/// Map a failed insert, a conflict is answered with the given message
pub fn insert_error(message: &'static str) -> impl FnOnce(storage::Error) -> Error {
    move |err| match err {
        storage::Error::Conflict(_) => Error::conflict(message),
        err => Error::internal_server_error(err),
    }
}

/// Fetch alias domain from storage
pub async fn fetch_alias<S: Storage>(storage: &S, alias_id: &Uuid) -> Result<AliasDomain, Error> {
    storage
        .find_single_alias_by_id(alias_id)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("Alias not found")), Ok)
}
