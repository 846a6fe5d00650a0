//! Aliases API endpoints
//!
//! Everything related to the alias domains management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::aliases::AliasDomain;
use crate::blogs::BlogId;
use crate::storage::CreateAliasValues;
use crate::storage::Storage;

use super::Admin;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::parse_domain;
use super::utils::fetch_alias;
use super::utils::fetch_blog;
use super::utils::insert_error;

/// Alias response going to the admin
///
/// Basically filtering which fields are shown to the admin
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasResponse {
    /// Alias ID
    pub id: Uuid,

    /// The secondary domain
    pub domain_alias: String,

    /// Blog the alias redirects to
    pub blog_id: BlogId,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,
}

impl AliasResponse {
    /// Create a response from an [`AliasDomain`](AliasDomain)
    fn from_alias(alias: AliasDomain) -> Self {
        Self {
            id: alias.id,
            domain_alias: alias.domain_alias,
            blog_id: alias.blog_id,
            created_at: alias.created_at,
            updated_at: alias.updated_at,
        }
    }

    /// Create a response from multiple [`AliasDomain`](AliasDomain)s
    fn from_alias_multiple(mut aliases: Vec<AliasDomain>) -> Vec<Self> {
        aliases
            .drain(..)
            .map(Self::from_alias)
            .collect::<Vec<Self>>()
    }
}

/// List all alias domains of the network
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:7000/api/aliases
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "domainAlias": "example.org", "blogId": 1 ... } ] }
/// ```
pub async fn list<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
) -> Result<Success<Vec<AliasResponse>>, Error> {
    let aliases = storage
        .find_all_aliases()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(AliasResponse::from_alias_multiple(aliases)))
}

/// List all alias domains of a blog
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:7000/api/blogs/1/aliases
/// ```
pub async fn list_by_blog<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    PathParameters(blog_id): PathParameters<BlogId>,
) -> Result<Success<Vec<AliasResponse>>, Error> {
    let blog = fetch_blog(&storage, blog_id).await?;

    let aliases = storage
        .find_all_aliases_by_blog(&blog)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(AliasResponse::from_alias_multiple(aliases)))
}

/// Get a single alias domain
pub async fn single<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    PathParameters(alias_id): PathParameters<Uuid>,
) -> Result<Success<AliasResponse>, Error> {
    fetch_alias(&storage, &alias_id)
        .await
        .map(|alias| Success::ok(AliasResponse::from_alias(alias)))
}

/// Create alias form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAliasForm {
    /// The secondary domain
    ///
    /// The domain is normalized:
    /// - Lowercase, without port or trailing dot
    /// - Internationalized domains in their ASCII form
    domain_alias: String,

    /// Blog to redirect to
    blog_id: BlogId,
}

/// Create an alias domain
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "domainAlias": "example.org", "blogId": 1 }' \
///     http://localhost:7000/api/aliases
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "domainAlias": "example.org", "blogId": 1 ... } }
/// ```
pub async fn create<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    Form(form): Form<CreateAliasForm>,
) -> Result<Success<AliasResponse>, Error> {
    let domain_alias = parse_domain(&form.domain_alias)?;

    let blog = fetch_blog(&storage, form.blog_id).await?;

    // an alias must never shadow a blog, the blog would always win
    if storage
        .find_any_blog_by_domain(&domain_alias)
        .await
        .map_err(Error::internal_server_error)?
        .is_some()
    {
        return Err(Error::conflict("Domain is used by a blog"));
    }

    if storage
        .find_single_alias_by_domain(&domain_alias)
        .await
        .map_err(Error::internal_server_error)?
        .is_some()
    {
        return Err(Error::conflict("Domain alias already exists"));
    }

    let alias = storage
        .create_alias(
            &blog,
            &CreateAliasValues {
                domain_alias: &domain_alias,
            },
        )
        .await
        .map_err(insert_error("Domain alias already exists"))?;

    tracing::info!(
        r#"Created alias "{}" for blog {}"#,
        alias.domain_alias,
        blog.id
    );

    Ok(Success::created(AliasResponse::from_alias(alias)))
}

/// Delete an alias domain
///
/// Request:
/// ```sh
/// curl -v -X DELETE -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:7000/api/aliases/<uuid>
/// ```
pub async fn delete<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    PathParameters(alias_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    let alias = fetch_alias(&storage, &alias_id).await?;

    storage
        .delete_alias(&alias)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!(r#"Deleted alias "{}""#, alias.domain_alias);

    Ok(Success::no_content())
}
