//! Blogs API endpoints
//!
//! Blogs are the tenants of the network, each with a primary domain and path

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::blogs::Blog;
use crate::blogs::BlogId;
use crate::blogs::normalize_path;
use crate::settings::SITE_URL;
use crate::settings::Settings;
use crate::storage::CreateBlogValues;
use crate::storage::Storage;

use super::Admin;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::parse_domain;
use super::parse_url;
use super::utils::fetch_blog;
use super::utils::insert_error;

/// Blog response going to the admin
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogResponse {
    /// Blog ID
    pub id: BlogId,

    /// Primary domain
    pub domain: String,

    /// Path on the primary domain
    pub path: String,

    /// Base URL aliases redirect to
    pub site_url: Option<String>,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,
}

impl BlogResponse {
    /// Create a response from a [`Blog`](Blog) and its site URL
    fn from_blog(blog: Blog, site_url: Option<String>) -> Self {
        Self {
            id: blog.id,
            domain: blog.domain,
            path: blog.path,
            site_url,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }

    /// Create a response for a blog, looking up its site URL
    async fn with_site_url<S: Storage>(storage: &S, blog: Blog) -> Result<Self, Error> {
        let site_url = Settings::blog(storage, blog.id)
            .get(SITE_URL)
            .await
            .map_err(Error::internal_server_error)?;

        Ok(Self::from_blog(blog, site_url))
    }
}

/// List all blogs
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:7000/api/blogs
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": 1, "domain": "example.com", "path": "/", "siteUrl": "https://example.com/" ... } ] }
/// ```
pub async fn list<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
) -> Result<Success<Vec<BlogResponse>>, Error> {
    let blogs = storage
        .find_all_blogs()
        .await
        .map_err(Error::internal_server_error)?;

    let mut response = Vec::with_capacity(blogs.len());

    for blog in blogs {
        response.push(BlogResponse::with_site_url(&storage, blog).await?);
    }

    Ok(Success::ok(response))
}

/// Get a single blog
pub async fn single<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    PathParameters(blog_id): PathParameters<BlogId>,
) -> Result<Success<BlogResponse>, Error> {
    let blog = fetch_blog(&storage, blog_id).await?;

    BlogResponse::with_site_url(&storage, blog)
        .await
        .map(Success::ok)
}

/// Create blog form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogForm {
    /// Primary domain, normalized
    domain: String,

    /// Path on the primary domain, `/` when missing
    path: Option<String>,

    /// Base URL, `http://<domain><path>` when missing
    site_url: Option<String>,
}

/// Create a blog
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "domain": "example.com", "siteUrl": "https://example.com/" }' \
///     http://localhost:7000/api/blogs
/// ```
pub async fn create<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    Form(form): Form<CreateBlogForm>,
) -> Result<Success<BlogResponse>, Error> {
    let domain = parse_domain(&form.domain)?;
    let path = normalize_path(form.path.as_deref().unwrap_or_default());

    let site_url = match form.site_url {
        Some(site_url) => parse_url(site_url)?.to_string(),
        None => format!("http://{domain}{path}"),
    };

    if storage
        .find_single_alias_by_domain(&domain)
        .await
        .map_err(Error::internal_server_error)?
        .is_some()
    {
        return Err(Error::conflict("Domain is used by an alias"));
    }

    if storage
        .find_all_blogs()
        .await
        .map_err(Error::internal_server_error)?
        .iter()
        .any(|blog| blog.domain == domain && blog.path == path)
    {
        return Err(Error::conflict("Blog already exists"));
    }

    let blog = storage
        .create_blog(&CreateBlogValues {
            domain: &domain,
            path: &path,
        })
        .await
        .map_err(insert_error("Blog already exists"))?;

    Settings::blog(&storage, blog.id)
        .set(SITE_URL, &site_url)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!("Created blog {} for {domain}{path}", blog.id);

    Ok(Success::created(BlogResponse::from_blog(
        blog,
        Some(site_url),
    )))
}
