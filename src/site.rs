//! Host routing
//!
//! Every request outside of the API ends up here. The host and path decide which blog serves
//! the request. When no blog matches, the site-not-found hooks get a chance to answer before
//! the request ends in a `404 Not Found`.
//!
//! The API paths are only served on the admin host. Without a configured admin host, a blog
//! domain or a domain claimed by a hook keeps its API paths to itself.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Extension;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::HOST;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::aliases::normalize_host;
use crate::blogs::Blog;
use crate::client_ip::ClientIp;
use crate::storage::Storage;

/// Header telling which blog serves the request
pub const X_BLOG_ID: HeaderName = HeaderName::from_static("x-blog-id");

/// Prefix of the management API
const API_PREFIX: &str = "/api";

/// The only host serving the management API, if configured
#[derive(Clone, Debug, Default)]
pub struct AdminHost {
    /// Normalized host
    host: Option<Arc<str>>,
}

impl AdminHost {
    /// Restrict the API to the given host, `None` keeps it on every host without a site
    pub fn new(host: Option<&str>) -> Self {
        Self {
            host: host
                .map(normalize_host)
                .filter(|host| !host.is_empty())
                .map(Arc::from),
        }
    }
}

/// The request did not match any blog
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteNotFound {
    /// Normalized requested domain
    pub domain: String,

    /// Requested path, without query string
    pub path: String,
}

/// Interceptor for requests without a blog
#[async_trait]
pub trait SiteNotFoundHook: Send + Sync {
    /// Answer the request, or `None` to let routing continue
    async fn site_not_found(&self, site: &SiteNotFound) -> Option<Response>;

    /// Does this hook answer every request for the domain?
    async fn claims_domain(&self, _domain: &str) -> bool {
        false
    }
}

/// All registered site-not-found hooks, in order
#[derive(Clone)]
pub struct SiteNotFoundHooks {
    /// The hooks
    hooks: Arc<Vec<Box<dyn SiteNotFoundHook>>>,
}

impl SiteNotFoundHooks {
    /// Register hooks, the first to answer wins
    pub fn new(hooks: Vec<Box<dyn SiteNotFoundHook>>) -> Self {
        Self {
            hooks: Arc::new(hooks),
        }
    }

    /// Run the hooks until one answers
    pub async fn run(&self, site: &SiteNotFound) -> Option<Response> {
        for hook in self.hooks.iter() {
            if let Some(response) = hook.site_not_found(site).await {
                return Some(response);
            }
        }

        None
    }

    /// Is the domain claimed by any of the hooks?
    pub async fn claims_domain(&self, domain: &str) -> bool {
        for hook in self.hooks.iter() {
            if hook.claims_domain(domain).await {
                return true;
            }
        }

        false
    }
}

/// Route a request to its blog
///
/// Rendering the blog happens elsewhere, a matching request is answered with the ID of the blog
pub async fn route<S: Storage>(
    ip_address: Option<ClientIp>,
    Extension(storage): Extension<S>,
    Extension(hooks): Extension<SiteNotFoundHooks>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let domain = request_domain(&headers, &uri);

    serve_site(ip_address, &storage, &hooks, domain, uri.path()).await
}

/// Keep the API paths of a site away from the management API
///
/// Requests for the API on any host but the admin host are routed like every other request
pub async fn guard_api<S: Storage>(
    ip_address: Option<ClientIp>,
    Extension(storage): Extension<S>,
    Extension(hooks): Extension<SiteNotFoundHooks>,
    Extension(admin_host): Extension<AdminHost>,
    request: Request,
    next: Next,
) -> Response {
    if !is_api_path(request.uri().path()) {
        return next.run(request).await;
    }

    let domain = request_domain(request.headers(), request.uri());

    if serves_api(&storage, &hooks, &admin_host, domain.as_deref()).await {
        return next.run(request).await;
    }

    serve_site(ip_address, &storage, &hooks, domain, request.uri().path()).await
}

/// Is the path part of the management API?
fn is_api_path(path: &str) -> bool {
    path.strip_prefix(API_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Does the domain serve the management API?
async fn serves_api<S: Storage>(
    storage: &S,
    hooks: &SiteNotFoundHooks,
    admin_host: &AdminHost,
    domain: Option<&str>,
) -> bool {
    if let Some(admin_host) = &admin_host.host {
        return domain == Some(&**admin_host);
    }

    let Some(domain) = domain else {
        return true;
    };

    match storage.find_any_blog_by_domain(domain).await {
        Ok(Some(_)) => false,
        Ok(None) => !hooks.claims_domain(domain).await,
        Err(err) => {
            tracing::warn!("Could not look up blogs of {domain}: {err}");

            true
        }
    }
}

/// Route to the blog of the domain and path, or the site-not-found hooks
async fn serve_site<S: Storage>(
    ip_address: Option<ClientIp>,
    storage: &S,
    hooks: &SiteNotFoundHooks,
    domain: Option<String>,
    path: &str,
) -> Response {
    let Some(domain) = domain else {
        return (StatusCode::BAD_REQUEST, "Missing host").into_response();
    };

    let blog = match storage
        .find_single_blog_by_domain_and_path(&domain, path)
        .await
    {
        Ok(blog) => blog,
        Err(err) => {
            tracing::error!("Could not look up blog for {domain}{path}: {err}");

            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    if let Some(blog) = blog {
        tracing::debug!("{domain}{path} is served by blog {}", blog.id);

        return serve_blog(&blog);
    }

    let ip_address = ip_address.map(|ip_address| ip_address.ip_address);

    tracing::debug!("No blog for {domain}{path} (client: {ip_address:?})");

    let site = SiteNotFound {
        domain,
        path: path.to_string(),
    };

    if let Some(response) = hooks.run(&site).await {
        return response;
    }

    (StatusCode::NOT_FOUND, "Site not found").into_response()
}

/// Answer for a request that belongs to a blog
fn serve_blog(blog: &Blog) -> Response {
    (StatusCode::OK, [(X_BLOG_ID, blog.id.to_string())]).into_response()
}

/// The normalized domain of the request
///
/// The `Host` header wins over the authority of the URI
fn request_domain(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let host = headers
        .get(HOST)
        .and_then(|host| host.to_str().ok())
        .or_else(|| uri.host())?;

    let domain = normalize_host(host);

    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}
