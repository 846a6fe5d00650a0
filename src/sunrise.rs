//! Sunrise, the alias redirect
//!
//! The most important part of Blog Alias: when no blog matches the requested domain, the domain
//! is looked up as alias. A known alias is answered with a permanent redirect to the site URL of
//! its blog.

use core::fmt;

use async_trait::async_trait;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::IntoResponse;
use axum::response::Response;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::percent_encode;
use url::Url;

use crate::aliases::AliasDomain;
use crate::blogs::BlogId;
use crate::lifecycle::Lifecycle;
use crate::lifecycle::UpgradeResult;
use crate::settings::REDIRECT_WITH_PATH;
use crate::settings::SITE_URL;
use crate::settings::SUNRISE_ACTIVE;
use crate::settings::Settings;
use crate::site::SiteNotFound;
use crate::site::SiteNotFoundHook;
use crate::storage;
use crate::storage::Storage;
use crate::utils::is_truthy;

/// Header naming who redirected
pub const X_REDIRECT_BY: HeaderName = HeaderName::from_static("x-redirect-by");

/// Value of the [`X_REDIRECT_BY`] header
pub const REDIRECT_BY: &str = "Blog-Alias";

/// Punctuation allowed in a redirect location, next to ASCII letters and digits
const ALLOWED_PUNCTUATION: &str = "-~+_.?#=&;,/:%!*[]()@";

/// Encoded line breaks, never allowed in a redirect location
const ENCODED_LINE_BREAKS: [&str; 4] = ["%0d", "%0a", "%0D", "%0A"];

/// Options fixed when building Blog Alias
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SunriseOptions {
    /// Override for appending the request path, wins over the stored settings
    pub redirect_with_path: Option<bool>,
}

impl SunriseOptions {
    /// Options as configured at build time
    ///
    /// `BLOG_ALIAS_REDIRECT_WITH_PATH` sets the override when it is not empty
    pub fn from_build() -> Self {
        Self {
            redirect_with_path: option_env!("BLOG_ALIAS_REDIRECT_WITH_PATH")
                .filter(|value| !value.is_empty())
                .map(|value| is_truthy(Some(value))),
        }
    }
}

/// Sunrise errors
#[derive(Debug)]
pub enum Error {
    /// Checking the switch or looking up the alias failed
    Lookup(storage::Error),

    /// Reading the blog of a known alias failed
    Storage(storage::Error),

    /// The blog of a known alias has no site URL
    MissingSiteUrl(BlogId),

    /// The blog of a known alias has a site URL that is not a URL
    InvalidSiteUrl(BlogId, String),

    /// The sanitized location is not a valid header value
    InvalidLocation(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Lookup(error) => write!(f, "Alias lookup failed: {error}"),
            Error::Storage(error) => write!(f, "Blog lookup failed: {error}"),
            Error::MissingSiteUrl(blog_id) => write!(f, "Blog {blog_id} has no site URL"),
            Error::InvalidSiteUrl(blog_id, site_url) => {
                write!(f, r#"Blog {blog_id} has an invalid site URL: "{site_url}""#)
            }
            Error::InvalidLocation(location) => write!(f, r#"Invalid location: "{location}""#),
        }
    }
}

impl From<storage::Error> for Error {
    fn from(error: storage::Error) -> Self {
        Error::Storage(error)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Permanent redirect to the blog of an alias
#[derive(Debug)]
pub struct Redirect {
    /// Sanitized location
    location: HeaderValue,
}

impl Redirect {
    /// Redirect permanently to a sanitized version of the target
    pub fn moved_permanently(target: &str) -> Result<Self, Error> {
        let location = sanitize_redirect(target);

        match HeaderValue::from_str(&location) {
            Ok(location) => Ok(Self { location }),
            Err(_) => Err(Error::InvalidLocation(location)),
        }
    }

    /// Where the redirect goes
    pub fn location(&self) -> &str {
        self.location.to_str().unwrap_or_default()
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        (
            StatusCode::MOVED_PERMANENTLY,
            [
                (X_REDIRECT_BY, HeaderValue::from_static(REDIRECT_BY)),
                (LOCATION, self.location),
            ],
        )
            .into_response()
    }
}

/// The alias redirect
#[derive(Clone)]
pub struct Sunrise<S: Storage> {
    /// Storage with aliases and settings
    storage: S,

    /// Build time options
    options: SunriseOptions,
}

impl<S: Storage> Sunrise<S> {
    /// Create the alias redirect
    pub fn new(storage: S, options: SunriseOptions) -> Self {
        Self { storage, options }
    }

    /// Decide if and where a request without blog is redirected
    ///
    /// Nothing happens when the sunrise is not active or the domain is not an alias
    pub async fn resolve(&self, site: &SiteNotFound) -> Result<Option<Redirect>, Error> {
        let network = Settings::network(&self.storage);

        if !network
            .is_enabled(SUNRISE_ACTIVE)
            .await
            .map_err(Error::Lookup)?
        {
            tracing::debug!("Sunrise is not active, skipping {}", site.domain);

            return Ok(None);
        }

        let alias = self
            .storage
            .find_single_alias_by_domain(&site.domain)
            .await
            .map_err(Error::Lookup)?;

        let Some(alias) = alias else {
            tracing::debug!(r#"Domain "{}" is not an alias"#, site.domain);

            return Ok(None);
        };

        let blog = Settings::blog(&self.storage, alias.blog_id);

        let target = self.redirect_target(&alias, &blog, &site.path).await?;

        let redirect = Redirect::moved_permanently(&target)?;

        tracing::debug!(
            r#"Alias "{}" redirecting to: {}"#,
            alias.domain_alias,
            redirect.location()
        );

        Ok(Some(redirect))
    }

    /// Is the sunrise active and the domain an alias?
    async fn is_active_alias(&self, domain: &str) -> storage::Result<bool> {
        if !Settings::network(&self.storage)
            .is_enabled(SUNRISE_ACTIVE)
            .await?
        {
            return Ok(false);
        }

        let alias = self.storage.find_single_alias_by_domain(domain).await?;

        Ok(alias.is_some())
    }

    /// Compute the redirect target within the settings of the blog of the alias
    async fn redirect_target(
        &self,
        alias: &AliasDomain,
        blog: &Settings<'_, S>,
        path: &str,
    ) -> Result<String, Error> {
        let site_url = blog
            .get(SITE_URL)
            .await?
            .filter(|site_url| !site_url.trim().is_empty())
            .ok_or(Error::MissingSiteUrl(alias.blog_id))?;

        if Url::parse(&site_url).is_err() {
            return Err(Error::InvalidSiteUrl(alias.blog_id, site_url));
        }

        let with_path = match self.options.redirect_with_path {
            Some(with_path) => with_path,
            None => match blog.get(REDIRECT_WITH_PATH).await? {
                Some(value) => is_truthy(Some(value.as_str())),
                None => {
                    Settings::network(&self.storage)
                        .is_enabled(REDIRECT_WITH_PATH)
                        .await?
                }
            },
        };

        if with_path {
            Ok(format!("{}{path}", untrailingslashit(&site_url)))
        } else {
            Ok(trailingslashit(&site_url))
        }
    }
}

#[async_trait]
impl<S: Storage> SiteNotFoundHook for Sunrise<S> {
    async fn site_not_found(&self, site: &SiteNotFound) -> Option<Response> {
        match self.resolve(site).await {
            Ok(redirect) => redirect.map(IntoResponse::into_response),
            Err(Error::Lookup(err)) => {
                tracing::warn!(r#"Could not look up alias "{}": {err}"#, site.domain);

                None
            }
            Err(err) => {
                tracing::error!(r#"Could not redirect alias "{}": {err}"#, site.domain);

                Some(err.into_response())
            }
        }
    }

    async fn claims_domain(&self, domain: &str) -> bool {
        self.is_active_alias(domain).await.unwrap_or_else(|err| {
            tracing::warn!(r#"Could not look up alias "{domain}": {err}"#);

            false
        })
    }
}

#[async_trait]
impl<S: Storage> Lifecycle for Sunrise<S> {
    fn name(&self) -> &'static str {
        "sunrise"
    }

    async fn activate(&self) -> storage::Result<()> {
        Settings::network(&self.storage)
            .set(SUNRISE_ACTIVE, "1")
            .await
    }

    async fn deactivate(&self) -> storage::Result<()> {
        Settings::network(&self.storage)
            .set(SUNRISE_ACTIVE, "")
            .await
    }

    async fn upgrade(&self, new_version: &str, _old_version: Option<&str>) -> UpgradeResult {
        UpgradeResult::ok(format!("Sunrise ready for {new_version}"))
    }

    async fn uninstall(&self) -> storage::Result<()> {
        let network = Settings::network(&self.storage);

        network.delete(SUNRISE_ACTIVE).await?;
        network.delete(REDIRECT_WITH_PATH).await
    }
}

/// Remove trailing forward and backward slashes
fn untrailingslashit(value: &str) -> &str {
    value.trim_end_matches(['/', '\\'])
}

/// Exactly one trailing forward slash
fn trailingslashit(value: &str) -> String {
    format!("{}/", untrailingslashit(value))
}

/// Sanitize a redirect location
///
/// Spaces and non-ASCII characters are percent-encoded, everything else outside the safe set is
/// dropped, and encoded line breaks are removed until none are left.
pub fn sanitize_redirect(location: &str) -> String {
    let mut sanitized = String::with_capacity(location.len());

    for ch in location.chars() {
        if ch == ' ' {
            sanitized.push_str("%20");
        } else if !ch.is_ascii() {
            let mut buffer = [0; 4];
            sanitized.extend(percent_encode(
                ch.encode_utf8(&mut buffer).as_bytes(),
                NON_ALPHANUMERIC,
            ));
        } else if ch.is_ascii_alphanumeric() || ALLOWED_PUNCTUATION.contains(ch) {
            sanitized.push(ch);
        }
    }

    strip_encoded_line_breaks(sanitized)
}

/// Remove encoded line breaks, repeatedly, so removals can not form new ones
fn strip_encoded_line_breaks(mut location: String) -> String {
    loop {
        let length = location.len();

        for line_break in ENCODED_LINE_BREAKS {
            location = location.replace(line_break, "");
        }

        if location.len() == length {
            return location;
        }
    }
}
