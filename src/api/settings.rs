//! Settings API endpoints
//!
//! Only the settings Blog Alias reads itself can be managed, the stored version is off limits

use std::collections::BTreeMap;

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;

use crate::blogs::BlogId;
use crate::settings::BLOG_KEYS;
use crate::settings::NETWORK_KEYS;
use crate::settings::SITE_URL;
use crate::settings::Settings;
use crate::storage::Storage;

use super::Admin;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::parse_url;
use super::utils::fetch_blog;

/// A single setting going to the admin
#[derive(Debug, Serialize)]
pub struct SettingResponse {
    /// Setting key
    pub key: String,

    /// Stored value
    pub value: String,
}

/// Update setting form
#[derive(Debug, Deserialize)]
pub struct UpdateSettingForm {
    /// New value
    value: String,
}

/// Only known keys can be managed
fn check_key(allowed: &[&str], key: &str) -> Result<(), Error> {
    if allowed.contains(&key) {
        Ok(())
    } else {
        Err(Error::bad_request("Unknown setting").with_description(format!(
            "Expected one of: {}",
            allowed.join(", ")
        )))
    }
}

/// Validate and normalize a value before storing it
fn check_value(key: &str, value: &str) -> Result<String, Error> {
    if key == SITE_URL {
        parse_url(value).map(|url| url.to_string())
    } else {
        Ok(value.trim().to_string())
    }
}

async fn update<S: Storage>(
    settings: &Settings<'_, S>,
    key: String,
    value: &str,
) -> Result<Success<SettingResponse>, Error> {
    let value = check_value(&key, value)?;

    settings
        .set(&key, &value)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!(r#"Setting "{key}" of {:?} updated to "{value}""#, settings.scope());

    Ok(Success::ok(SettingResponse { key, value }))
}

async fn delete<S: Storage>(
    settings: &Settings<'_, S>,
    key: &str,
) -> Result<Success<&'static str>, Error> {
    settings
        .delete(key)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!(r#"Setting "{key}" of {:?} deleted"#, settings.scope());

    Ok(Success::no_content())
}

/// List the manageable network settings
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:7000/api/settings
/// ```
///
/// Response:
/// ```json
/// { "data": { "sunrise_active": "1" } }
/// ```
pub async fn list_network<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
) -> Result<Success<BTreeMap<String, String>>, Error> {
    let mut settings = Settings::network(&storage)
        .all()
        .await
        .map_err(Error::internal_server_error)?;

    settings.retain(|key, _| NETWORK_KEYS.contains(&key.as_str()));

    Ok(Success::ok(settings))
}

/// Update a network setting
///
/// Request:
/// ```sh
/// curl -v -X PUT -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "value": "1" }' \
///     http://localhost:7000/api/settings/redirect_with_path
/// ```
pub async fn update_network<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    PathParameters(key): PathParameters<String>,
    Form(form): Form<UpdateSettingForm>,
) -> Result<Success<SettingResponse>, Error> {
    check_key(NETWORK_KEYS, &key)?;

    update(&Settings::network(&storage), key, &form.value).await
}

/// Delete a network setting
pub async fn delete_network<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    PathParameters(key): PathParameters<String>,
) -> Result<Success<&'static str>, Error> {
    check_key(NETWORK_KEYS, &key)?;

    delete(&Settings::network(&storage), &key).await
}

/// List the manageable settings of a blog
pub async fn list_blog<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    PathParameters(blog_id): PathParameters<BlogId>,
) -> Result<Success<BTreeMap<String, String>>, Error> {
    let blog = fetch_blog(&storage, blog_id).await?;

    let mut settings = Settings::blog(&storage, blog.id)
        .all()
        .await
        .map_err(Error::internal_server_error)?;

    settings.retain(|key, _| BLOG_KEYS.contains(&key.as_str()));

    Ok(Success::ok(settings))
}

/// Update a setting of a blog
///
/// Request:
/// ```sh
/// curl -v -X PUT -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "value": "https://www.example.com/" }' \
///     http://localhost:7000/api/blogs/1/settings/siteurl
/// ```
pub async fn update_blog<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    PathParameters((blog_id, key)): PathParameters<(BlogId, String)>,
    Form(form): Form<UpdateSettingForm>,
) -> Result<Success<SettingResponse>, Error> {
    check_key(BLOG_KEYS, &key)?;

    let blog = fetch_blog(&storage, blog_id).await?;

    update(&Settings::blog(&storage, blog.id), key, &form.value).await
}

/// Delete a setting of a blog
pub async fn delete_blog<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    PathParameters((blog_id, key)): PathParameters<(BlogId, String)>,
) -> Result<Success<&'static str>, Error> {
    check_key(BLOG_KEYS, &key)?;

    let blog = fetch_blog(&storage, blog_id).await?;

    delete(&Settings::blog(&storage, blog.id), &key).await
}
