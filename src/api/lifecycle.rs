//! Lifecycle API endpoints
//!
//! Activate, deactivate, upgrade and uninstall the plugin from the outside

use std::sync::Arc;

use axum::Extension;
use serde::Serialize;

use crate::lifecycle::Plugin;
use crate::lifecycle::UpgradeSummary;
use crate::lifecycle::VersionPersistence;
use crate::settings::SUNRISE_ACTIVE;
use crate::settings::Settings;
use crate::settings::VERSION;
use crate::storage::Storage;

use super::Admin;
use super::Error;
use super::Success;

/// Lifecycle status going to the admin
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// The deployed version
    pub version: String,

    /// Version the last upgrade ran for
    pub stored_version: Option<String>,

    /// When the deployed version is stored
    pub persistence: VersionPersistence,

    /// Are aliases being redirected?
    pub sunrise_active: bool,
}

/// Outcome of a lifecycle action that may upgrade first
#[derive(Debug, Serialize)]
pub struct UpgradeResponse {
    /// `null` when already up to date
    pub upgrade: Option<UpgradeSummary>,
}

/// Current lifecycle status
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:7000/api/lifecycle
/// ```
///
/// Response:
/// ```json
/// { "data": { "version": "1.0.0", "storedVersion": "1.0.0", "persistence": "on-success", "sunriseActive": true } }
/// ```
pub async fn status<S: Storage>(
    _admin: Admin,
    Extension(storage): Extension<S>,
    Extension(plugin): Extension<Arc<Plugin<S>>>,
) -> Result<Success<StatusResponse>, Error> {
    let network = Settings::network(&storage);

    let stored_version = network
        .get(VERSION)
        .await
        .map_err(Error::internal_server_error)?;

    let sunrise_active = network
        .is_enabled(SUNRISE_ACTIVE)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(StatusResponse {
        version: plugin.version().to_string(),
        stored_version,
        persistence: plugin.persistence(),
        sunrise_active,
    }))
}

/// Activate all components, upgrading first when needed
pub async fn activate<S: Storage>(
    _admin: Admin,
    Extension(plugin): Extension<Arc<Plugin<S>>>,
) -> Result<Success<UpgradeResponse>, Error> {
    let upgrade = plugin
        .activate()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(UpgradeResponse { upgrade }))
}

/// Deactivate all components, aliases are no longer redirected
pub async fn deactivate<S: Storage>(
    _admin: Admin,
    Extension(plugin): Extension<Arc<Plugin<S>>>,
) -> Result<Success<&'static str>, Error> {
    plugin
        .deactivate()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::no_content())
}

/// Upgrade when the deployed version is newer than the stored one
pub async fn upgrade<S: Storage>(
    _admin: Admin,
    Extension(plugin): Extension<Arc<Plugin<S>>>,
) -> Result<Success<UpgradeResponse>, Error> {
    let upgrade = plugin
        .maybe_upgrade()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(UpgradeResponse { upgrade }))
}

/// Uninstall all components, removing every alias and setting of the plugin
pub async fn uninstall<S: Storage>(
    _admin: Admin,
    Extension(plugin): Extension<Arc<Plugin<S>>>,
) -> Result<Success<&'static str>, Error> {
    plugin
        .uninstall()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::no_content())
}
