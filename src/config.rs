//! Configuration from the environment

use uuid::Uuid;

use crate::lifecycle::VersionPersistence;
use crate::sunrise::SunriseOptions;
use crate::utils::env_var;
use crate::utils::env_var_or_else;
use crate::utils::is_truthy;

/// Everything Blog Alias needs to know, except for the storage
pub struct Config {
    /// Bearer token for the management API
    pub admin_token: String,

    /// The only host serving the management API
    pub admin_host: Option<String>,

    /// The deployed version
    pub version: String,

    /// When to store the deployed version after an upgrade
    pub version_persistence: VersionPersistence,

    /// Build time options of the alias redirect
    pub sunrise: SunriseOptions,
}

impl Config {
    /// Read the configuration from the environment
    ///
    /// - `ADMIN_TOKEN`, generated when not set
    /// - `ADMIN_HOST`, serve the API on this host only
    /// - `BLOG_ALIAS_PERSIST_VERSION_ON_FAILURE`, store the version even after a failed upgrade
    pub fn from_env() -> Self {
        let admin_token = env_var_or_else("ADMIN_TOKEN", || {
            let admin_token = Uuid::new_v4().simple().to_string();
            tracing::info!("`ADMIN_TOKEN` is not set, generating temporary one: {admin_token}");
            admin_token
        });

        let version_persistence =
            if is_truthy(env_var("BLOG_ALIAS_PERSIST_VERSION_ON_FAILURE").as_deref()) {
                VersionPersistence::Always
            } else {
                VersionPersistence::OnSuccess
            };

        Self {
            admin_token,
            admin_host: env_var("ADMIN_HOST"),
            version: env!("CARGO_PKG_VERSION").to_string(),
            version_persistence,
            sunrise: SunriseOptions::from_build(),
        }
    }
}
