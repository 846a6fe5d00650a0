//! Lifecycle of the plugin
//!
//! Activation, deactivation, upgrades and uninstallation are dispatched to a fixed, ordered list
//! of components. The upgrade runs whenever the deployed version is newer than the stored one.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::Serialize;

use crate::settings::Settings;
use crate::settings::VERSION;
use crate::storage::Result;
use crate::storage::Storage;

/// Result of upgrading a single component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeResult {
    /// Did the upgrade succeed?
    pub success: bool,

    /// Human readable outcome
    pub message: String,
}

impl UpgradeResult {
    /// Successful upgrade
    pub fn ok<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            success: true,
            message: message.to_string(),
        }
    }

    /// Failed upgrade
    pub fn failed<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

/// Aggregated result of upgrading all components
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeSummary {
    /// Did all components upgrade successfully?
    pub success: bool,

    /// Messages of all components, in order
    pub messages: Vec<String>,
}

/// A part of the plugin with its own setup and teardown
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Name for logging
    fn name(&self) -> &'static str;

    /// Plugin got activated
    async fn activate(&self) -> Result<()>;

    /// Plugin got deactivated
    async fn deactivate(&self) -> Result<()>;

    /// A newer version got deployed
    ///
    /// No stored version means a fresh install
    async fn upgrade(&self, new_version: &str, old_version: Option<&str>) -> UpgradeResult;

    /// Plugin gets removed, clean up everything
    async fn uninstall(&self) -> Result<()>;
}

/// When to store the deployed version after an upgrade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionPersistence {
    /// Only when all components upgraded successfully, failed upgrades are retried
    #[default]
    OnSuccess,

    /// Regardless of the upgrade result
    Always,
}

/// Coordinator of the lifecycle of all components
pub struct Plugin<S: Storage> {
    /// Storage of the stored version
    storage: S,

    /// The deployed version
    version: String,

    /// When to store the deployed version
    persistence: VersionPersistence,

    /// All components, in order of dispatching
    components: Vec<Box<dyn Lifecycle>>,
}

impl<S: Storage> Plugin<S> {
    /// Create the coordinator with its components
    pub fn new<V>(
        storage: S,
        version: V,
        persistence: VersionPersistence,
        components: Vec<Box<dyn Lifecycle>>,
    ) -> Self
    where
        V: Into<String>,
    {
        Self {
            storage,
            version: version.into(),
            persistence,
            components,
        }
    }

    /// The deployed version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// When the deployed version is stored
    pub fn persistence(&self) -> VersionPersistence {
        self.persistence
    }

    /// The version the last upgrade ran for
    pub async fn stored_version(&self) -> Result<Option<String>> {
        Settings::network(&self.storage).get(VERSION).await
    }

    /// Upgrade when the deployed version is newer than the stored version
    pub async fn maybe_upgrade(&self) -> Result<Option<UpgradeSummary>> {
        let settings = Settings::network(&self.storage);

        let old_version = settings.get(VERSION).await?;

        if !is_newer(&self.version, old_version.as_deref()) {
            tracing::debug!("Version {} is up to date", self.version);

            return Ok(None);
        }

        tracing::info!(
            "Upgrading from {} to {}",
            old_version.as_deref().unwrap_or("nothing"),
            self.version
        );

        let summary = self.upgrade(&self.version, old_version.as_deref()).await;

        if summary.success || self.persistence == VersionPersistence::Always {
            settings.set(VERSION, &self.version).await?;
        } else {
            tracing::warn!(
                "Upgrade to {} failed, keeping stored version for a retry",
                self.version
            );
        }

        Ok(Some(summary))
    }

    /// Upgrade all components
    ///
    /// Every component is upgraded, failures do not stop the others
    pub async fn upgrade(&self, new_version: &str, old_version: Option<&str>) -> UpgradeSummary {
        let mut summary = UpgradeSummary {
            success: true,
            messages: Vec::with_capacity(self.components.len()),
        };

        for component in &self.components {
            let result = component.upgrade(new_version, old_version).await;

            if result.success {
                tracing::debug!("Upgraded {}: {}", component.name(), result.message);
            } else {
                tracing::warn!("Could not upgrade {}: {}", component.name(), result.message);
            }

            summary.success &= result.success;
            summary.messages.push(result.message);
        }

        summary
    }

    /// Activate all components, upgrading first when needed
    pub async fn activate(&self) -> Result<Option<UpgradeSummary>> {
        let summary = self.maybe_upgrade().await?;

        for component in &self.components {
            component.activate().await?;
        }

        tracing::info!("Activated {}", self.version);

        Ok(summary)
    }

    /// Deactivate all components
    pub async fn deactivate(&self) -> Result<()> {
        for component in &self.components {
            component.deactivate().await?;
        }

        tracing::info!("Deactivated {}", self.version);

        Ok(())
    }

    /// Uninstall all components and forget the stored version
    pub async fn uninstall(&self) -> Result<()> {
        for component in &self.components {
            component.uninstall().await?;
        }

        Settings::network(&self.storage).delete(VERSION).await?;

        tracing::info!("Uninstalled {}", self.version);

        Ok(())
    }
}

/// The alias domains model: the storage of the aliases
pub struct AliasDomainsModel<S: Storage> {
    /// Storage of the aliases
    storage: S,
}

impl<S: Storage> AliasDomainsModel<S> {
    /// Create the model component
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: Storage> Lifecycle for AliasDomainsModel<S> {
    fn name(&self) -> &'static str {
        "alias domains"
    }

    async fn activate(&self) -> Result<()> {
        self.storage.install().await
    }

    async fn deactivate(&self) -> Result<()> {
        Ok(())
    }

    async fn upgrade(&self, new_version: &str, _old_version: Option<&str>) -> UpgradeResult {
        match self.storage.install().await {
            Ok(()) => UpgradeResult::ok(format!("Alias domains ready for {new_version}")),
            Err(err) => UpgradeResult::failed(format!("Alias domains not upgraded: {err}")),
        }
    }

    async fn uninstall(&self) -> Result<()> {
        self.storage.delete_all_aliases().await
    }
}

/// Is the new version newer than the old version?
///
/// Anything is newer than no version at all
pub fn is_newer(new_version: &str, old_version: Option<&str>) -> bool {
    match old_version.map(str::trim).filter(|old| !old.is_empty()) {
        None => !new_version.trim().is_empty(),
        Some(old_version) => compare_versions(new_version, old_version) == Ordering::Greater,
    }
}

/// Compare two versions
///
/// Numeric release segments are compared one by one, missing segments count as `0`. A
/// pre-release (`1.0.0-beta`) comes before its release, build metadata (`+build`) is ignored.
/// Pre-releases are compared by their dot-separated identifiers.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let (left_release, left_pre_release) = split_version(left);
    let (right_release, right_pre_release) = split_version(right);

    let segments = left_release.len().max(right_release.len());

    for index in 0..segments {
        let left_segment = left_release.get(index).copied().unwrap_or(0);
        let right_segment = right_release.get(index).copied().unwrap_or(0);

        match left_segment.cmp(&right_segment) {
            Ordering::Equal => {}
            ordering => return ordering,
        }
    }

    match (left_pre_release, right_pre_release) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => compare_pre_releases(left, right),
    }
}

/// Compare two pre-releases identifier by identifier
///
/// Numeric identifiers are compared as numbers and come before alphanumeric ones, which are
/// compared as text. When all shared identifiers are equal, the longer pre-release wins:
/// `alpha < alpha.1 < alpha.beta < beta < beta.2 < beta.10 < rc.1`.
fn compare_pre_releases(left: &str, right: &str) -> Ordering {
    let mut left_identifiers = left.split('.');
    let mut right_identifiers = right.split('.');

    loop {
        let ordering = match (left_identifiers.next(), right_identifiers.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(left), Some(right)) => {
                match (left.parse::<u64>(), right.parse::<u64>()) {
                    (Ok(left), Ok(right)) => left.cmp(&right),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => left.cmp(right),
                }
            }
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

/// Split a version in numeric release segments and an optional pre-release
fn split_version(version: &str) -> (Vec<u64>, Option<&str>) {
    let version = version.trim().trim_start_matches('v');
    let version = version.split_once('+').map_or(version, |(version, _build)| version);

    let (release, pre_release) = match version.split_once('-') {
        Some((release, pre_release)) => (release, Some(pre_release)),
        None => (version, None),
    };

    let release = release
        .split('.')
        .map(|segment| segment.parse::<u64>().unwrap_or(0))
        .collect();

    (release, pre_release)
}
