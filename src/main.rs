#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use axum::middleware;
use axum_client_ip::ClientIpSource;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::AdminToken;
use crate::config::Config;
use crate::lifecycle::AliasDomainsModel;
use crate::lifecycle::Plugin;
use crate::site::AdminHost;
use crate::site::SiteNotFoundHooks;
use crate::storage::Memory;
use crate::storage::Postgres;
use crate::storage::Storage;
use crate::sunrise::Sunrise;
use crate::utils::env_var;
use crate::utils::env_var_or_else;

mod aliases;
mod api;
mod blogs;
mod client_ip;
mod config;
mod graceful_shutdown;
mod lifecycle;
mod settings;
mod site;
mod storage;
mod sunrise;
#[cfg(test)]
mod tests;
mod utils;

const DEFAULT_RUST_LOG: &str = "blog_alias=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:7000";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app(Config::from_env()).await?;

    let address = setup_address()?;
    let listener = TcpListener::bind(address).await?;
    tracing::info!("Listening on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown::handler())
    .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Database connection
/// - Migrations
/// - Upgrade check
pub async fn setup_app(config: Config) -> Result<Router> {
    if let Some(database_url) = env_var("DATABASE_URL") {
        tracing::info!("Using Postgres storage");

        setup_app_with_storage(Postgres::connect(&database_url).await?, config).await
    } else {
        tracing::info!("`DATABASE_URL` is not set, using memory storage");

        setup_app_with_storage(Memory::new(), config).await
    }
}

/// Create and setup the app on top of a storage
///
/// Upgrades when a newer version got deployed
pub async fn setup_app_with_storage<S: Storage>(storage: S, config: Config) -> Result<Router> {
    let sunrise = Sunrise::new(storage.clone(), config.sunrise);

    let plugin = Plugin::new(
        storage.clone(),
        config.version,
        config.version_persistence,
        vec![
            Box::new(AliasDomainsModel::new(storage.clone())),
            Box::new(sunrise.clone()),
        ],
    );

    if let Some(summary) = plugin.maybe_upgrade().await? {
        for message in &summary.messages {
            tracing::info!("{message}");
        }
    }

    Ok(create_router(
        storage,
        plugin,
        SiteNotFoundHooks::new(vec![Box::new(sunrise)]),
        AdminToken::new(&config.admin_token),
        AdminHost::new(config.admin_host.as_deref()),
    ))
}

/// Create the router for Blog Alias
fn create_router<S: Storage>(
    storage: S,
    plugin: Plugin<S>,
    hooks: SiteNotFoundHooks,
    admin_token: AdminToken,
    admin_host: AdminHost,
) -> Router {
    Router::new()
        .nest("/api", api::router::<S>())
        .fallback(site::route::<S>)
        .layer(middleware::from_fn(site::guard_api::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
        .layer(Extension(Arc::new(plugin)))
        .layer(Extension(hooks))
        .layer(Extension(admin_token))
        .layer(Extension(admin_host))
        .layer(ClientIpSource::ConnectInfo.into_extension())
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Some(port) = env_var("PORT") {
        let port = port.parse::<u16>()?;

        address.set_port(port);
    }

    Ok(address)
}
