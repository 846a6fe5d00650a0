//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;

pub use admin_token::Admin;
pub use admin_token::AdminToken;
pub use request::Form;
pub use request::PathParameters;
pub use request::parse_domain;
pub use request::parse_url;
pub use response::Error;
pub use response::Success;

use crate::storage::Storage;

mod admin_token;
mod aliases;
mod blogs;
mod lifecycle;
mod request;
mod response;
mod settings;
mod utils;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let blogs = Router::new()
        .route("/", get(blogs::list::<S>))
        .route("/", post(blogs::create::<S>))
        .route("/{blog}", get(blogs::single::<S>))
        .route("/{blog}/aliases", get(aliases::list_by_blog::<S>))
        .route("/{blog}/settings", get(settings::list_blog::<S>))
        .route("/{blog}/settings/{key}", put(settings::update_blog::<S>))
        .route("/{blog}/settings/{key}", delete(settings::delete_blog::<S>));

    let aliases = Router::new()
        .route("/", get(aliases::list::<S>))
        .route("/", post(aliases::create::<S>))
        .route("/{alias}", get(aliases::single::<S>))
        .route("/{alias}", delete(aliases::delete::<S>));

    let settings = Router::new()
        .route("/", get(settings::list_network::<S>))
        .route("/{key}", put(settings::update_network::<S>))
        .route("/{key}", delete(settings::delete_network::<S>));

    let lifecycle = Router::new()
        .route("/", get(lifecycle::status::<S>))
        .route("/activate", post(lifecycle::activate::<S>))
        .route("/deactivate", post(lifecycle::deactivate::<S>))
        .route("/upgrade", post(lifecycle::upgrade::<S>))
        .route("/uninstall", post(lifecycle::uninstall::<S>));

    Router::new()
        .nest("/blogs", blogs)
        .nest("/aliases", aliases)
        .nest("/settings", settings)
        .nest("/lifecycle", lifecycle)
}
