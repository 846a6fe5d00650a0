use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::HOST;
use axum::http::header::LOCATION;
use http_body_util::BodyExt;
use serde_json::Map;
use serde_json::Value;
use tower::Service;
use uuid::Uuid;

use crate::config::Config;
use crate::lifecycle::VersionPersistence;
use crate::setup_app_with_storage;
use crate::site::X_BLOG_ID;
use crate::storage::Memory;
use crate::sunrise::SunriseOptions;
use crate::sunrise::X_REDIRECT_BY;

/// Authorization header for the admin
pub const ADMIN_TOKEN: &str = "Bearer verysecret";

/// Test helper version of Blog struct
#[derive(Debug)]
pub struct Blog {
    pub id: i64,
    pub domain: String,
    pub path: String,
    pub site_url: Option<String>,
}

/// Test helper version of AliasDomain struct
#[derive(Debug, PartialEq, Eq)]
pub struct Alias {
    pub id: Uuid,
    pub domain_alias: String,
    pub blog_id: i64,
}

/// Error response
#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    pub error: String,
    pub description: Option<String>,
}

/// Response of the site for a visitor
#[derive(Debug)]
pub struct Visit {
    pub status_code: StatusCode,
    pub location: Option<String>,
    pub redirect_by: Option<String>,
    pub blog_id: Option<String>,
    pub body: String,
}

/// Setup the Blog Alias app on memory storage
///
/// The storage is returned as well to inspect what happened
pub async fn setup_test_app() -> (Router, Memory) {
    setup_test_app_with_options(SunriseOptions::default()).await
}

/// Setup the Blog Alias app with build time options
pub async fn setup_test_app_with_options(options: SunriseOptions) -> (Router, Memory) {
    setup_test_app_with_config(options, None).await
}

/// Setup the Blog Alias app serving the API on a single host
pub async fn setup_test_app_with_admin_host(admin_host: &str) -> (Router, Memory) {
    setup_test_app_with_config(SunriseOptions::default(), Some(admin_host)).await
}

async fn setup_test_app_with_config(
    options: SunriseOptions,
    admin_host: Option<&str>,
) -> (Router, Memory) {
    let storage = Memory::new();

    let config = Config {
        admin_token: "verysecret".to_string(),
        admin_host: admin_host.map(ToString::to_string),
        version: "1.0.0".to_string(),
        version_persistence: VersionPersistence::OnSuccess,
        sunrise: options,
    };

    let app = setup_app_with_storage(storage.clone(), config)
        .await
        .unwrap();

    (app, storage)
}

/// Visit the site as a visitor would
pub async fn visit(app: &mut Router, host: &str, path: &str) -> Visit {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(HOST, host)
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();

    let status_code = response.status();
    let headers = response.headers();

    let location = get_header(headers, LOCATION);
    let redirect_by = get_header(headers, X_REDIRECT_BY);
    let blog_id = get_header(headers, X_BLOG_ID);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8_lossy(&body[..]).to_string();

    Visit {
        status_code,
        location,
        redirect_by,
        blog_id,
        body,
    }
}

fn get_header(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|header| header.to_str().unwrap().to_string())
}

/// Send a request to the API, returning the status code and body
async fn call_api(
    app: &mut Router,
    access_token: Option<&str>,
    method: Method,
    uri: &str,
    payload: Option<Value>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(access_token) = access_token {
        builder = builder.header(AUTHORIZATION, access_token);
    }

    let body = if let Some(payload) = payload {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());

        Body::from(serde_json::to_vec(&payload).unwrap())
    } else {
        Body::empty()
    };

    let response = app.call(builder.body(body).unwrap()).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status_code, body)
}

pub async fn maybe_create_blog(
    app: &mut Router,
    access_token: &str,
    domain: &str,
    path: Option<&str>,
    site_url: Option<&str>,
) -> (StatusCode, Option<Blog>, Option<String>) {
    let mut payload = Map::new();
    payload.insert("domain".to_string(), Value::String(domain.to_string()));

    if let Some(path) = path {
        payload.insert("path".to_string(), Value::String(path.to_string()));
    }

    if let Some(site_url) = site_url {
        payload.insert("siteUrl".to_string(), Value::String(site_url.to_string()));
    }

    let (status_code, body) = call_api(
        app,
        Some(access_token),
        Method::POST,
        "/api/blogs",
        Some(Value::Object(payload)),
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_blog(&body))
        } else {
            None
        },
        if status_code.is_client_error() {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

/// Create a blog on the root of a domain, it has to succeed
pub async fn create_blog(app: &mut Router, domain: &str, site_url: &str) -> Blog {
    let (status_code, blog, _) =
        maybe_create_blog(app, ADMIN_TOKEN, domain, None, Some(site_url)).await;
    assert_eq!(StatusCode::CREATED, status_code);

    blog.unwrap()
}

pub async fn single_blog(
    app: &mut Router,
    access_token: &str,
    id: i64,
) -> (StatusCode, Option<Blog>) {
    let (status_code, body) = call_api(
        app,
        Some(access_token),
        Method::GET,
        &format!("/api/blogs/{id}"),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_blog(&body))
        } else {
            None
        },
    )
}

pub async fn list_blogs(app: &mut Router, access_token: &str) -> (StatusCode, Option<Vec<Blog>>) {
    let (status_code, body) =
        call_api(app, Some(access_token), Method::GET, "/api/blogs", None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_blogs(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_create_alias(
    app: &mut Router,
    access_token: &str,
    domain_alias: &str,
    blog_id: i64,
) -> (StatusCode, Option<Alias>, Option<String>) {
    let mut payload = Map::new();
    payload.insert(
        "domainAlias".to_string(),
        Value::String(domain_alias.to_string()),
    );
    payload.insert("blogId".to_string(), Value::from(blog_id));

    let (status_code, body) = call_api(
        app,
        Some(access_token),
        Method::POST,
        "/api/aliases",
        Some(Value::Object(payload)),
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_alias(&body))
        } else {
            None
        },
        if status_code.is_client_error() {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

/// Create an alias for a blog, it has to succeed
pub async fn create_alias(app: &mut Router, domain_alias: &str, blog_id: i64) -> Alias {
    let (status_code, alias, _) =
        maybe_create_alias(app, ADMIN_TOKEN, domain_alias, blog_id).await;
    assert_eq!(StatusCode::CREATED, status_code);

    alias.unwrap()
}

pub async fn maybe_create_alias_with_raw_body(
    app: &mut Router,
    access_token: &str,
    body: &'static str,
    include_content_type: bool,
) -> (StatusCode, Option<Alias>, Option<Error>) {
    let mut builder = Request::builder().method(Method::POST).uri("/api/aliases");

    if include_content_type {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    }

    let request = builder
        .header(AUTHORIZATION, access_token)
        .body(Body::from(body.as_bytes()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_alias(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST {
            Some(get_error(&body))
        } else {
            None
        },
    )
}

pub async fn single_alias(
    app: &mut Router,
    access_token: &str,
    id: &str,
) -> (StatusCode, Option<Alias>, Option<String>) {
    let (status_code, body) = call_api(
        app,
        Some(access_token),
        Method::GET,
        &format!("/api/aliases/{id}"),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_alias(&body))
        } else {
            None
        },
        if status_code.is_client_error() {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn list_aliases(
    app: &mut Router,
    access_token: &str,
) -> (StatusCode, Option<Vec<Alias>>) {
    let (status_code, body) =
        call_api(app, Some(access_token), Method::GET, "/api/aliases", None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_aliases(&body))
        } else {
            None
        },
    )
}

pub async fn list_blog_aliases(
    app: &mut Router,
    access_token: &str,
    blog_id: i64,
) -> (StatusCode, Option<Vec<Alias>>) {
    let (status_code, body) = call_api(
        app,
        Some(access_token),
        Method::GET,
        &format!("/api/blogs/{blog_id}/aliases"),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_aliases(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_delete_alias(
    app: &mut Router,
    access_token: &str,
    id: &Uuid,
) -> (StatusCode, Option<String>) {
    let (status_code, body) = call_api(
        app,
        Some(access_token),
        Method::DELETE,
        &format!("/api/aliases/{id}"),
        None,
    )
    .await;

    (
        status_code,
        if status_code.is_client_error() {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

/// Update a setting, `uri` is relative to `/api`
pub async fn maybe_update_setting(
    app: &mut Router,
    access_token: &str,
    uri: &str,
    value: &str,
) -> (StatusCode, Option<String>) {
    let mut payload = Map::new();
    payload.insert("value".to_string(), Value::String(value.to_string()));

    let (status_code, body) = call_api(
        app,
        Some(access_token),
        Method::PUT,
        &format!("/api{uri}"),
        Some(Value::Object(payload)),
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]["value"]
                .as_str()
                .map(ToString::to_string)
        } else if status_code.is_client_error() {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

/// Update a setting, it has to succeed
pub async fn update_setting(app: &mut Router, uri: &str, value: &str) {
    let (status_code, _) = maybe_update_setting(app, ADMIN_TOKEN, uri, value).await;
    assert_eq!(StatusCode::OK, status_code);
}

/// Delete a setting, `uri` is relative to `/api`
pub async fn maybe_delete_setting(
    app: &mut Router,
    access_token: &str,
    uri: &str,
) -> (StatusCode, Option<String>) {
    let (status_code, body) = call_api(
        app,
        Some(access_token),
        Method::DELETE,
        &format!("/api{uri}"),
        None,
    )
    .await;

    (
        status_code,
        if status_code.is_client_error() {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

/// List settings, `uri` is relative to `/api`
pub async fn list_settings(
    app: &mut Router,
    access_token: &str,
    uri: &str,
) -> (StatusCode, Option<Map<String, Value>>) {
    let (status_code, body) = call_api(
        app,
        Some(access_token),
        Method::GET,
        &format!("/api{uri}"),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
                .as_object()
                .cloned()
        } else {
            None
        },
    )
}

/// Run a lifecycle action, returning the data of the response if any
pub async fn lifecycle(
    app: &mut Router,
    access_token: Option<&str>,
    action: &str,
) -> (StatusCode, Option<Value>) {
    let (status_code, body) = call_api(
        app,
        access_token,
        Method::POST,
        &format!("/api/lifecycle/{action}"),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(serde_json::from_slice::<Value>(&body[..]).unwrap()["data"].clone())
        } else {
            None
        },
    )
}

/// Activate the plugin, it has to succeed
pub async fn activate(app: &mut Router) {
    let (status_code, _) = lifecycle(app, Some(ADMIN_TOKEN), "activate").await;
    assert_eq!(StatusCode::OK, status_code);
}

pub async fn lifecycle_status(
    app: &mut Router,
    access_token: Option<&str>,
) -> (StatusCode, Option<Value>, Option<String>) {
    let (status_code, body) =
        call_api(app, access_token, Method::GET, "/api/lifecycle", None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(serde_json::from_slice::<Value>(&body[..]).unwrap()["data"].clone())
        } else {
            None
        },
        if status_code.is_client_error() {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

fn value_to_blog(blog: &Map<String, Value>) -> Blog {
    Blog {
        id: blog["id"].as_i64().unwrap(),
        domain: blog["domain"].as_str().map(ToString::to_string).unwrap(),
        path: blog["path"].as_str().map(ToString::to_string).unwrap(),
        site_url: blog
            .get("siteUrl")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}

fn get_blog(body: &Bytes) -> Blog {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_blog)
        .unwrap()
}

fn get_blogs(body: &Bytes) -> Vec<Blog> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_object().unwrap())
        .map(value_to_blog)
        .collect()
}

fn value_to_alias(alias: &Map<String, Value>) -> Alias {
    Alias {
        id: alias["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        domain_alias: alias["domainAlias"]
            .as_str()
            .map(ToString::to_string)
            .unwrap(),
        blog_id: alias["blogId"].as_i64().unwrap(),
    }
}

fn get_alias(body: &Bytes) -> Alias {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_alias)
        .unwrap()
}

fn get_aliases(body: &Bytes) -> Vec<Alias> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_object().unwrap())
        .map(value_to_alias)
        .collect()
}

fn value_to_error(error: &Map<String, Value>) -> Error {
    Error {
        error: error["error"].as_str().map(ToString::to_string).unwrap(),
        description: error
            .get("description")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}

fn get_error(body: &Bytes) -> Error {
    serde_json::from_slice::<Value>(&body[..])
        .unwrap()
        .as_object()
        .map(value_to_error)
        .unwrap()
}

fn get_error_message(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["error"]
        .as_str()
        .map(ToString::to_string)
        .unwrap()
}
