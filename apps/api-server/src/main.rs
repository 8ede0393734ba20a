//! api-server — HTTP API for the catalog service.
//!
//! Exposes CRUD over the `/items` resource and translates requests into
//! repository calls. Storage is selected at startup:
//! - In-memory (default): isolated per-process store for local dev and tests.
//! - DynamoDB: enabled via `STORAGE_PROVIDER=dynamo` (requires the `dynamo`
//!   feature and `DYNAMO_TABLE_ITEMS`; `DYNAMO_ENDPOINT_HOST`/`_PORT` point
//!   at a local store).
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # against DynamoDB Local
//! STORAGE_PROVIDER=dynamo \
//! DYNAMO_TABLE_ITEMS=items \
//! DYNAMO_ENDPOINT_HOST=localhost DYNAMO_ENDPOINT_PORT=8000 \
//!   cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use domain::adapters::memory_repo::InMemoryRepo;
use domain::{validate, Clock, CoreError, Item, ItemId, ItemRepository, NewItem};
use serde::{Deserialize, Serialize};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

#[derive(Clone)]
struct AppState {
    repo: Arc<dyn ItemRepository>,
    clock: StdClock,
}

#[derive(Clone)]
struct StdClock;
impl Clock for StdClock {
    fn now(&self) -> std::time::SystemTime {
        std::time::SystemTime::now()
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_volatile();

    let state = AppState {
        repo: build_repo(&cfg),
        clock: StdClock,
    };

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let app = routes(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(%addr, "api-server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind port");
    axum::serve(listener, app).await.expect("server error");
}

fn routes(state: AppState) -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .with_state(state)
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct the repository instance based on config and feature flags. The
// handlers only ever see the trait.
fn build_repo(cfg: &config::Config) -> Arc<dyn ItemRepository> {
    match cfg.storage_provider {
        #[cfg(feature = "dynamo")]
        config::StorageProvider::Dynamo => match aws_dynamo::DynamoItemsRepo::from_env() {
            Ok(r) => Arc::new(r),
            Err(e) => {
                eprintln!("failed to init DynamoItemsRepo from env: {e}");
                Arc::new(InMemoryRepo::new())
            }
        },
        _ => Arc::new(InMemoryRepo::new()),
    }
}

#[derive(Deserialize)]
struct CreateItemReq {
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: f64,
}

#[derive(Deserialize)]
struct UpdateItemReq {
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: f64,
}

#[derive(Serialize)]
struct ItemOut {
    id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    price: f64,
    created_date: String,
}

fn item_to_out(item: Item) -> ItemOut {
    ItemOut {
        id: item.id.as_str().to_string(),
        name: item.name,
        description: item.description,
        price: item.price,
        created_date: http_common::system_time_to_rfc3339(item.created_date),
    }
}

async fn list_items(State(state): State<AppState>) -> impl IntoResponse {
    match state.repo.list() {
        Ok(items) => {
            let out: Vec<ItemOut> = items.into_iter().map(item_to_out).collect();
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => {
            error!(err = ?e, "list error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response()
        }
    }
}

async fn get_item(State(state): State<AppState>, Path(id_str): Path<String>) -> impl IntoResponse {
    let id = match ItemId::new(id_str) {
        Ok(id) => id,
        Err(_) => {
            warn!("bad id in path");
            return (
                StatusCode::BAD_REQUEST,
                Json(http_common::json_err("invalid_id")),
            )
                .into_response();
        }
    };

    match state.repo.get(&id) {
        Ok(Some(item)) => {
            info!(id = %id.as_str(), "get ok");
            (StatusCode::OK, Json(item_to_out(item))).into_response()
        }
        Ok(None) => {
            warn!(id = %id.as_str(), "get 404");
            (
                StatusCode::NOT_FOUND,
                Json(http_common::json_err("not_found")),
            )
                .into_response()
        }
        Err(e) => {
            error!(id = %id.as_str(), err = ?e, "get error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response()
        }
    }
}

async fn create_item(
    State(state): State<AppState>,
    Json(body): Json<CreateItemReq>,
) -> impl IntoResponse {
    let input = NewItem {
        name: body.name,
        description: body.description,
        price: body.price,
    };
    if let Err(e) = validate::validate_new_item(&input) {
        return (
            StatusCode::BAD_REQUEST,
            Json(http_common::json_error_with_message(
                "invalid_request",
                &format!("{}", e),
            )),
        )
            .into_response();
    }

    // Server-assigned fields: fresh id, creation instant from the clock
    let id = match ItemId::new(Uuid::new_v4().to_string()) {
        Ok(id) => id,
        Err(e) => {
            error!(err = ?e, "id mint error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response();
        }
    };
    let item = Item::new(id, input, state.clock.now());

    match state.repo.create(item.clone()) {
        Ok(()) => {
            info!(id = %item.id.as_str(), "create ok");
            let location = format!("/items/{}", item.id.as_str());
            (
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(item_to_out(item)),
            )
                .into_response()
        }
        Err(CoreError::AlreadyExists) => (
            StatusCode::CONFLICT,
            Json(http_common::json_err("conflict")),
        )
            .into_response(),
        Err(e) => {
            error!(err = ?e, "create error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response()
        }
    }
}

async fn update_item(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<UpdateItemReq>,
) -> impl IntoResponse {
    let id = match ItemId::new(id_str) {
        Ok(id) => id,
        Err(_) => {
            warn!("bad id in path");
            return (
                StatusCode::BAD_REQUEST,
                Json(http_common::json_err("invalid_id")),
            )
                .into_response();
        }
    };

    // Existence check and write are two repository calls; concurrent updates
    // to the same id are last-write-wins.
    let existing = match state.repo.get(&id) {
        Ok(Some(item)) => item,
        Ok(None) => {
            warn!(id = %id.as_str(), "update 404");
            return (
                StatusCode::NOT_FOUND,
                Json(http_common::json_err("not_found")),
            )
                .into_response();
        }
        Err(e) => {
            error!(id = %id.as_str(), err = ?e, "get error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response();
        }
    };

    let input = NewItem {
        name: body.name,
        description: body.description,
        price: body.price,
    };
    if let Err(e) = validate::validate_new_item(&input) {
        return (
            StatusCode::BAD_REQUEST,
            Json(http_common::json_error_with_message(
                "invalid_request",
                &format!("{}", e),
            )),
        )
            .into_response();
    }

    let item = existing.replaced_with(input);
    match state.repo.update(&item) {
        Ok(()) => {
            info!(id = %id.as_str(), "update ok");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(CoreError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(http_common::json_err("not_found")),
        )
            .into_response(),
        Err(e) => {
            error!(id = %id.as_str(), err = ?e, "update error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response()
        }
    }
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> impl IntoResponse {
    let id = match ItemId::new(id_str) {
        Ok(id) => id,
        Err(_) => {
            warn!("bad id in path");
            return (
                StatusCode::BAD_REQUEST,
                Json(http_common::json_err("invalid_id")),
            )
                .into_response();
        }
    };

    match state.repo.get(&id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!(id = %id.as_str(), "delete 404");
            return (
                StatusCode::NOT_FOUND,
                Json(http_common::json_err("not_found")),
            )
                .into_response();
        }
        Err(e) => {
            error!(id = %id.as_str(), err = ?e, "get error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response();
        }
    }

    match state.repo.delete(&id) {
        Ok(()) => {
            info!(id = %id.as_str(), "delete ok");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(CoreError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(http_common::json_err("not_found")),
        )
            .into_response(),
        Err(e) => {
            error!(id = %id.as_str(), err = ?e, "delete error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response()
        }
    }
}
