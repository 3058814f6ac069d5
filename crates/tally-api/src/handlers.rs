//! HTTP request handlers for the Record API.
//!
//! Five order endpoints plus a health check. Errors are reported as
//! `{"detail": "..."}` with a matching status code; successful mutations answer
//! with `{"message": "..."}`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tally_domain::{InsertOutcome, Order, OrderPatch, RecordStore};
use tally_store::{SqliteStore, StoreError};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The record store, one connection shared by every request
    pub store: Arc<Mutex<SqliteStore>>,
}

impl AppState {
    /// Wrap a store for sharing between handlers
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, SqliteStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("store lock poisoned".to_string()))
    }
}

/// Successful mutation response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// What happened
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub detail: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Number of stored orders
    pub orders: usize,
}

/// Application error type
#[derive(Debug)]
pub enum ApiError {
    /// No order with the requested id
    NotFound,
    /// An order with the id in the body already exists
    AlreadyExists,
    /// The request body could not be used
    BadRequest(String),
    /// Store failure
    Store(StoreError),
    /// Internal server error
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Order not found".to_string()),
            ApiError::AlreadyExists => {
                (StatusCode::BAD_REQUEST, "Order already exists".to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Store(e) => {
                error!("Store failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// GET /orders - All orders
async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.store()?.list_orders()?;
    Ok(Json(orders))
}

/// GET /order/:order_id - One order
async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = state.store()?.get_order(&order_id)?;
    order.map(Json).ok_or(ApiError::NotFound)
}

/// POST /order - Create an order without line items
async fn create_order(
    State(state): State<AppState>,
    body: Result<Json<Order>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(order) = body?;
    if order.order_id.trim().is_empty() {
        return Err(ApiError::BadRequest("order_id must not be empty".to_string()));
    }

    match state.store()?.create_order(&order)? {
        InsertOutcome::Inserted => {
            info!("Order {} created via API", order.order_id);
            Ok((StatusCode::CREATED, MessageResponse::new("Order created")))
        }
        InsertOutcome::Duplicate => Err(ApiError::AlreadyExists),
    }
}

/// PATCH /order/:order_id - Update the fields present in the body
async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    body: Result<Json<OrderPatch>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(patch) = body?;
    if state.store()?.update_order(&order_id, &patch)? {
        info!("Order {} updated via API", order_id);
        Ok(MessageResponse::new("Order updated"))
    } else {
        Err(ApiError::NotFound)
    }
}

/// DELETE /order/:order_id - Remove an order and its line items
async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.store()?.delete_order(&order_id)? {
        info!("Order {} deleted via API", order_id);
        Ok(MessageResponse::new("Order deleted"))
    } else {
        Err(ApiError::NotFound)
    }
}

/// GET /health - Liveness plus a store round-trip
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthCheckResponse>, ApiError> {
    let orders = state.store()?.list_orders()?.len();
    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
        orders,
    }))
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/order", axum::routing::post(create_order))
        .route(
            "/order/:order_id",
            get(get_order).patch(update_order).delete(delete_order),
        )
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
