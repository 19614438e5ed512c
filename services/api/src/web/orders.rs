//! services/api/src/web/orders.rs
//!
//! Handlers for placing and listing orders.

use crate::error::{ApiError, ErrorResponse};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use lesson_booking_core::{NewOrder, Order};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Customer details; stored as given.
    #[serde(rename = "orderInfo", default)]
    #[schema(value_type = Object)]
    pub order_info: Value,
    /// Identifiers of the lessons being booked.
    #[serde(rename = "lessonId", default)]
    pub lesson_ids: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub message: String,
    #[serde(rename = "insertedId")]
    pub inserted_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct OrderBody {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "orderInfo")]
    #[schema(value_type = Object)]
    pub order_info: Value,
    #[serde(rename = "lessonId")]
    pub lesson_ids: Vec<String>,
}

impl From<Order> for OrderBody {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_info: order.order_info,
            lesson_ids: order.lesson_ids,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct OrderListResponse {
    pub message: String,
    pub count: usize,
    pub orders: Vec<OrderBody>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /order - List every order
#[utoipa::path(
    get,
    path = "/order",
    tag = "orders",
    responses(
        (status = 200, description = "All orders with their count", body = OrderListResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn list_orders_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let listing = state.orders.list().await?;
    Ok(Json(OrderListResponse {
        message: "Orders retrieved successfully".to_string(),
        count: listing.count,
        orders: listing.orders.into_iter().map(OrderBody::from).collect(),
    }))
}

/// POST /order - Place a new order
#[utoipa::path(
    post,
    path = "/order",
    tag = "orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = CreateOrderResponse),
        (status = 400, description = "Missing or invalid lesson IDs", body = ErrorResponse)
    )
)]
pub async fn create_order_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let Json(req) = payload?;
    let inserted_id = state
        .orders
        .create(NewOrder {
            order_info: req.order_info,
            lesson_ids: req.lesson_ids,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "Order placed successfully".to_string(),
            inserted_id: inserted_id.to_string(),
        }),
    ))
}
