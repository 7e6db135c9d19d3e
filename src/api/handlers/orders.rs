use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::net::SocketAddr;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{CreateOrderRequest, CreateOrderResponse};
use crate::model::{Order, RoutingStrategy};

pub async fn submit_order(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    state
        .rate_limiter
        .check(&addr.ip().to_string())
        .await
        .map_err(ApiError::RateLimited)?;

    let errors = req.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let mut warnings = Vec::new();
    let routing_strategy = match req.routing_strategy.as_deref() {
        Some(raw) => {
            let (strategy, warning) = RoutingStrategy::parse_lenient(raw);
            warnings.extend(warning);
            strategy
        }
        None => RoutingStrategy::default(),
    };

    let order = Order::new(req.token_in.clone(), req.token_out.clone(), req.amount_in, routing_strategy);
    let preferences = req.preferences();

    let order_id = state.scheduler.submit_order(order, preferences).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateOrderResponse { order_id, status: "pending", routing_strategy, warnings }),
    ))
}

pub async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>, ApiError> {
    let order = state
        .repository
        .get_order_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order '{id}'")))?;
    Ok(Json(order))
}

pub async fn list_orders(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<ListParams>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let limit = params.limit.unwrap_or(50).min(200);
    let offset = params.offset.unwrap_or(0);
    let orders = state.repository.get_orders(limit, offset).await?;
    Ok(Json(orders))
}

#[derive(Debug, serde::Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}
