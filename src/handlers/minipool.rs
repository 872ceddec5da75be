use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::collector::{CollectError, MinipoolCollector};
use crate::formatter::JsonFormatter;
use crate::formatter::json::{
    ActiveMinipoolsJson, MinipoolDetailsJson, MinipoolStatusJson, ResponseJson,
};

type ApiError = (StatusCode, Json<ResponseJson<()>>);
type ApiResult<T> = Result<Json<ResponseJson<T>>, ApiError>;

pub async fn minipool_details(
    State(collector): State<Arc<MinipoolCollector>>,
    Path(address): Path<String>,
) -> ApiResult<MinipoolDetailsJson> {
    let address = parse_address(&address)?;
    let details = collector.details(address).await.map_err(upstream)?;
    Ok(Json(JsonFormatter::success(JsonFormatter::format_details(
        &details,
    ))))
}

pub async fn minipool_status(
    State(collector): State<Arc<MinipoolCollector>>,
    Path(address): Path<String>,
) -> ApiResult<MinipoolStatusJson> {
    let address = parse_address(&address)?;
    let status = collector.status(address).await.map_err(upstream)?;
    Ok(Json(JsonFormatter::success(JsonFormatter::format_status(
        &status,
    ))))
}

pub async fn active_minipools(
    State(collector): State<Arc<MinipoolCollector>>,
) -> ApiResult<ActiveMinipoolsJson> {
    let active = collector
        .active_by_validator_pubkey()
        .await
        .map_err(upstream)?;
    Ok(Json(JsonFormatter::success(JsonFormatter::format_active(
        &active,
    ))))
}

fn parse_address(raw: &str) -> Result<Address, ApiError> {
    Address::from_str(raw.trim()).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(JsonFormatter::failure(&format!("Invalid minipool address: {e}"))),
        )
    })
}

fn upstream(err: CollectError) -> ApiError {
    let status = if err.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(JsonFormatter::failure(&err)))
}
