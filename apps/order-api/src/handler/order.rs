//! # 注文作成 API ハンドラ
//!
//! ## エンドポイント
//!
//! ```text
//! POST /v1/orders
//! ```
//!
//! 初回作成は 201、冪等キーによるリプレイは 200 を返す。

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::IntoResponse,
};
use hanko_domain::order::request::CreateOrderRequest;
use serde::Serialize;

use super::decode_json_body;
use crate::{
    error::ApiError,
    usecase::{CreateOrderOutcome, OrderUseCaseImpl},
};

/// 注文ハンドラーの State
pub struct OrderState {
    pub usecase: OrderUseCaseImpl,
}

/// 注文作成レスポンス
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id:           String,
    pub order_no:           String,
    pub status:             String,
    pub payment_status:     String,
    pub fulfillment_status: String,
    pub pricing:            PricingDto,
    pub idempotent_replay:  bool,
}

#[derive(Debug, Serialize)]
pub struct PricingDto {
    pub total_jpy: i64,
    pub currency:  String,
}

impl From<CreateOrderOutcome> for CreateOrderResponse {
    fn from(outcome: CreateOrderOutcome) -> Self {
        let summary = outcome.summary;
        Self {
            order_id:           summary.order_id,
            order_no:           summary.order_no,
            status:             summary.status,
            payment_status:     summary.payment_status,
            fulfillment_status: summary.fulfillment_status,
            pricing:            PricingDto {
                total_jpy: summary.total_jpy,
                currency:  summary.currency,
            },
            idempotent_replay:  outcome.idempotent_replay,
        }
    }
}

/// 注文を作成する
///
/// ## エンドポイント
/// POST /v1/orders
#[tracing::instrument(skip_all)]
pub async fn create_order(
    State(state): State<Arc<OrderState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body = body.map_err(|e| ApiError::InvalidJson(format!("invalid JSON: {e}")))?;
    let request: CreateOrderRequest = decode_json_body(&body)?;
    let input = request.validate()?;

    let outcome = state.usecase.create_order(&input).await?;

    let status = if outcome.idempotent_replay {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(CreateOrderResponse::from(outcome))))
}
