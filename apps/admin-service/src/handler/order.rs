//! # 注文管理 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /admin/orders?status=&country=&email=`: 注文一覧（作成日時の降順）
//! - `GET /admin/orders/{id}`: 注文詳細（イベントは新しい順）
//! - `PATCH /admin/orders/{id}/status`: ステータス変更
//! - `PATCH /admin/orders/{id}/shipping`: 出荷登録

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::BytesRejection},
    response::IntoResponse,
};
use serde::Serialize;

use super::decode_json_body;
use crate::{
    error::AdminError,
    usecase::{AdminOrderUseCaseImpl, OrderFilter, OrderListItem, ShippingUpdate, StatusUpdate},
};

/// 注文管理ハンドラーの State
pub struct OrderState {
    pub usecase: AdminOrderUseCaseImpl,
}

/// 注文一覧レスポンス
#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderListItem>,
}

/// 注文一覧を取得する
#[tracing::instrument(skip_all)]
pub async fn list_orders(
    State(state): State<Arc<OrderState>>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AdminError> {
    let orders = state.usecase.list_orders(&filter).await?;
    Ok(Json(OrderListResponse { orders }))
}

/// 注文詳細を取得する
#[tracing::instrument(skip_all, fields(order_id = %order_id))]
pub async fn get_order(
    State(state): State<Arc<OrderState>>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AdminError> {
    let detail = state.usecase.get_order_detail(&order_id).await?;
    Ok(Json(detail))
}

/// 注文のステータスを変更する
///
/// 成功時は更新後の注文詳細を返す。
#[tracing::instrument(skip_all, fields(order_id = %order_id))]
pub async fn update_order_status(
    State(state): State<Arc<OrderState>>,
    Path(order_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AdminError> {
    let update: StatusUpdate = decode_json_body(body)?;
    let detail = state.usecase.update_status(&order_id, &update).await?;
    Ok(Json(detail))
}

/// 出荷情報を登録する
#[tracing::instrument(skip_all, fields(order_id = %order_id))]
pub async fn update_order_shipping(
    State(state): State<Arc<OrderState>>,
    Path(order_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AdminError> {
    let update: ShippingUpdate = decode_json_body(body)?;
    let detail = state.usecase.update_shipping(&order_id, &update).await?;
    Ok(Json(detail))
}
