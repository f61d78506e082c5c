//! # 材質管理 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /admin/materials`: 材質一覧（無効化されたものも含む）
//! - `POST /admin/materials`: 材質の作成
//! - `GET /admin/materials/{key}`: 編集用の材質詳細
//! - `PATCH /admin/materials/{key}`: 材質の編集
//! - `DELETE /admin/materials/{key}`: 材質の削除

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::StatusCode,
    response::IntoResponse,
};
use hanko_domain::catalog::{MaterialCreateInput, MaterialPatchInput};
use serde::Serialize;

use super::decode_json_body;
use crate::{
    error::AdminError,
    usecase::{AdminMaterialUseCaseImpl, MaterialListItem},
};

/// 材質管理ハンドラーの State
pub struct MaterialState {
    pub usecase: AdminMaterialUseCaseImpl,
}

/// 材質一覧レスポンス
#[derive(Debug, Serialize)]
pub struct MaterialListResponse {
    pub materials: Vec<MaterialListItem>,
}

#[tracing::instrument(skip_all)]
pub async fn list_materials(
    State(state): State<Arc<MaterialState>>,
) -> Result<impl IntoResponse, AdminError> {
    let materials = state.usecase.list_materials().await?;
    Ok(Json(MaterialListResponse { materials }))
}

/// 材質を作成する
///
/// 作成した材質の詳細を `201 Created` で返す。
#[tracing::instrument(skip_all)]
pub async fn create_material(
    State(state): State<Arc<MaterialState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AdminError> {
    let input: MaterialCreateInput = decode_json_body(body)?;
    let detail = state.usecase.create_material(input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[tracing::instrument(skip_all, fields(material_key = %key))]
pub async fn get_material(
    State(state): State<Arc<MaterialState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AdminError> {
    let detail = state.usecase.get_material_detail(&key).await?;
    Ok(Json(detail))
}

/// 材質を編集する
///
/// 未指定の項目は空文字・0・`false` として検証する。
#[tracing::instrument(skip_all, fields(material_key = %key))]
pub async fn update_material(
    State(state): State<Arc<MaterialState>>,
    Path(key): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AdminError> {
    let input: MaterialPatchInput = decode_json_body(body)?;
    let detail = state.usecase.update_material(&key, input).await?;
    Ok(Json(detail))
}

#[tracing::instrument(skip_all, fields(material_key = %key))]
pub async fn delete_material(
    State(state): State<Arc<MaterialState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AdminError> {
    state.usecase.delete_material(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
