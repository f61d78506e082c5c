//! 未定義のパスとメソッドに対するフォールバック

use axum::{Json, http::StatusCode};
use hanko_shared::ErrorResponse;

/// 未定義のパス
pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::not_found()))
}

/// 定義済みのパスに対する未対応のメソッド
pub async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::method_not_allowed()),
    )
}
