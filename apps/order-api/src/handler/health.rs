//! # ヘルスチェックハンドラ
//!
//! ## エンドポイント
//!
//! ```text
//! GET /healthz
//! ```
//!
//! ## レスポンス例
//!
//! ```json
//! {"ok": true}
//! ```

use axum::Json;
use hanko_shared::HealthResponse;

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
