//! # ヘルスチェック共通型
//!
//! 注文 API（`/healthz`）と管理画面バックエンド（`/health`）の
//! ヘルスチェックエンドポイントで使用される共通レスポンス型を提供する。

use serde::Serialize;

/// ヘルスチェックレスポンス
///
/// ## 使用例
///
/// ```
/// use hanko_shared::HealthResponse;
///
/// let response = HealthResponse::ok();
/// assert!(response.ok);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// 稼働中なら `true`
    pub ok: bool,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
