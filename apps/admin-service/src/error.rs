//! # 管理画面エラー定義
//!
//! 管理画面固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! 検証エラー・遷移エラー・保存失敗のメッセージは、オペレーターがそのまま読める文言で返す。
//! 保存失敗はメモリ上の変更を破棄したうえで返る。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hanko_domain::DomainError;
use hanko_infra::{InfraError, error::InfraErrorKind};
use hanko_shared::{
    ErrorResponse,
    event_log::error::{category, kind},
};
use thiserror::Error;

/// 注文が見つからないときのメッセージ
pub const ORDER_NOT_FOUND: &str = "注文が見つかりません。";

/// 材質が見つからないときのメッセージ
pub const MATERIAL_NOT_FOUND: &str = "材質が見つかりません。";

pub const MATERIAL_KEY_DUPLICATED: &str = "同じ材質キーは既に存在します。";

pub const MATERIAL_KEY_INVALID: &str = "材質キーが不正です。";

/// 管理画面で発生するエラー
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    NotFound(&'static str),

    /// 同じキーが既にある
    #[error("{0}")]
    Conflict(&'static str),

    /// 入力値の検証失敗
    #[error("{0}")]
    Validation(String),

    /// ステータス遷移表にない遷移
    #[error("{0}")]
    InvalidTransition(String),

    /// リクエストボディが JSON として不正
    #[error("{0}")]
    InvalidJson(String),

    /// 更新の保存に失敗し、スナップショットを読み直した
    #[error("store update failed: {0}")]
    Persistence(String),

    /// ドキュメントストアのエラー（読み込み）
    #[error("ストアエラー: {0}")]
    Store(InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl AdminError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::InvalidTransition(_) => (StatusCode::BAD_REQUEST, "invalid_transition"),
            Self::InvalidJson(_) => (StatusCode::BAD_REQUEST, "invalid_json"),
            Self::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_update_failed"),
            Self::Store(_) | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<InfraError> for AdminError {
    fn from(err: InfraError) -> Self {
        Self::Store(err)
    }
}

impl From<DomainError> for AdminError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            err @ DomainError::InvalidTransition { .. } => Self::InvalidTransition(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = match &self {
            Self::Store(e) => {
                let error_kind = match e.kind() {
                    InfraErrorKind::Timeout { .. } => kind::TIMEOUT,
                    _ => kind::DATABASE,
                };
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = error_kind,
                    span_trace = %e.span_trace(),
                    "ストアエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            Self::Internal(msg) => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::INTERNAL,
                    "内部エラー: {}",
                    msg
                );
                ErrorResponse::internal_error()
            }
            other => ErrorResponse::new(code, other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
