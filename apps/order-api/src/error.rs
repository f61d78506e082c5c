//! # 注文 API エラー定義
//!
//! 注文 API 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! レスポンスは常に `{"error": {"code", "message"}}` の形で、
//! 500 の場合は内部の詳細を返さずログにのみ残す。

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

/// 注文 API で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// カタログ取得で対応外のロケールが指定された
    #[error("unsupported locale")]
    InvalidLocale,

    /// 注文のロケールが対応外
    #[error("unsupported locale")]
    UnsupportedLocale,

    /// 注文が存在しない書体・材質・配送国を参照した
    #[error("{0}")]
    InvalidReference(String),

    /// 注文が無効化された書体・材質・配送国を参照した
    #[error("{0}")]
    InactiveReference(String),

    /// 同じ冪等キーで異なる内容が送られた
    #[error("idempotency key is already used with different payload")]
    IdempotencyConflict,

    /// 入力値の検証失敗
    #[error("{0}")]
    Validation(String),

    /// リクエストボディが JSON として不正
    #[error("{0}")]
    InvalidJson(String),

    /// Webhook の署名検証失敗
    #[error("{0}")]
    InvalidSignature(String),

    /// Webhook の本文が不正
    #[error("{0}")]
    InvalidPayload(String),

    /// リクエストボディを読み取れない
    #[error("{0}")]
    InvalidRequest(String),

    /// ドキュメントストアのエラー
    #[error("ストアエラー: {0}")]
    Store(InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl ApiError {
    /// やり直しで解消しうるエラーか（ストアの同時作成競合）
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidLocale => (StatusCode::BAD_REQUEST, "invalid_locale"),
            Self::UnsupportedLocale => (StatusCode::BAD_REQUEST, "unsupported_locale"),
            Self::InvalidReference(_) => (StatusCode::BAD_REQUEST, "invalid_reference"),
            Self::InactiveReference(_) => (StatusCode::BAD_REQUEST, "inactive_reference"),
            Self::IdempotencyConflict => (StatusCode::CONFLICT, "idempotency_conflict"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::InvalidJson(_) => (StatusCode::BAD_REQUEST, "invalid_json"),
            Self::InvalidSignature(_) => (StatusCode::UNAUTHORIZED, "invalid_signature"),
            Self::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "invalid_payload"),
            Self::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::Store(_) | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<InfraError> for ApiError {
    fn from(err: InfraError) -> Self {
        if matches!(err.kind(), InfraErrorKind::InvalidReference { .. }) {
            return Self::InvalidReference(err.to_string());
        }
        if matches!(err.kind(), InfraErrorKind::InactiveReference { .. }) {
            return Self::InactiveReference(err.to_string());
        }
        Self::Store(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
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
