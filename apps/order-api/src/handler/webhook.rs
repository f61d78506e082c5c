//! # 決済 Webhook ハンドラ
//!
//! ## エンドポイント
//!
//! ```text
//! POST /v1/payments/stripe/webhook
//! ```
//!
//! 署名は生のリクエストボディに対して検証するため、ボディは JSON として
//! デコードする前にバイト列のまま受け取る。

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::HeaderMap,
    response::IntoResponse,
};
use hanko_domain::clock::SharedClock;
use hanko_infra::stripe::{parse_event, verify_signature};
use hanko_shared::event_log::error::{category, kind};
use serde::Serialize;

use crate::{
    error::ApiError,
    usecase::{WebhookOutcome, WebhookUseCaseImpl},
};

/// 署名ヘッダ名
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Webhook ハンドラーの State
pub struct WebhookState {
    pub usecase:        WebhookUseCaseImpl,
    /// 署名シークレット（空なら検証しない）
    pub webhook_secret: String,
    pub clock:          SharedClock,
}

/// Webhook レスポンス
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub ok:                bool,
    pub processed:         bool,
    pub already_processed: bool,
}

impl From<WebhookOutcome> for WebhookResponse {
    fn from(outcome: WebhookOutcome) -> Self {
        Self {
            ok:                true,
            processed:         outcome.processed,
            already_processed: outcome.already_processed,
        }
    }
}

/// Stripe の Webhook を受け取る
///
/// ## エンドポイント
/// POST /v1/payments/stripe/webhook
#[tracing::instrument(skip_all)]
pub async fn stripe_webhook(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body =
        body.map_err(|_| ApiError::InvalidRequest("failed to read request body".to_string()))?;

    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if let Err(e) = verify_signature(&body, signature, &state.webhook_secret, state.clock.now()) {
        tracing::warn!(
            error.category = category::EXTERNAL_SERVICE,
            error.kind = kind::WEBHOOK_SIGNATURE,
            "Webhook の署名検証に失敗: {}",
            e
        );
        return Err(ApiError::InvalidSignature(e.to_string()));
    }

    let event = parse_event(&body).map_err(|e| ApiError::InvalidPayload(e.to_string()))?;

    let outcome = state.usecase.process(&event).await?;

    Ok(Json(WebhookResponse::from(outcome)))
}
