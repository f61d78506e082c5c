//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲
//! - エラーレスポンスは常に `{"error": {"code", "message"}}`

pub mod catalog;
pub mod fallback;
pub mod health;
pub mod order;
pub mod webhook;

pub use catalog::{CatalogState, get_catalog, get_public_config};
pub use fallback::{method_not_allowed, not_found};
pub use health::health_check;
pub use order::{OrderState, create_order};
pub use webhook::{WebhookState, stripe_webhook};

use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// リクエストボディの上限（1 MiB）
pub const MAX_REQUEST_BODY_BYTES: usize = 1 << 20;

/// リクエストボディを 1 つの JSON オブジェクトとしてデコードする
///
/// 末尾に余分なデータがあれば拒否する。
pub(crate) fn decode_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    let value = T::deserialize(&mut deserializer)
        .map_err(|e| ApiError::InvalidJson(format!("invalid JSON: {e}")))?;
    deserializer.end().map_err(|_| {
        ApiError::InvalidJson("request body must contain a single JSON object".to_string())
    })?;
    Ok(value)
}
