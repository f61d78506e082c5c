//! # HTTP リクエストハンドラ
//!
//! 管理画面の API に対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置し、ここで re-export する
//! - 更新系のボディは `Bytes` で受け取り、[`decode_json_body`] でデコードする
//! - エラーレスポンスは常に `{"error": {"code", "message"}}`

pub mod fallback;
pub mod health;
pub mod material;
pub mod order;

pub use fallback::{method_not_allowed, not_found};
pub use health::health_check;
pub use material::{
    MaterialState,
    create_material,
    delete_material,
    get_material,
    list_materials,
    update_material,
};
pub use order::{OrderState, get_order, list_orders, update_order_shipping, update_order_status};

use axum::{body::Bytes, extract::rejection::BytesRejection};
use serde::de::DeserializeOwned;

use crate::error::AdminError;

/// リクエストボディの上限（1 MiB）
pub const MAX_REQUEST_BODY_BYTES: usize = 1 << 20;

/// リクエストボディを 1 つの JSON オブジェクトとしてデコードする
///
/// 末尾に余分なデータがあれば拒否する。
pub(crate) fn decode_json_body<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
) -> Result<T, AdminError> {
    let body = body.map_err(|e| AdminError::InvalidJson(format!("invalid JSON: {e}")))?;
    let mut deserializer = serde_json::Deserializer::from_slice(&body);
    let value = T::deserialize(&mut deserializer)
        .map_err(|e| AdminError::InvalidJson(format!("invalid JSON: {e}")))?;
    deserializer.end().map_err(|_| {
        AdminError::InvalidJson("request body must contain a single JSON object".to_string())
    })?;
    Ok(value)
}
