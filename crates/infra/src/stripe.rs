//! # Stripe Webhook
//!
//! `Stripe-Signature` ヘッダの検証と、イベント本文から決済イベントを取り出す処理。
//!
//! ## 署名の検証
//!
//! ヘッダは `t=<unix 秒>,v1=<hex>[,v1=<hex>...]` 形式。
//! `"{t}.{本文}"` の HMAC-SHA256 をシークレットで計算し、いずれかの `v1` と定数時間で比較する。
//! `t` は 1 つだけで、重複していればタイムスタンプ不正として拒否する。
//! タイムスタンプは現在時刻から前後 5 分以内でなければならない。
//!
//! シークレットが空の場合は検証しない（ローカル開発用）。

use chrono::{DateTime, Utc};
use hanko_domain::payment::PaymentEvent;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// 署名タイムスタンプの許容誤差（秒）
pub const SIGNATURE_TOLERANCE_SECS: u64 = 5 * 60;

/// 署名検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing Stripe-Signature header")]
    MissingHeader,

    #[error("invalid stripe signature timestamp")]
    InvalidTimestamp,

    #[error("stripe signature does not include timestamp")]
    MissingTimestamp,

    #[error("stripe signature does not include v1")]
    MissingSignature,

    #[error("stripe signature timestamp is outside tolerance")]
    OutsideTolerance,

    #[error("invalid stripe signature")]
    Mismatch,
}

/// イベント本文の解析エラー
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to parse stripe event: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("stripe event must include id and type")]
    MissingIdentity,
}

/// `Stripe-Signature` ヘッダを検証する
///
/// `secret` が空（空白のみを含む）なら検証せずに成功する。
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let secret = secret.trim();
    if secret.is_empty() {
        return Ok(());
    }

    let header = header.trim();
    if header.is_empty() {
        return Err(SignatureError::MissingHeader);
    }

    let (timestamp, candidates) = parse_header(header)?;
    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if candidates.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let skew = now.timestamp().abs_diff(timestamp);
    if skew > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::OutsideTolerance);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    let matched = candidates
        .iter()
        .filter_map(|candidate| hex::decode(candidate).ok())
        .any(|candidate| bool::from(candidate.as_slice().ct_eq(expected.as_slice())));

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// ヘッダを `t` と `v1` の候補に分解する
///
/// 空の要素と `=` を含まない要素は無視する。`t` が 2 つ以上あれば `InvalidTimestamp`。
fn parse_header(header: &str) -> Result<(Option<i64>, Vec<&str>), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "t" => {
                if timestamp.is_some() {
                    return Err(SignatureError::InvalidTimestamp);
                }
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| SignatureError::InvalidTimestamp)?;
                timestamp = Some(parsed);
            }
            "v1" if !value.is_empty() => candidates.push(value),
            _ => {}
        }
    }

    Ok((timestamp, candidates))
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    id:         String,
    #[serde(default, rename = "type")]
    event_type: String,
    #[serde(default)]
    data:       JsonValue,
}

/// イベント本文から決済イベントを取り出す
///
/// - `data.object.id` が `pi_` で始まれば PaymentIntent ID とし、
///   `data.object.payment_intent` が文字列ならそちらを優先する
/// - 注文 ID は `order_id`、`metadata.order_id`、`metadata.orderId`、`metadata.orderID` の順に探す
pub fn parse_event(payload: &[u8]) -> Result<PaymentEvent, PayloadError> {
    let envelope: Envelope = serde_json::from_slice(payload).map_err(PayloadError::Malformed)?;

    let provider_event_id = envelope.id.trim().to_string();
    let event_type = envelope.event_type.trim().to_string();
    if provider_event_id.is_empty() || event_type.is_empty() {
        return Err(PayloadError::MissingIdentity);
    }

    let object = envelope.data.get("object").filter(|v| v.is_object());

    Ok(PaymentEvent {
        provider_event_id,
        event_type,
        order_id: object.and_then(find_order_id),
        payment_intent_id: object.and_then(find_payment_intent_id),
    })
}

fn trimmed_string(value: Option<&JsonValue>) -> Option<String> {
    value
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn find_payment_intent_id(object: &JsonValue) -> Option<String> {
    trimmed_string(object.get("payment_intent")).or_else(|| {
        trimmed_string(object.get("id")).filter(|id| id.starts_with("pi_"))
    })
}

fn find_order_id(object: &JsonValue) -> Option<String> {
    trimmed_string(object.get("order_id")).or_else(|| {
        let metadata = object.get("metadata")?;
        ["order_id", "orderId", "orderID"]
            .into_iter()
            .find_map(|key| trimmed_string(metadata.get(key)))
    })
}

/// テスト用に `Stripe-Signature` ヘッダを組み立てる
#[cfg(any(test, feature = "test-utils"))]
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC はあらゆる長さの鍵を受け付ける");
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
