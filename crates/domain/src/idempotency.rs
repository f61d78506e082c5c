//! # 冪等キー
//!
//! 注文作成の冪等性を保証する記録。
//! ドキュメント ID は `{channel}:{idempotency_key}`。
//!
//! 同じ ID でリクエストハッシュも同じなら元の注文を返し（リプレイ）、
//! ハッシュが異なれば競合として拒否する。

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::order::{Channel, OrderId};

/// 冪等キーの保持期間（日）
pub const IDEMPOTENCY_RETENTION_DAYS: i64 = 30;

/// 冪等キーの記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdempotencyRecord {
    pub channel:         String,
    pub idempotency_key: String,
    pub request_hash:    String,
    pub order_id:        OrderId,
    pub created_at:      DateTime<Utc>,
    pub expire_at:       DateTime<Utc>,
}

/// 照合結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyMatch {
    /// 同じリクエストの再送
    Replay(OrderId),
    /// 同じキーで内容が異なる
    Conflict,
}

impl IdempotencyRecord {
    pub fn new(
        channel: Channel,
        idempotency_key: &str,
        request_hash: &str,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            channel: channel.to_string(),
            idempotency_key: idempotency_key.to_string(),
            request_hash: request_hash.to_string(),
            order_id,
            created_at: now,
            expire_at: now + TimeDelta::days(IDEMPOTENCY_RETENTION_DAYS),
        }
    }

    /// ドキュメント ID
    pub fn id(&self) -> String {
        document_id(&self.channel, &self.idempotency_key)
    }

    /// 新しいリクエストのハッシュと照合する
    pub fn check(&self, request_hash: &str) -> IdempotencyMatch {
        if self.request_hash == request_hash {
            IdempotencyMatch::Replay(self.order_id.clone())
        } else {
            IdempotencyMatch::Conflict
        }
    }
}

/// 冪等キー記録のドキュメント ID
pub fn document_id(channel: &str, idempotency_key: &str) -> String {
    format!("{channel}:{idempotency_key}")
}
