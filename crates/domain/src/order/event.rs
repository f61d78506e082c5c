//! # 注文イベント
//!
//! 注文に紐づく追記専用の監査ログ。作成後に変更されることはない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use strum::IntoStaticStr;

define_prefixed_id! {
    /// 注文イベント ID
    pub struct OrderEventId("evt", v4);
}

/// 注文イベントの種類
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderEventType {
    OrderCreated,
    StatusChanged,
    ShipmentRegistered,
    PaymentPaid,
    PaymentFailed,
    PaymentRefunded,
    PaymentEventRecorded,
}

/// イベントの操作主体
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActorType {
    System,
    Admin,
    Webhook,
    Scheduler,
}

/// 注文イベント
///
/// 保存済みのイベントには未知の種類が含まれうるため、`event_type` と `actor_type` は文字列で保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub id:            String,
    #[serde(rename = "type")]
    pub event_type:    String,
    pub actor_type:    String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id:      Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_status:  Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note:          Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload:       Option<JsonValue>,
    pub created_at:    DateTime<Utc>,
}

impl OrderEvent {
    /// 新しいイベントを作る（ID は自動採番）
    pub fn new(event_type: OrderEventType, actor_type: ActorType, now: DateTime<Utc>) -> Self {
        Self {
            id: OrderEventId::new().to_string(),
            event_type: event_type.to_string(),
            actor_type: actor_type.to_string(),
            actor_id: None,
            before_status: None,
            after_status: None,
            note: None,
            payload: None,
            created_at: now,
        }
    }

    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// 遷移前後のステータスを記録する
    pub fn with_transition(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.before_status = Some(before.into());
        self.after_status = Some(after.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// イベントを新しい順に並べる
pub fn sort_newest_first(events: &mut [OrderEvent]) {
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_イベントidはevtプレフィックスを持つ() {
        let event = OrderEvent::new(OrderEventType::OrderCreated, ActorType::System, Utc::now());

        assert!(event.id.starts_with("evt_"));
        assert_eq!(event.id.len(), "evt_".len() + 32);
    }

    #[test]
    fn test_ビルダーで遷移とメモを設定できる() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();

        let event = OrderEvent::new(OrderEventType::StatusChanged, ActorType::Admin, now)
            .with_actor_id("admin.console")
            .with_transition("paid", "manufacturing")
            .with_note("製造開始");

        assert_eq!(event.event_type, "status_changed");
        assert_eq!(event.actor_type, "admin");
        assert_eq!(event.actor_id.as_deref(), Some("admin.console"));
        assert_eq!(event.before_status.as_deref(), Some("paid"));
        assert_eq!(event.after_status.as_deref(), Some("manufacturing"));
        assert_eq!(event.note.as_deref(), Some("製造開始"));
    }

    #[test]
    fn test_シリアライズ時は種類がtypeキーになり空の項目は省略される() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let event = OrderEvent::new(OrderEventType::OrderCreated, ActorType::System, now)
            .with_payload(json!({"channel": "web", "total_jpy": 3600}));

        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "order_created");
        assert_eq!(value["payload"]["total_jpy"], 3600);
        assert!(value.get("note").is_none());
        assert!(value.get("actor_id").is_none());
    }

    #[test]
    fn test_新しい順に並べる() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut events = vec![
            OrderEvent::new(OrderEventType::OrderCreated, ActorType::System, base),
            OrderEvent::new(OrderEventType::PaymentPaid, ActorType::Webhook, base + Duration::minutes(5)),
        ];

        sort_newest_first(&mut events);

        assert_eq!(events[0].event_type, "payment_paid");
    }
}
