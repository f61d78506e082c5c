//! # 決済イベント
//!
//! 決済プロバイダ（Stripe）から届くイベントと、その処理記録を定義する。
//!
//! 同じプロバイダイベント ID のイベントは何度届いても一度しか注文に適用しない。
//! 処理済みかどうかは [`WebhookEventRecord::processed`] で判定する。

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::order::{OrderEventType, OrderStatus, PAYMENT_PROVIDER_STRIPE, PaymentStatus};

/// Webhook 処理記録の保持期間（日）
pub const WEBHOOK_EVENT_RETENTION_DAYS: i64 = 90;

/// 署名検証・解析済みの決済イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub provider_event_id: String,
    pub event_type:        String,
    pub order_id:          Option<String>,
    pub payment_intent_id: Option<String>,
}

/// イベント種別ごとの注文への作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTransition {
    /// 設定する支払いステータス（`None` は変更なし）
    pub payment_status:   Option<&'static str>,
    /// 遷移先の注文ステータス（`None` は変更なし）
    pub next_status:      Option<OrderStatus>,
    pub audit_event_type: OrderEventType,
}

const STRIPE_TRANSITIONS: &[(&str, PaymentStatus, OrderStatus, OrderEventType)] = &[
    (
        "payment_intent.succeeded",
        PaymentStatus::Paid,
        OrderStatus::Paid,
        OrderEventType::PaymentPaid,
    ),
    (
        "payment_intent.payment_failed",
        PaymentStatus::Failed,
        OrderStatus::Canceled,
        OrderEventType::PaymentFailed,
    ),
    (
        "payment_intent.canceled",
        PaymentStatus::Failed,
        OrderStatus::Canceled,
        OrderEventType::PaymentFailed,
    ),
    (
        "charge.refunded",
        PaymentStatus::Refunded,
        OrderStatus::Refunded,
        OrderEventType::PaymentRefunded,
    ),
];

/// Stripe のイベント種別から注文への作用を引く
///
/// 表にない種別はステータスを変更せず `payment_event_recorded` として記録する。
pub fn stripe_transition(event_type: &str) -> PaymentTransition {
    STRIPE_TRANSITIONS
        .iter()
        .find(|(kind, ..)| *kind == event_type.trim())
        .map_or(
            PaymentTransition {
                payment_status:   None,
                next_status:      None,
                audit_event_type: OrderEventType::PaymentEventRecorded,
            },
            |(_, payment, next, audit)| PaymentTransition {
                payment_status:   Some(payment.as_str()),
                next_status:      Some(*next),
                audit_event_type: *audit,
            },
        )
}

/// Webhook の処理記録
///
/// ドキュメント ID はプロバイダイベント ID。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookEventRecord {
    #[serde(skip_serializing)]
    pub provider_event_id: String,
    pub provider:          String,
    pub event_type:        String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id:          Option<String>,
    pub processed:         bool,
    pub created_at:        DateTime<Utc>,
    pub expire_at:         DateTime<Utc>,
}

impl WebhookEventRecord {
    /// 未処理の記録を作る
    pub fn received(event: &PaymentEvent, now: DateTime<Utc>) -> Self {
        Self {
            provider_event_id: event.provider_event_id.clone(),
            provider: PAYMENT_PROVIDER_STRIPE.to_string(),
            event_type: event.event_type.clone(),
            order_id: event.order_id.clone(),
            processed: false,
            created_at: now,
            expire_at: now + TimeDelta::days(WEBHOOK_EVENT_RETENTION_DAYS),
        }
    }

    pub fn mark_processed(&mut self) {
        self.processed = true;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("payment_intent.succeeded", Some("paid"), Some(OrderStatus::Paid), OrderEventType::PaymentPaid)]
    #[case("payment_intent.payment_failed", Some("failed"), Some(OrderStatus::Canceled), OrderEventType::PaymentFailed)]
    #[case("payment_intent.canceled", Some("failed"), Some(OrderStatus::Canceled), OrderEventType::PaymentFailed)]
    #[case("charge.refunded", Some("refunded"), Some(OrderStatus::Refunded), OrderEventType::PaymentRefunded)]
    #[case("customer.created", None, None, OrderEventType::PaymentEventRecorded)]
    fn test_stripeイベント種別ごとの作用(
        #[case] event_type: &str,
        #[case] payment_status: Option<&'static str>,
        #[case] next_status: Option<OrderStatus>,
        #[case] audit_event_type: OrderEventType,
    ) {
        assert_eq!(
            stripe_transition(event_type),
            PaymentTransition {
                payment_status,
                next_status,
                audit_event_type,
            }
        );
    }

    #[test]
    fn test_処理記録は90日後に失効する() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let event = PaymentEvent {
            provider_event_id: "evt_1".to_string(),
            event_type:        "payment_intent.succeeded".to_string(),
            order_id:          None,
            payment_intent_id: None,
        };

        let mut record = WebhookEventRecord::received(&event, now);
        assert!(!record.processed);
        record.mark_processed();

        assert!(record.processed);
        assert_eq!(record.provider, "stripe");
        assert_eq!(
            record.expire_at,
            Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
        );
    }
}
