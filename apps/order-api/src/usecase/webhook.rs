//! # 決済 Webhook ユースケース
//!
//! 署名検証・解析済みの決済イベントを注文に適用する。
//!
//! ## 設計方針
//!
//! - **1 イベント 1 回**: プロバイダイベント ID ごとの処理記録を同じトランザクションで
//!   確認・更新し、処理済みのイベントは注文に触れずに返す
//! - **無関係なイベントも受理**: 注文 ID がない、または注文が存在しないイベントは
//!   処理済みとして記録だけ残す
//! - **同時配送**: 同じイベントが同時に届いた場合、記録の作成で競合した側がやり直し、
//!   処理済みとして返る

use std::{sync::Arc, time::Duration};

use hanko_domain::{
    clock::SharedClock,
    locale::DEFAULT_LOCALE,
    order::OrderId,
    payment::{PaymentEvent, WebhookEventRecord},
};
use hanko_infra::{
    db::TransactionManager,
    repository::{OrderRepository, WebhookEventRepository},
};
use hanko_shared::{event_log::event, log_business_event};

use super::helpers::{retry_on_conflict, with_timeout};
use crate::error::ApiError;

/// Webhook 適用 1 回あたりの制限時間
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(7);

/// Webhook 適用の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookOutcome {
    /// 今回の呼び出しで処理したか
    pub processed:         bool,
    /// 既に処理済みだったか
    pub already_processed: bool,
}

impl WebhookOutcome {
    fn processed() -> Self {
        Self {
            processed:         true,
            already_processed: false,
        }
    }

    fn already_processed() -> Self {
        Self {
            processed:         false,
            already_processed: true,
        }
    }
}

/// 決済 Webhook ユースケース実装
pub struct WebhookUseCaseImpl {
    order_repo:   Arc<dyn OrderRepository>,
    webhook_repo: Arc<dyn WebhookEventRepository>,
    tx_manager:   Arc<dyn TransactionManager>,
    clock:        SharedClock,
}

impl WebhookUseCaseImpl {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        webhook_repo: Arc<dyn WebhookEventRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: SharedClock,
    ) -> Self {
        Self {
            order_repo,
            webhook_repo,
            tx_manager,
            clock,
        }
    }

    /// 決済イベントを適用する
    pub async fn process(&self, event: &PaymentEvent) -> Result<WebhookOutcome, ApiError> {
        let outcome = retry_on_conflict("Webhook 適用", || {
            with_timeout("Webhook 適用", WEBHOOK_TIMEOUT, self.try_process(event))
        })
        .await?;

        if outcome.processed {
            log_business_event!(
                event.category = event::category::PAYMENT,
                event.action = event::action::WEBHOOK_PROCESSED,
                event.entity_type = event::entity_type::WEBHOOK_EVENT,
                event.entity_id = %event.provider_event_id,
                event.result = event::result::SUCCESS,
                payment.event_type = %event.event_type,
                payment.order_id = event.order_id.as_deref().unwrap_or(""),
                "決済 Webhook を適用"
            );
        } else {
            tracing::info!(
                provider_event_id = %event.provider_event_id,
                "処理済みの決済 Webhook を受信"
            );
        }

        Ok(outcome)
    }

    async fn try_process(&self, event: &PaymentEvent) -> Result<WebhookOutcome, ApiError> {
        let now = self.clock.now();
        let mut tx = self.tx_manager.begin().await?;

        let existing = self
            .webhook_repo
            .find_tx(&mut tx, &event.provider_event_id)
            .await?;
        if existing.as_ref().is_some_and(|record| record.processed) {
            return Ok(WebhookOutcome::already_processed());
        }

        let mut record = WebhookEventRecord::received(event, now);
        if let Some(previous) = &existing {
            record.created_at = previous.created_at;
            record.expire_at = previous.expire_at;
        }

        let order = match event.order_id.as_deref() {
            Some(order_id) => {
                self.order_repo
                    .find_by_id_tx(&mut tx, &OrderId::from_string(order_id), DEFAULT_LOCALE)
                    .await?
            }
            None => None,
        };

        match order {
            Some(mut order) => {
                let audit = order.apply_payment_event(event, now);
                self.order_repo.update_lifecycle(&mut tx, &order).await?;
                self.order_repo
                    .insert_events(&mut tx, &order.id, &[audit])
                    .await?;
            }
            None => {
                tracing::info!(
                    provider_event_id = %event.provider_event_id,
                    "対象の注文がない決済イベントを記録のみ行う"
                );
            }
        }

        record.mark_processed();
        if existing.is_some() {
            self.webhook_repo.update(&mut tx, &record).await?;
        } else {
            self.webhook_repo.insert(&mut tx, &record).await?;
        }

        tx.commit().await?;
        Ok(WebhookOutcome::processed())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use hanko_domain::clock::FixedClock;
    use hanko_infra::{
        memory::InMemoryDocumentStore,
        repository::{DocumentOrderRepository, DocumentWebhookEventRepository},
        store::DocumentStore,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 3, 0, 0).unwrap()
    }

    struct Fixture {
        store: InMemoryDocumentStore,
        repo:  DocumentOrderRepository,
        sut:   Arc<WebhookUseCaseImpl>,
    }

    async fn fixture(status: &str) -> Fixture {
        let store = InMemoryDocumentStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.set(
            "orders",
            "ord_1",
            json!({
                "order_no": "HF-20260210-0001",
                "status": status,
                "payment": {"provider": "stripe", "status": "unpaid"},
                "fulfillment": {"status": "pending"},
                "created_at": "2026-02-10T01:00:00Z"
            }),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let shared: Arc<InMemoryDocumentStore> = Arc::new(store.clone());
        let sut = WebhookUseCaseImpl::new(
            Arc::new(DocumentOrderRepository::new(shared.clone())),
            Arc::new(DocumentWebhookEventRepository::new()),
            shared.clone(),
            Arc::new(FixedClock::new(now())),
        );

        Fixture {
            store,
            repo: DocumentOrderRepository::new(shared),
            sut: Arc::new(sut),
        }
    }

    fn event(id: &str, event_type: &str, order_id: Option<&str>) -> PaymentEvent {
        PaymentEvent {
            provider_event_id: id.to_string(),
            event_type:        event_type.to_string(),
            order_id:          order_id.map(str::to_string),
            payment_intent_id: Some("pi_1".to_string()),
        }
    }

    fn order_id() -> OrderId {
        OrderId::from_string("ord_1")
    }

    #[tokio::test]
    async fn test_決済成功で支払い済みになり監査イベントが1件記録される() {
        // Arrange
        let fx = fixture("pending_payment").await;

        // Act
        let outcome = fx
            .sut
            .process(&event("evt_1", "payment_intent.succeeded", Some("ord_1")))
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome, WebhookOutcome::processed());
        let order = fx.repo.find_by_id(&order_id(), "ja").await.unwrap().unwrap();
        assert_eq!(order.status, "paid");
        assert_eq!(order.payment.status, "paid");
        assert_eq!(order.payment.intent_id.as_deref(), Some("pi_1"));
        assert_eq!(order.payment.last_event_id.as_deref(), Some("evt_1"));
        assert_eq!(order.status_updated_at, now());

        let events = fx.repo.list_events(&order_id()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "payment_paid");
        assert_eq!(events[0].actor_type, "webhook");
        assert_eq!(events[0].actor_id.as_deref(), Some("stripe"));
    }

    #[tokio::test]
    async fn test_同じイベントの再送は処理済みとして何も変更しない() {
        let fx = fixture("pending_payment").await;
        let paid = event("evt_1", "payment_intent.succeeded", Some("ord_1"));
        fx.sut.process(&paid).await.unwrap();

        let outcome = fx.sut.process(&paid).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::already_processed());
        assert_eq!(fx.repo.list_events(&order_id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_同時に届いた同じイベントは1回だけ適用される() {
        let fx = fixture("pending_payment").await;
        let paid = event("evt_1", "payment_intent.succeeded", Some("ord_1"));

        let handles = (0..4)
            .map(|_| {
                let sut = fx.sut.clone();
                let paid = paid.clone();
                tokio::spawn(async move { sut.process(&paid).await.unwrap() })
            })
            .collect::<Vec<_>>();
        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        assert_eq!(outcomes.iter().filter(|o| o.processed).count(), 1);
        assert_eq!(outcomes.iter().filter(|o| o.already_processed).count(), 3);
        assert_eq!(fx.repo.list_events(&order_id()).await.unwrap().len(), 1);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("ord_missing"))]
    #[tokio::test]
    async fn test_対象の注文がなければ記録だけ残して処理済み(#[case] target: Option<&str>) {
        let fx = fixture("pending_payment").await;

        let outcome = fx
            .sut
            .process(&event("evt_9", "payment_intent.succeeded", target))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::processed());
        let record = fx
            .store
            .get("payment_webhook_events", "evt_9")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.data["processed"], json!(true));
        let order = fx.repo.find_by_id(&order_id(), "ja").await.unwrap().unwrap();
        assert_eq!(order.status, "pending_payment");
    }

    #[tokio::test]
    async fn test_遷移表にない状態変更はステータスを変えずイベントを記録する() {
        // 発送済みの注文に決済失敗が届いても取消にはならない
        let fx = fixture("shipped").await;

        fx.sut
            .process(&event("evt_2", "payment_intent.payment_failed", Some("ord_1")))
            .await
            .unwrap();

        let order = fx.repo.find_by_id(&order_id(), "ja").await.unwrap().unwrap();
        assert_eq!(order.status, "shipped");
        assert_eq!(order.payment.status, "failed");
        let events = fx.repo.list_events(&order_id()).await.unwrap();
        assert_eq!(events[0].event_type, "payment_failed");
        assert_eq!(events[0].before_status, None);
    }

    #[tokio::test]
    async fn test_未知のイベント種別は記録のみ() {
        let fx = fixture("paid").await;

        fx.sut
            .process(&event("evt_3", "customer.created", Some("ord_1")))
            .await
            .unwrap();

        let order = fx.repo.find_by_id(&order_id(), "ja").await.unwrap().unwrap();
        assert_eq!(order.status, "paid");
        assert_eq!(order.payment.last_event_id.as_deref(), Some("evt_3"));
        let events = fx.repo.list_events(&order_id()).await.unwrap();
        assert_eq!(events[0].event_type, "payment_event_recorded");
    }

    #[tokio::test]
    async fn test_未処理の記録が残っていれば作成日時を引き継いで処理する() {
        let fx = fixture("pending_payment").await;
        let mut tx = fx.store.begin().await.unwrap();
        tx.set(
            "payment_webhook_events",
            "evt_1",
            json!({"processed": false, "created_at": "2026-02-09T00:00:00Z"}),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let outcome = fx
            .sut
            .process(&event("evt_1", "payment_intent.succeeded", Some("ord_1")))
            .await
            .unwrap();

        assert!(outcome.processed);
        let record = fx
            .store
            .get("payment_webhook_events", "evt_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.data["processed"], json!(true));
        assert_eq!(record.data["created_at"], json!("2026-02-09T00:00:00Z"));
    }
}
