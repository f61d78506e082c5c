//! # 注文管理ユースケース
//!
//! 注文の一覧・詳細と、ステータス変更・出荷登録を扱う。
//!
//! ## 更新の流れ
//!
//! 1. スナップショットの書き込みロックを取り、メモリ上の注文を変更してイベントを追記する
//! 2. 1 トランザクションで注文を読み直し、ステータスが変わる場合は保存値からの遷移を再検証する
//! 3. ステータス・支払い・出荷のフィールドとイベントを保存する
//! 4. 失敗したらスナップショットを読み直して `store update failed: ...` を返す

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hanko_domain::{
    DomainError,
    clock::SharedClock,
    locale::resolve_localized_text,
    order::{
        Order,
        OrderEvent,
        event::sort_newest_first,
        status::{
            can_transition,
            fulfillment_status_label,
            next_statuses,
            order_status_label,
            payment_status_label,
            shipping_transitions,
        },
    },
};
use hanko_infra::{
    InfraError,
    db::TransactionManager,
    repository::OrderRepository,
    store::collections,
};
use hanko_shared::{event_log::event, log_business_event};
use serde::{Deserialize, Serialize};

use super::{
    AdminSnapshot,
    OrderRecord,
    PERSIST_TIMEOUT,
    SnapshotCache,
    actor_or_default,
    persistence_error,
    with_timeout,
};
use crate::error::{AdminError, ORDER_NOT_FOUND};

/// 出荷登録で「ステータスを変更しない」を表す値
pub const NO_TRANSITION: &str = "none";

const NO_TRANSITION_LABEL: &str = "ステータス変更なし";

// ===== 入力 =====

/// 注文一覧の絞り込み条件
///
/// ステータスと国コードは完全一致、メールアドレスは大文字小文字を区別しない部分一致。
/// 空の条件は無視する。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status:  Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub email:   Option<String>,
}

impl OrderFilter {
    fn matches(&self, order: &Order) -> bool {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        non_empty(&self.status).is_none_or(|status| order.status == status)
            && non_empty(&self.country)
                .is_none_or(|country| order.shipping.country_code == country.to_uppercase())
            && non_empty(&self.email).is_none_or(|email| {
                order
                    .contact
                    .email
                    .to_lowercase()
                    .contains(&email.to_lowercase())
            })
    }
}

/// ステータス変更の入力
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status:   String,
    #[serde(default)]
    pub actor_id: Option<String>,
}

/// 出荷登録の入力
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingUpdate {
    #[serde(default)]
    pub carrier:     String,
    #[serde(default)]
    pub tracking_no: String,
    /// 空または `none` ならステータスを変更しない
    #[serde(default)]
    pub transition:  String,
    #[serde(default)]
    pub actor_id:    Option<String>,
}

// ===== 表示用 =====

/// 値と表示ラベルの組
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledValue {
    pub value: String,
    pub label: String,
}

impl LabeledValue {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    fn order_status(value: &str) -> Self {
        Self::new(value, order_status_label(value))
    }
}

/// 注文一覧の 1 行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderListItem {
    pub id:                 String,
    pub order_no:           String,
    pub created_at:         DateTime<Utc>,
    pub status:             LabeledValue,
    pub payment_status:     LabeledValue,
    pub fulfillment_status: LabeledValue,
    pub country:            LabeledValue,
    pub total_jpy:          i64,
}

impl OrderListItem {
    fn new(order: &Order, snapshot: &AdminSnapshot) -> Self {
        let country = &order.shipping.country_code;
        Self {
            id:                 order.id.to_string(),
            order_no:           order.order_no.clone(),
            created_at:         order.created_at,
            status:             LabeledValue::order_status(&order.status),
            payment_status:     LabeledValue::new(
                &order.payment.status,
                payment_status_label(&order.payment.status),
            ),
            fulfillment_status: LabeledValue::new(
                &order.fulfillment.status,
                fulfillment_status_label(&order.fulfillment.status),
            ),
            country:            LabeledValue::new(country, snapshot.country_label(country)),
            total_jpy:          order.pricing.total_jpy,
        }
    }
}

/// 注文履歴の 1 件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventView {
    pub event_type:    String,
    pub actor_type:    String,
    pub actor_id:      Option<String>,
    pub before_status: Option<LabeledValue>,
    pub after_status:  Option<LabeledValue>,
    pub note:          Option<String>,
    pub created_at:    DateTime<Utc>,
}

impl From<OrderEvent> for EventView {
    fn from(event: OrderEvent) -> Self {
        Self {
            event_type:    event.event_type,
            actor_type:    event.actor_type,
            actor_id:      event.actor_id,
            before_status: event.before_status.as_deref().map(LabeledValue::order_status),
            after_status:  event.after_status.as_deref().map(LabeledValue::order_status),
            note:          event.note,
            created_at:    event.created_at,
        }
    }
}

/// 注文詳細
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub summary:              OrderListItem,
    pub channel:              String,
    pub locale:               String,
    pub contact_email:        String,
    pub seal_line1:           String,
    pub seal_line2:           String,
    pub material_label:       String,
    pub carrier:              Option<String>,
    pub tracking_no:          Option<String>,
    pub status_updated_at:    DateTime<Utc>,
    pub updated_at:           DateTime<Utc>,
    /// 新しい順
    pub events:               Vec<EventView>,
    pub next_statuses:        Vec<LabeledValue>,
    /// 先頭は常に「ステータス変更なし」
    pub shipping_transitions: Vec<LabeledValue>,
}

impl OrderDetail {
    fn new(record: &OrderRecord, snapshot: &AdminSnapshot, cache: &SnapshotCache) -> Self {
        let order = &record.order;

        let mut events = record.events.clone();
        sort_newest_first(&mut events);

        let mut transitions = vec![LabeledValue::new(NO_TRANSITION, NO_TRANSITION_LABEL)];
        transitions.extend(
            shipping_transitions(&order.status)
                .into_iter()
                .map(|status| LabeledValue::new(status.as_str(), status.label())),
        );

        Self {
            summary:              OrderListItem::new(order, snapshot),
            channel:              order.channel.clone(),
            locale:               order.locale.clone(),
            contact_email:        order.contact.email.clone(),
            seal_line1:           order.seal.line1.clone(),
            seal_line2:           order.seal.line2.clone(),
            material_label:       resolve_localized_text(
                &order.material.label_i18n,
                cache.locale(),
                cache.default_locale(),
            ),
            carrier:              order.fulfillment.carrier.clone(),
            tracking_no:          order.fulfillment.tracking_no.clone(),
            status_updated_at:    order.status_updated_at,
            updated_at:           order.updated_at,
            events:               events.into_iter().map(EventView::from).collect(),
            next_statuses:        next_statuses(&order.status)
                .iter()
                .map(|status| LabeledValue::new(status.as_str(), status.label()))
                .collect(),
            shipping_transitions: transitions,
        }
    }
}

// ===== ユースケース =====

/// 注文管理ユースケース
pub struct AdminOrderUseCaseImpl {
    cache:      Arc<SnapshotCache>,
    order_repo: Arc<dyn OrderRepository>,
    tx_manager: Arc<dyn TransactionManager>,
    clock:      SharedClock,
}

impl AdminOrderUseCaseImpl {
    pub fn new(
        cache: Arc<SnapshotCache>,
        order_repo: Arc<dyn OrderRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: SharedClock,
    ) -> Self {
        Self {
            cache,
            order_repo,
            tx_manager,
            clock,
        }
    }

    /// ストアから読み直して注文一覧を返す
    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderListItem>, AdminError> {
        self.cache.refresh().await?;

        let snapshot = self.cache.read().await;
        Ok(snapshot
            .orders
            .iter()
            .filter(|record| filter.matches(&record.order))
            .map(|record| OrderListItem::new(&record.order, &snapshot))
            .collect())
    }

    pub async fn get_order_detail(&self, order_id: &str) -> Result<OrderDetail, AdminError> {
        let snapshot = self.cache.read().await;
        let record = snapshot
            .order(order_id)
            .ok_or(AdminError::NotFound(ORDER_NOT_FOUND))?;
        Ok(OrderDetail::new(record, &snapshot, &self.cache))
    }

    /// 注文ステータスを変更する
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn update_status(
        &self,
        order_id: &str,
        input: &StatusUpdate,
    ) -> Result<OrderDetail, AdminError> {
        let actor_id = actor_or_default(input.actor_id.as_deref());
        let now = self.clock.now();

        let mut snapshot = self.cache.write().await;
        let record = snapshot
            .order_mut(order_id)
            .ok_or(AdminError::NotFound(ORDER_NOT_FOUND))?;

        let before = record.order.status.clone();
        let event = record.order.change_status(&input.status, actor_id, now)?;
        record.events.push(event.clone());
        let order = record.order.clone();

        self.persist(&mut snapshot, &order, &before, &[event]).await?;

        log_business_event!(
            event.category = event::category::ORDER,
            event.action = event::action::ORDER_STATUS_CHANGED,
            event.entity_type = event::entity_type::ORDER,
            event.entity_id = %order.id,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            order.before_status = %before,
            order.after_status = %order.status,
            "注文ステータス変更"
        );

        self.detail_from(&snapshot, order_id)
    }

    /// 配送業者と追跡番号を登録し、指定があればステータスも進める
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn update_shipping(
        &self,
        order_id: &str,
        input: &ShippingUpdate,
    ) -> Result<OrderDetail, AdminError> {
        let actor_id = actor_or_default(input.actor_id.as_deref());
        let now = self.clock.now();

        let mut snapshot = self.cache.write().await;
        let record = snapshot
            .order_mut(order_id)
            .ok_or(AdminError::NotFound(ORDER_NOT_FOUND))?;

        let before = record.order.status.clone();
        let events = record.order.register_shipment(
            &input.carrier,
            &input.tracking_no,
            &input.transition,
            actor_id,
            now,
        )?;
        record.events.extend(events.iter().cloned());
        let order = record.order.clone();

        self.persist(&mut snapshot, &order, &before, &events).await?;

        log_business_event!(
            event.category = event::category::ORDER,
            event.action = event::action::ORDER_SHIPMENT_REGISTERED,
            event.entity_type = event::entity_type::ORDER,
            event.entity_id = %order.id,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            order.before_status = %before,
            order.after_status = %order.status,
            "出荷登録"
        );

        self.detail_from(&snapshot, order_id)
    }

    fn detail_from(&self, snapshot: &AdminSnapshot, order_id: &str) -> Result<OrderDetail, AdminError> {
        let record = snapshot
            .order(order_id)
            .ok_or(AdminError::NotFound(ORDER_NOT_FOUND))?;
        Ok(OrderDetail::new(record, snapshot, &self.cache))
    }

    /// 変更を保存し、失敗したらスナップショットを読み直す
    async fn persist(
        &self,
        snapshot: &mut AdminSnapshot,
        order: &Order,
        before_status: &str,
        events: &[OrderEvent],
    ) -> Result<(), AdminError> {
        let result = with_timeout(
            "注文の更新",
            PERSIST_TIMEOUT,
            self.try_persist(order, before_status, events),
        )
        .await;

        match result {
            Ok(saved) => {
                if let Some(record) = snapshot.order_mut(order.id.as_str()) {
                    record.order = saved;
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "注文の保存に失敗したため読み直します");
                self.cache.rollback(snapshot).await;
                Err(persistence_error(e))
            }
        }
    }

    /// 保存した注文を返す
    async fn try_persist(
        &self,
        order: &Order,
        before_status: &str,
        events: &[OrderEvent],
    ) -> Result<Order, AdminError> {
        let mut tx = self.tx_manager.begin().await?;

        let stored = self
            .order_repo
            .find_by_id_tx(&mut tx, &order.id, self.cache.default_locale())
            .await?
            .ok_or_else(|| AdminError::Persistence(ORDER_NOT_FOUND.to_string()))?;

        // 読み込み後に別の操作でステータスが変わっていれば、保存値から遷移表を引き直す
        if stored.status != before_status {
            if order.status == before_status {
                return Err(InfraError::conflict(collections::ORDERS, order.id.as_str()).into());
            }
            if !can_transition(&stored.status, &order.status) {
                return Err(DomainError::InvalidTransition {
                    from_label: order_status_label(&stored.status).to_string(),
                    to_label:   order_status_label(&order.status).to_string(),
                }
                .into());
            }
        }

        // 決済プロバイダ由来の値は保存値を引き継ぐ
        let mut merged = order.clone();
        merged.payment.intent_id = stored.payment.intent_id;
        merged.payment.last_event_id = stored.payment.last_event_id;
        // ステータスを変えない操作では決済状況も保存値のまま
        if order.status == before_status && !stored.payment.status.is_empty() {
            merged.payment.status = stored.payment.status;
        }

        self.order_repo.update_lifecycle(&mut tx, &merged).await?;
        self.order_repo
            .insert_events(&mut tx, &order.id, events)
            .await?;
        tx.commit().await?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use hanko_domain::{clock::FixedClock, order::OrderId};
    use hanko_infra::{
        memory::InMemoryDocumentStore,
        repository::{DocumentCatalogRepository, DocumentOrderRepository},
        store::DocumentStore,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::mock::seed_mock_data;

    struct Fixture {
        store: InMemoryDocumentStore,
        repo:  Arc<DocumentOrderRepository>,
        sut:   AdminOrderUseCaseImpl,
        now:   DateTime<Utc>,
    }

    async fn setup() -> Fixture {
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 3, 0, 0).unwrap();
        let store = InMemoryDocumentStore::new();
        seed_mock_data(&store, now).await.unwrap();

        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let repo = Arc::new(DocumentOrderRepository::new(shared.clone()));
        let cache = Arc::new(SnapshotCache::new(
            repo.clone(),
            Arc::new(DocumentCatalogRepository::new(shared)),
            "ja",
            "ja",
        ));
        cache.refresh().await.unwrap();

        let sut = AdminOrderUseCaseImpl::new(
            cache,
            repo.clone(),
            Arc::new(store.clone()),
            Arc::new(FixedClock::new(now)),
        );
        Fixture {
            store,
            repo,
            sut,
            now,
        }
    }

    fn status(next: &str) -> StatusUpdate {
        StatusUpdate {
            status:   next.to_string(),
            actor_id: None,
        }
    }

    fn shipping(carrier: &str, tracking_no: &str, transition: &str) -> ShippingUpdate {
        ShippingUpdate {
            carrier:     carrier.to_string(),
            tracking_no: tracking_no.to_string(),
            transition:  transition.to_string(),
            actor_id:    Some("ops.sato".to_string()),
        }
    }

    // ===== 一覧・詳細 =====

    #[rstest]
    #[case(OrderFilter::default(), 7)]
    #[case(OrderFilter { status: Some("paid".into()), ..Default::default() }, 1)]
    #[case(OrderFilter { country: Some("jp".into()), ..Default::default() }, 2)]
    #[case(OrderFilter { email: Some("EXAMPLE.COM".into()), ..Default::default() }, 7)]
    #[case(OrderFilter { email: Some("Smith".into()), ..Default::default() }, 1)]
    #[case(OrderFilter { status: Some("shipped".into()), country: Some("JP".into()), ..Default::default() }, 0)]
    #[case(OrderFilter { status: Some("  ".into()), ..Default::default() }, 7)]
    #[tokio::test]
    async fn test_注文一覧の絞り込み(#[case] filter: OrderFilter, #[case] expected: usize) {
        let fx = setup().await;

        let orders = fx.sut.list_orders(&filter).await.unwrap();

        assert_eq!(orders.len(), expected);
    }

    #[tokio::test]
    async fn test_一覧の行にはラベルが付く() {
        let fx = setup().await;

        let orders = fx.sut.list_orders(&OrderFilter::default()).await.unwrap();

        let first = &orders[0];
        assert_eq!(first.id, "ord_1007");
        assert_eq!(first.status, LabeledValue::new("manufacturing", "製造中"));
        assert_eq!(first.payment_status, LabeledValue::new("paid", "支払い済み"));
        assert_eq!(first.fulfillment_status, LabeledValue::new("manufacturing", "製造中"));
        assert_eq!(first.country, LabeledValue::new("JP", "日本"));
        assert_eq!(first.total_jpy, 5400);
    }

    #[tokio::test]
    async fn test_注文詳細は履歴を新しい順に並べ遷移先を含む() {
        let fx = setup().await;

        let detail = fx.sut.get_order_detail("ord_1007").await.unwrap();

        assert_eq!(detail.material_label, "黒水牛");
        assert_eq!(detail.seal_line1, "伊");
        assert_eq!(
            detail
                .events
                .iter()
                .map(|e| e.event_type.as_str())
                .collect::<Vec<_>>(),
            vec!["status_changed", "payment_paid", "order_created"]
        );
        assert_eq!(
            detail.next_statuses,
            vec![
                LabeledValue::new("shipped", "出荷済み"),
                LabeledValue::new("refunded", "返金済み"),
            ]
        );
        assert_eq!(
            detail.shipping_transitions,
            vec![
                LabeledValue::new("none", "ステータス変更なし"),
                LabeledValue::new("shipped", "出荷済み"),
            ]
        );
    }

    #[tokio::test]
    async fn test_存在しない注文の詳細はnot_found() {
        let fx = setup().await;

        let err = fx.sut.get_order_detail("ord_9999").await.unwrap_err();

        assert_eq!(err.to_string(), "注文が見つかりません。");
    }

    // ===== ステータス変更 =====

    #[tokio::test]
    async fn test_ステータス変更はメモリとストアの両方に反映される() {
        // Arrange
        let fx = setup().await;

        // Act
        let detail = fx
            .sut
            .update_status("ord_1006", &status("manufacturing"))
            .await
            .unwrap();

        // Assert
        assert_eq!(detail.summary.status.value, "manufacturing");
        assert_eq!(detail.summary.fulfillment_status.value, "manufacturing");
        assert_eq!(detail.status_updated_at, fx.now);
        let latest = &detail.events[0];
        assert_eq!(latest.event_type, "status_changed");
        assert_eq!(latest.actor_id.as_deref(), Some("admin.console"));
        assert_eq!(latest.before_status, Some(LabeledValue::new("paid", "支払い済み")));

        let id = OrderId::from_string("ord_1006");
        let stored = fx.repo.find_by_id(&id, "ja").await.unwrap().unwrap();
        assert_eq!(stored.status, "manufacturing");
        assert_eq!(stored.fulfillment.status, "manufacturing");
        assert_eq!(stored.updated_at, fx.now);
        let events = fx.repo.list_events(&id).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].after_status.as_deref(), Some("manufacturing"));
    }

    #[rstest]
    #[case("ord_1003", "shipped", "支払い待ち から 出荷済み には遷移できません。")]
    #[case("ord_1004", "refunded", "配達完了 から 返金済み には遷移できません。")]
    #[case("ord_1006", "paid", "現在と同じステータスには更新できません。")]
    #[case("ord_1006", " ", "更新先のステータスを選択してください。")]
    #[case("ord_1006", "archived", "支払い済み から archived には遷移できません。")]
    #[tokio::test]
    async fn test_遷移表にない変更は拒否され何も書き込まれない(
        #[case] order_id: &str,
        #[case] next: &str,
        #[case] message: &str,
    ) {
        let fx = setup().await;

        let err = fx.sut.update_status(order_id, &status(next)).await.unwrap_err();

        assert_eq!(err.to_string(), message);
        let id = OrderId::from_string(order_id);
        let before = fx.sut.get_order_detail(order_id).await.unwrap();
        let stored_events = fx.repo.list_events(&id).await.unwrap();
        assert_eq!(before.events.len(), stored_events.len());
    }

    #[tokio::test]
    async fn test_存在しない注文のステータス変更はnot_found() {
        let fx = setup().await;

        let err = fx
            .sut
            .update_status("ord_9999", &status("paid"))
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_保存に失敗したらメモリ上の変更を破棄する() {
        // Arrange
        let fx = setup().await;
        fx.store.set_reject_commits(true);

        // Act
        let err = fx
            .sut
            .update_status("ord_1006", &status("refunded"))
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.to_string(), "store update failed: 予期しないエラー: コミットが拒否されました");
        let detail = fx.sut.get_order_detail("ord_1006").await.unwrap();
        assert_eq!(detail.summary.status.value, "paid");
        assert_eq!(detail.events.len(), 2);
    }

    #[tokio::test]
    async fn test_別の操作で保存値が変わっていれば保存値から遷移を再検証する() {
        // Arrange
        let fx = setup().await;
        let mut tx = fx.store.begin().await.unwrap();
        tx.merge("orders", "ord_1006", json!({"status": "refunded"}))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        // Act
        let err = fx
            .sut
            .update_status("ord_1006", &status("manufacturing"))
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.to_string(), "返金済み から 製造中 には遷移できません。");
        let detail = fx.sut.get_order_detail("ord_1006").await.unwrap();
        assert_eq!(detail.summary.status.value, "refunded");
    }

    // ===== 出荷登録 =====

    #[tokio::test]
    async fn test_出荷登録とステータス遷移を同時に記録する() {
        // Arrange
        let fx = setup().await;

        // Act
        let detail = fx
            .sut
            .update_shipping("ord_1007", &shipping(" 佐川急便 ", "SGW-1234", "shipped"))
            .await
            .unwrap();

        // Assert
        assert_eq!(detail.carrier.as_deref(), Some("佐川急便"));
        assert_eq!(detail.tracking_no.as_deref(), Some("SGW-1234"));
        assert_eq!(detail.summary.status.value, "shipped");

        let id = OrderId::from_string("ord_1007");
        let stored = fx.repo.find_by_id(&id, "ja").await.unwrap().unwrap();
        assert_eq!(stored.fulfillment.shipped_at, Some(fx.now));
        assert_eq!(stored.fulfillment.carrier.as_deref(), Some("佐川急便"));

        let new_events = fx
            .repo
            .list_events(&id)
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.created_at == fx.now)
            .collect::<Vec<_>>();
        assert_eq!(new_events.len(), 2);
        assert!(new_events.iter().all(|e| e.actor_id.as_deref() == Some("ops.sato")));
        let shipment = new_events
            .iter()
            .find(|e| e.event_type == "shipment_registered")
            .unwrap();
        assert_eq!(shipment.note.as_deref(), Some("佐川急便 / SGW-1234"));
    }

    #[rstest]
    #[case("")]
    #[case("none")]
    #[tokio::test]
    async fn test_遷移なしの出荷登録はステータスを変えない(#[case] transition: &str) {
        let fx = setup().await;

        let detail = fx
            .sut
            .update_shipping("ord_1005", &shipping("DHL", "SGP-824901", transition))
            .await
            .unwrap();

        assert_eq!(detail.summary.status.value, "shipped");
        assert_eq!(detail.events[0].event_type, "shipment_registered");
        assert_eq!(detail.events.len(), 6);
    }

    #[rstest]
    #[case("", "X-1", "none", "配送業者を入力してください。")]
    #[case("DHL", " ", "none", "追跡番号を入力してください。")]
    #[case("DHL", "X-1", "manufacturing", "現在と同じステータスは指定できません。")]
    #[case("DHL", "X-1", "refunded", "製造中 から 返金済み には遷移できません。")]
    #[case("DHL", "X-1", "delivered", "製造中 から 配達完了 には遷移できません。")]
    #[tokio::test]
    async fn test_不正な出荷登録は拒否される(
        #[case] carrier: &str,
        #[case] tracking_no: &str,
        #[case] transition: &str,
        #[case] message: &str,
    ) {
        let fx = setup().await;

        let err = fx
            .sut
            .update_shipping("ord_1007", &shipping(carrier, tracking_no, transition))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), message);
        let detail = fx.sut.get_order_detail("ord_1007").await.unwrap();
        assert_eq!(detail.carrier, None);
    }

    #[tokio::test]
    async fn test_出荷登録の保存に失敗したら両方のイベントを破棄する() {
        let fx = setup().await;
        fx.store.set_reject_commits(true);

        let err = fx
            .sut
            .update_shipping("ord_1007", &shipping("DHL", "X-1", "shipped"))
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::Persistence(_)));
        let detail = fx.sut.get_order_detail("ord_1007").await.unwrap();
        assert_eq!(detail.summary.status.value, "manufacturing");
        assert_eq!(detail.carrier, None);
        assert_eq!(detail.events.len(), 3);
    }

    #[tokio::test]
    async fn test_決済情報は保存値を引き継ぐ() {
        // Arrange
        let fx = setup().await;
        let mut tx = fx.store.begin().await.unwrap();
        tx.merge(
            "orders",
            "ord_1006",
            json!({"payment": {"intent_id": "pi_late", "last_event_id": "evt_late"}}),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        // Act
        fx.sut
            .update_status("ord_1006", &status("manufacturing"))
            .await
            .unwrap();

        // Assert
        let id = OrderId::from_string("ord_1006");
        let stored = fx.repo.find_by_id(&id, "ja").await.unwrap().unwrap();
        assert_eq!(stored.payment.intent_id.as_deref(), Some("pi_late"));
        assert_eq!(stored.payment.last_event_id.as_deref(), Some("evt_late"));
        assert_eq!(stored.payment.status, "paid");
    }

    #[tokio::test]
    async fn test_ステータスを変えない出荷登録は保存済みの決済状況を上書きしない() {
        // Arrange
        let fx = setup().await;
        let mut tx = fx.store.begin().await.unwrap();
        tx.merge("orders", "ord_1004", json!({"payment": {"status": "refunded"}}))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        // Act
        let detail = fx
            .sut
            .update_shipping("ord_1004", &shipping("ヤマト運輸", "YMT-99121", "none"))
            .await
            .unwrap();

        // Assert
        let id = OrderId::from_string("ord_1004");
        let stored = fx.repo.find_by_id(&id, "ja").await.unwrap().unwrap();
        assert_eq!(stored.payment.status, "refunded");
        assert_eq!(stored.status, "delivered");
        assert_eq!(stored.fulfillment.tracking_no.as_deref(), Some("YMT-99121"));
        assert_eq!(detail.summary.payment_status.value, "refunded");
    }
}
