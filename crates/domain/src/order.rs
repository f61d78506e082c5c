//! # 注文
//!
//! 注文集約を定義する。
//!
//! 注文は作成時点のカタログ（書体・材質・配送国）のスナップショットを保持し、
//! カタログが後から編集されても既存注文の内容は変わらない。
//!
//! ステータスの変更は管理画面（[`Order::change_status`], [`Order::register_shipment`]）と
//! 決済 Webhook（[`Order::apply_payment_event`]）の 2 経路があり、
//! どちらも [`status`] の遷移表で正当性を判定する。
//!
//! ステータス類は保存済みデータとの互換のため文字列で保持する。

pub mod event;
pub mod number;
pub mod request;
pub mod status;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub use self::{
    event::{ActorType, OrderEvent, OrderEventId, OrderEventType},
    request::{CreateOrderInput, CreateOrderRequest, SealShape},
    status::{FulfillmentStatus, OrderStatus, PaymentStatus},
};
use crate::{
    DomainError,
    catalog::{Country, Font, Material},
    locale::I18nText,
    payment::{PaymentEvent, stripe_transition},
};

define_prefixed_id! {
    /// 注文 ID
    pub struct OrderId("ord", v7);
}

/// 決済プロバイダ
pub const PAYMENT_PROVIDER_STRIPE: &str = "stripe";

/// 通貨
pub const CURRENCY_JPY: &str = "JPY";

/// 受注チャネル
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    App,
    Web,
}

// ===== スナップショット =====

/// 印影
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SealSnapshot {
    pub line1:           String,
    pub line2:           String,
    pub shape:           String,
    pub font_key:        String,
    pub font_label_i18n: I18nText,
    pub font_version:    i64,
}

/// 材質
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MaterialSnapshot {
    pub key:            String,
    pub label_i18n:     I18nText,
    pub unit_price_jpy: i64,
    pub version:        i64,
}

/// 配送先
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShippingSnapshot {
    pub country_code:       String,
    pub country_label_i18n: I18nText,
    pub country_version:    i64,
    pub fee_jpy:            i64,
    pub recipient_name:     String,
    pub phone:              String,
    pub postal_code:        String,
    pub state:              String,
    pub city:               String,
    pub address_line1:      String,
    pub address_line2:      String,
}

/// 連絡先
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContactSnapshot {
    pub email:            String,
    pub preferred_locale: String,
}

/// 価格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub subtotal_jpy: i64,
    pub shipping_jpy: i64,
    pub tax_jpy:      i64,
    pub discount_jpy: i64,
    pub total_jpy:    i64,
    pub currency:     String,
}

impl Pricing {
    /// 小計と送料から価格を計算する（税・割引は 0、合計は 0 未満にならない）
    pub fn compute(subtotal_jpy: i64, shipping_jpy: i64) -> Self {
        let tax_jpy = 0;
        let discount_jpy = 0;
        Self {
            subtotal_jpy,
            shipping_jpy,
            tax_jpy,
            discount_jpy,
            total_jpy: (subtotal_jpy + shipping_jpy + tax_jpy - discount_jpy).max(0),
            currency: CURRENCY_JPY.to_string(),
        }
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::compute(0, 0)
    }
}

// ===== 決済・出荷の状態 =====

/// 決済の状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaymentState {
    pub provider:      String,
    pub status:        String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id:     Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_id: Option<String>,
}

/// 出荷の状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FulfillmentState {
    pub status:       String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier:      Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_no:  Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at:   Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

// ===== 注文 =====

/// 注文集約
///
/// `id` はドキュメント ID として保存されるため、本文には含めない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    #[serde(skip_serializing)]
    pub id:                OrderId,
    pub order_no:          String,
    pub channel:           String,
    pub locale:            String,
    pub status:            String,
    pub status_updated_at: DateTime<Utc>,
    pub seal:              SealSnapshot,
    pub material:          MaterialSnapshot,
    pub shipping:          ShippingSnapshot,
    pub contact:           ContactSnapshot,
    pub pricing:           Pricing,
    pub payment:           PaymentState,
    pub fulfillment:       FulfillmentState,
    pub idempotency_key:   String,
    pub terms_agreed:      bool,
    pub created_at:        DateTime<Utc>,
    pub updated_at:        DateTime<Utc>,
}

/// 注文の新規作成パラメータ
pub struct NewOrder<'a> {
    pub id:       OrderId,
    pub order_no: String,
    pub input:    &'a CreateOrderInput,
    pub font:     &'a Font,
    pub material: &'a Material,
    pub country:  &'a Country,
    pub now:      DateTime<Utc>,
}

impl Order {
    /// 新しい注文と `order_created` イベントを作る
    ///
    /// 初期状態は `pending_payment` / `unpaid` / `pending`。
    pub fn place(params: NewOrder<'_>) -> (Self, OrderEvent) {
        let NewOrder {
            id,
            order_no,
            input,
            font,
            material,
            country,
            now,
        } = params;

        let pricing = Pricing::compute(material.price_jpy, country.shipping_fee_jpy);
        let event = OrderEvent::new(OrderEventType::OrderCreated, ActorType::System, now)
            .with_payload(json!({
                "channel": input.channel,
                "total_jpy": pricing.total_jpy,
            }));

        let order = Self {
            id,
            order_no,
            channel: input.channel.to_string(),
            locale: input.locale.clone(),
            status: OrderStatus::PendingPayment.to_string(),
            status_updated_at: now,
            seal: SealSnapshot {
                line1:           input.seal.line1.clone(),
                line2:           input.seal.line2.clone(),
                shape:           input.seal.shape.to_string(),
                font_key:        font.key.clone(),
                font_label_i18n: font.label_i18n.clone(),
                font_version:    font.version,
            },
            material: MaterialSnapshot {
                key:            material.key.clone(),
                label_i18n:     material.label_i18n.clone(),
                unit_price_jpy: material.price_jpy,
                version:        material.version,
            },
            shipping: ShippingSnapshot {
                country_code:       country.code.clone(),
                country_label_i18n: country.label_i18n.clone(),
                country_version:    country.version,
                fee_jpy:            country.shipping_fee_jpy,
                recipient_name:     input.shipping.recipient_name.clone(),
                phone:              input.shipping.phone.clone(),
                postal_code:        input.shipping.postal_code.clone(),
                state:              input.shipping.state.clone(),
                city:               input.shipping.city.clone(),
                address_line1:      input.shipping.address_line1.clone(),
                address_line2:      input.shipping.address_line2.clone(),
            },
            contact: ContactSnapshot {
                email:            input.contact.email.clone(),
                preferred_locale: input.contact.preferred_locale.clone(),
            },
            pricing,
            payment: PaymentState {
                provider: PAYMENT_PROVIDER_STRIPE.to_string(),
                status: PaymentStatus::Unpaid.to_string(),
                ..Default::default()
            },
            fulfillment: FulfillmentState {
                status: FulfillmentStatus::Pending.to_string(),
                ..Default::default()
            },
            idempotency_key: input.idempotency_key.clone(),
            terms_agreed: input.terms_agreed,
            created_at: now,
            updated_at: now,
        };

        (order, event)
    }

    /// 注文作成レスポンス用の要約
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            order_id:           self.id.to_string(),
            order_no:           self.order_no.clone(),
            status:             self.status.clone(),
            payment_status:     self.payment.status.clone(),
            fulfillment_status: self.fulfillment.status.clone(),
            total_jpy:          self.pricing.total_jpy,
            currency:           self.pricing.currency.clone(),
        }
    }

    /// 管理画面からステータスを変更する
    ///
    /// 遷移表にない遷移は [`DomainError::InvalidTransition`] を返し、注文は変更しない。
    pub fn change_status(
        &mut self,
        next: &str,
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderEvent, DomainError> {
        let next = next.trim();
        if next.is_empty() {
            return Err(DomainError::Validation(
                "更新先のステータスを選択してください。".to_string(),
            ));
        }
        if self.status == next {
            return Err(DomainError::Validation(
                "現在と同じステータスには更新できません。".to_string(),
            ));
        }
        let next = self.ensure_transition(next)?;

        let before = self.status.clone();
        self.transition_to(next, now);
        self.updated_at = now;

        Ok(
            OrderEvent::new(OrderEventType::StatusChanged, ActorType::Admin, now)
                .with_actor_id(actor_id.trim())
                .with_transition(before, next.as_str()),
        )
    }

    /// 配送業者と追跡番号を登録し、必要ならステータスも進める
    ///
    /// `transition` が空または `"none"` の場合はステータスを変更しない。
    /// 指定する場合は遷移表で許可され、かつ出荷関連のステータスである必要がある。
    /// 登録内容が前回と同じでも `shipment_registered` イベントは必ず記録する。
    pub fn register_shipment(
        &mut self,
        carrier: &str,
        tracking_no: &str,
        transition: &str,
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        let carrier = carrier.trim();
        let tracking_no = tracking_no.trim();
        if carrier.is_empty() {
            return Err(DomainError::Validation(
                "配送業者を入力してください。".to_string(),
            ));
        }
        if tracking_no.is_empty() {
            return Err(DomainError::Validation(
                "追跡番号を入力してください。".to_string(),
            ));
        }

        let transition = transition.trim();
        let next = if transition.is_empty() || transition == "none" {
            None
        } else {
            if self.status == transition {
                return Err(DomainError::Validation(
                    "現在と同じステータスは指定できません。".to_string(),
                ));
            }
            let next = self.ensure_transition(transition)?;
            if !next.is_shipping_stage() {
                return Err(self.invalid_transition(transition));
            }
            Some(next)
        };

        let actor_id = actor_id.trim();
        let before = self.status.clone();

        self.fulfillment.carrier = Some(carrier.to_string());
        self.fulfillment.tracking_no = Some(tracking_no.to_string());
        self.updated_at = now;

        let mut events = vec![
            OrderEvent::new(OrderEventType::ShipmentRegistered, ActorType::Admin, now)
                .with_actor_id(actor_id)
                .with_note(format!("{carrier} / {tracking_no}"))
                .with_payload(json!({
                    "carrier": carrier,
                    "tracking_no": tracking_no,
                })),
        ];

        if let Some(next) = next {
            self.transition_to(next, now);
            events.push(
                OrderEvent::new(OrderEventType::StatusChanged, ActorType::Admin, now)
                    .with_actor_id(actor_id)
                    .with_transition(before, next.as_str()),
            );
        }

        Ok(events)
    }

    /// 決済イベントを適用する
    ///
    /// `payment.last_event_id` は常に更新する。ステータスは遷移表で許可される場合のみ進め、
    /// その場合 `payment.status` は導出値ではなく決済プロバイダの値を採用する。
    pub fn apply_payment_event(&mut self, event: &PaymentEvent, now: DateTime<Utc>) -> OrderEvent {
        let transition = stripe_transition(&event.event_type);
        let before = self.status.clone();

        self.payment.last_event_id = Some(event.provider_event_id.clone());
        if let Some(intent_id) = &event.payment_intent_id {
            self.payment.intent_id = Some(intent_id.clone());
        }
        if let Some(payment_status) = transition.payment_status {
            self.payment.status = payment_status.to_string();
        }

        let changed_to = transition
            .next_status
            .filter(|next| before != next.as_str() && status::can_transition(&before, next.as_str()));
        if let Some(next) = changed_to {
            self.transition_to(next, now);
            if let Some(payment_status) = transition.payment_status {
                self.payment.status = payment_status.to_string();
            }
        }
        self.updated_at = now;

        let mut payload = json!({
            "provider_event_id": event.provider_event_id,
            "event_type": event.event_type,
        });
        if let Some(intent_id) = &event.payment_intent_id {
            payload["payment_intent_id"] = json!(intent_id);
        }

        let audit = OrderEvent::new(transition.audit_event_type, ActorType::Webhook, now)
            .with_actor_id(PAYMENT_PROVIDER_STRIPE)
            .with_payload(payload);
        match changed_to {
            Some(next) => audit.with_transition(before, next.as_str()),
            None => audit,
        }
    }

    /// 空の支払い・出荷ステータスを導出値で埋める
    pub fn fill_derived_statuses(&mut self) {
        status::fill_derived_statuses(
            &self.status,
            &mut self.payment.status,
            &mut self.fulfillment.status,
        );
    }

    fn ensure_transition(&self, next: &str) -> Result<OrderStatus, DomainError> {
        match next.parse::<OrderStatus>() {
            Ok(parsed) if status::can_transition(&self.status, next) => Ok(parsed),
            _ => Err(self.invalid_transition(next)),
        }
    }

    fn invalid_transition(&self, next: &str) -> DomainError {
        DomainError::InvalidTransition {
            from_label: status::order_status_label(&self.status).to_string(),
            to_label:   status::order_status_label(next).to_string(),
        }
    }

    /// ステータスを変更し、導出ステータスと出荷日時を更新する
    fn transition_to(&mut self, next: OrderStatus, now: DateTime<Utc>) {
        self.status = next.to_string();
        self.status_updated_at = now;

        let derived = status::derive_statuses(&self.status, &self.fulfillment.status);
        self.payment.status = derived.payment_status;
        self.fulfillment.status = derived.fulfillment_status;

        match next {
            OrderStatus::Shipped => self.fulfillment.shipped_at = Some(now),
            OrderStatus::Delivered => self.fulfillment.delivered_at = Some(now),
            _ => {}
        }
    }
}

/// 注文作成レスポンス用の要約
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub order_id:           String,
    pub order_no:           String,
    pub status:             String,
    pub payment_status:     String,
    pub fulfillment_status: String,
    pub total_jpy:          i64,
    pub currency:           String,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use maplit::btreemap;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::order::request::{ContactInput, SealInput, ShippingInput};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 1, 0, 0).unwrap()
    }

    fn input() -> CreateOrderInput {
        CreateOrderInput {
            channel:         Channel::Web,
            locale:          "ja".to_string(),
            idempotency_key: "demo_key_123".to_string(),
            terms_agreed:    true,
            seal:            SealInput {
                line1:    "田".to_string(),
                line2:    "中".to_string(),
                shape:    SealShape::Square,
                font_key: "zen_maru_gothic".to_string(),
            },
            material_key:    "boxwood".to_string(),
            shipping:        ShippingInput {
                country_code:   "JP".to_string(),
                recipient_name: "山田 太郎".to_string(),
                phone:          "090-0000-0000".to_string(),
                postal_code:    "100-0001".to_string(),
                state:          "東京都".to_string(),
                city:           "千代田区".to_string(),
                address_line1:  "千代田1-1".to_string(),
                address_line2:  String::new(),
            },
            contact:         ContactInput {
                email:            "taro@example.com".to_string(),
                preferred_locale: "ja".to_string(),
            },
        }
    }

    #[fixture]
    fn order() -> Order {
        let font = Font {
            key:         "zen_maru_gothic".to_string(),
            label_i18n:  btreemap! { "ja".to_string() => "Zen丸ゴシック".to_string() },
            font_family: "'Zen Maru Gothic', sans-serif".to_string(),
            is_active:   true,
            sort_order:  0,
            version:     2,
        };
        let material = Material {
            key:              "boxwood".to_string(),
            label_i18n:       btreemap! { "ja".to_string() => "柘植".to_string() },
            description_i18n: I18nText::new(),
            photos:           Vec::new(),
            price_jpy:        3600,
            is_active:        true,
            sort_order:       0,
            version:          3,
            updated_at:       None,
        };
        let country = Country {
            code:             "JP".to_string(),
            label_i18n:       btreemap! { "ja".to_string() => "日本".to_string() },
            shipping_fee_jpy: 0,
            is_active:        true,
            sort_order:       0,
            version:          1,
        };
        let input = input();

        let (order, _) = Order::place(NewOrder {
            id: OrderId::from_string("ord_test"),
            order_no: "HF-20260210-0001".to_string(),
            input: &input,
            font: &font,
            material: &material,
            country: &country,
            now: now(),
        });
        order
    }

    fn with_status(mut order: Order, status: &str) -> Order {
        order.status = status.to_string();
        order.payment.status = String::new();
        order.fulfillment.status = String::new();
        order.fill_derived_statuses();
        order
    }

    // ===== 作成 =====

    #[rstest]
    fn test_作成時はスナップショットと初期ステータスを持つ(order: Order) {
        assert_eq!(order.status, "pending_payment");
        assert_eq!(order.payment.status, "unpaid");
        assert_eq!(order.payment.provider, "stripe");
        assert_eq!(order.fulfillment.status, "pending");
        assert_eq!(order.seal.font_version, 2);
        assert_eq!(order.material.version, 3);
        assert_eq!(order.pricing, Pricing::compute(3600, 0));
        assert_eq!(order.pricing.total_jpy, 3600);
        assert_eq!(order.status_updated_at, order.created_at);
    }

    #[test]
    fn test_作成イベントはチャネルと合計金額を記録する() {
        let font = Font {
            key:         "f".to_string(),
            label_i18n:  I18nText::new(),
            font_family: String::new(),
            is_active:   true,
            sort_order:  0,
            version:     1,
        };
        let material = Material {
            key:              "m".to_string(),
            label_i18n:       I18nText::new(),
            description_i18n: I18nText::new(),
            photos:           Vec::new(),
            price_jpy:        4800,
            is_active:        true,
            sort_order:       0,
            version:          1,
            updated_at:       None,
        };
        let country = Country {
            code:             "US".to_string(),
            label_i18n:       I18nText::new(),
            shipping_fee_jpy: 2000,
            is_active:        true,
            sort_order:       0,
            version:          1,
        };
        let input = input();

        let (_, event) = Order::place(NewOrder {
            id: OrderId::new(),
            order_no: "HF-20260210-0002".to_string(),
            input: &input,
            font: &font,
            material: &material,
            country: &country,
            now: now(),
        });

        assert_eq!(event.event_type, "order_created");
        assert_eq!(event.actor_type, "system");
        assert_eq!(event.payload, Some(json!({"channel": "web", "total_jpy": 6800})));
    }

    #[test]
    fn test_合計金額は0未満にならない() {
        assert_eq!(Pricing::compute(-500, 100).total_jpy, 0);
        assert_eq!(Pricing::compute(3600, 1200).total_jpy, 4800);
    }

    // ===== 管理画面からのステータス変更 =====

    #[rstest]
    fn test_ステータス変更で導出ステータスとイベントが更新される(order: Order) {
        // Arrange
        let mut order = with_status(order, "paid");
        let later = now() + Duration::hours(1);

        // Act
        let event = order.change_status("manufacturing", "admin.console", later).unwrap();

        // Assert
        assert_eq!(order.status, "manufacturing");
        assert_eq!(order.payment.status, "paid");
        assert_eq!(order.fulfillment.status, "manufacturing");
        assert_eq!(order.status_updated_at, later);
        assert_eq!(order.updated_at, later);
        assert_eq!(event.event_type, "status_changed");
        assert_eq!(event.actor_type, "admin");
        assert_eq!(event.before_status.as_deref(), Some("paid"));
        assert_eq!(event.after_status.as_deref(), Some("manufacturing"));
        assert_eq!(event.created_at, later);
    }

    #[rstest]
    fn test_不正な遷移は両方のラベルを含むエラーで注文は変わらない(order: Order) {
        let mut order = order;
        let before = order.clone();

        let result = order.change_status("delivered", "admin.console", now());

        assert_eq!(
            result,
            Err(DomainError::InvalidTransition {
                from_label: "支払い待ち".to_string(),
                to_label:   "配達完了".to_string(),
            })
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "支払い待ち から 配達完了 には遷移できません。"
        );
        assert_eq!(order, before);
    }

    #[rstest]
    #[case("", "更新先のステータスを選択してください。")]
    #[case("pending_payment", "現在と同じステータスには更新できません。")]
    fn test_ステータス変更の入力エラー(mut order: Order, #[case] next: &str, #[case] message: &str) {
        assert_eq!(
            order.change_status(next, "admin.console", now()),
            Err(DomainError::Validation(message.to_string()))
        );
    }

    #[rstest]
    fn test_出荷済みと配達完了で日時が記録される(order: Order) {
        let mut order = with_status(order, "manufacturing");
        let shipped_at = now() + Duration::days(1);
        let delivered_at = now() + Duration::days(3);

        order.change_status("shipped", "admin.console", shipped_at).unwrap();
        order.change_status("delivered", "admin.console", delivered_at).unwrap();

        assert_eq!(order.fulfillment.shipped_at, Some(shipped_at));
        assert_eq!(order.fulfillment.delivered_at, Some(delivered_at));
        assert_eq!(order.fulfillment.status, "delivered");
    }

    // ===== 出荷登録 =====

    #[rstest]
    fn test_出荷登録とステータス遷移で2件のイベントが同じ時刻で記録される(order: Order) {
        let mut order = with_status(order, "manufacturing");

        let events = order
            .register_shipment(" ヤマト運輸 ", "1234-5678", "shipped", "admin.console", now())
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "shipment_registered");
        assert_eq!(events[0].note.as_deref(), Some("ヤマト運輸 / 1234-5678"));
        assert_eq!(events[1].event_type, "status_changed");
        assert_eq!(events[1].after_status.as_deref(), Some("shipped"));
        assert_eq!(events[0].created_at, events[1].created_at);
        assert_eq!(order.fulfillment.carrier.as_deref(), Some("ヤマト運輸"));
        assert_eq!(order.fulfillment.status, "shipped");
        assert_eq!(order.fulfillment.shipped_at, Some(now()));
    }

    #[rstest]
    #[case("")]
    #[case("none")]
    fn test_遷移なしの出荷登録はステータスを変えない(order: Order, #[case] transition: &str) {
        let mut order = with_status(order, "paid");

        let events = order
            .register_shipment("佐川急便", "9999", transition, "admin.console", now())
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(order.status, "paid");
    }

    #[rstest]
    fn test_出荷関連でない遷移は出荷登録では指定できない(order: Order) {
        let mut order = with_status(order, "paid");
        let before = order.clone();

        let result = order.register_shipment("佐川急便", "9999", "refunded", "admin.console", now());

        assert_eq!(
            result,
            Err(DomainError::InvalidTransition {
                from_label: "支払い済み".to_string(),
                to_label:   "返金済み".to_string(),
            })
        );
        assert_eq!(order, before);
    }

    #[rstest]
    #[case("", "1", "", "配送業者を入力してください。")]
    #[case("ヤマト", " ", "", "追跡番号を入力してください。")]
    #[case("ヤマト", "1", "pending_payment", "現在と同じステータスは指定できません。")]
    fn test_出荷登録の入力エラー(
        mut order: Order,
        #[case] carrier: &str,
        #[case] tracking_no: &str,
        #[case] transition: &str,
        #[case] message: &str,
    ) {
        assert_eq!(
            order.register_shipment(carrier, tracking_no, transition, "admin.console", now()),
            Err(DomainError::Validation(message.to_string()))
        );
    }

    // ===== 決済イベント =====

    fn payment_event(event_type: &str) -> PaymentEvent {
        PaymentEvent {
            provider_event_id: "evt_stripe_1".to_string(),
            event_type:        event_type.to_string(),
            order_id:          Some("ord_test".to_string()),
            payment_intent_id: Some("pi_1".to_string()),
        }
    }

    #[rstest]
    fn test_支払い成功でpaidに遷移する(mut order: Order) {
        let event = order.apply_payment_event(&payment_event("payment_intent.succeeded"), now());

        assert_eq!(order.status, "paid");
        assert_eq!(order.payment.status, "paid");
        assert_eq!(order.payment.intent_id.as_deref(), Some("pi_1"));
        assert_eq!(order.payment.last_event_id.as_deref(), Some("evt_stripe_1"));
        assert_eq!(event.event_type, "payment_paid");
        assert_eq!(event.actor_type, "webhook");
        assert_eq!(event.actor_id.as_deref(), Some("stripe"));
        assert_eq!(event.before_status.as_deref(), Some("pending_payment"));
        assert_eq!(event.after_status.as_deref(), Some("paid"));
        assert_eq!(
            event.payload,
            Some(json!({
                "provider_event_id": "evt_stripe_1",
                "event_type": "payment_intent.succeeded",
                "payment_intent_id": "pi_1",
            }))
        );
    }

    #[rstest]
    fn test_遷移表にない遷移はステータスを変えず決済状態のみ更新する(order: Order) {
        let mut order = with_status(order, "delivered");

        let event = order.apply_payment_event(&payment_event("payment_intent.payment_failed"), now());

        assert_eq!(order.status, "delivered");
        assert_eq!(order.payment.status, "failed");
        assert_eq!(event.event_type, "payment_failed");
        assert_eq!(event.before_status, None);
        assert_eq!(event.after_status, None);
    }

    #[rstest]
    fn test_未知のイベントは記録のみ(mut order: Order) {
        let event = order.apply_payment_event(&payment_event("customer.created"), now());

        assert_eq!(order.status, "pending_payment");
        assert_eq!(order.payment.status, "unpaid");
        assert_eq!(order.payment.last_event_id.as_deref(), Some("evt_stripe_1"));
        assert_eq!(event.event_type, "payment_event_recorded");
    }

    #[rstest]
    fn test_返金では出荷ステータスを保持する(order: Order) {
        let mut order = with_status(order, "shipped");

        order.apply_payment_event(&payment_event("charge.refunded"), now());

        assert_eq!(order.status, "refunded");
        assert_eq!(order.payment.status, "refunded");
        assert_eq!(order.fulfillment.status, "shipped");
    }

    #[rstest]
    fn test_要約は注文の現在値を返す(order: Order) {
        let summary = order.summary();

        assert_eq!(summary.order_id, "ord_test");
        assert_eq!(summary.order_no, "HF-20260210-0001");
        assert_eq!(summary.total_jpy, 3600);
        assert_eq!(summary.currency, "JPY");
    }
}
