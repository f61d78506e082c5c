//! # モックデータ
//!
//! `mock` モードで起動したときにインメモリストアへ投入する注文とカタログ。
//!
//! 7 件の注文は 6 か国（JP, US, SG, CA, GB, AU）とすべての終端ステータスを含み、
//! それぞれイベント履歴を持つ。日時は投入時刻からの相対で決める。

use chrono::{DateTime, Duration, Utc};
use hanko_domain::order::{CURRENCY_JPY, PAYMENT_PROVIDER_STRIPE};
use hanko_infra::{
    InfraError,
    db::TransactionManager,
    seed::demo_catalog_documents,
    store::collections,
};
use serde_json::{Value as JsonValue, json};

struct MockOrder {
    id:         &'static str,
    order_no:   &'static str,
    channel:    &'static str,
    locale:     &'static str,
    status:     &'static str,
    country:    &'static str,
    email:      &'static str,
    seal:       (&'static str, &'static str),
    material:   (&'static str, &'static str, &'static str),
    total_jpy:  i64,
    shipment:   Option<(&'static str, &'static str)>,
    created_h:  i64,
    updated_h:  i64,
    events:     &'static [MockEvent],
}

struct MockEvent {
    event_type: &'static str,
    actor:      (&'static str, &'static str),
    transition: Option<(&'static str, &'static str)>,
    note:       Option<&'static str>,
    hours_ago:  i64,
}

const API: (&str, &str) = ("system", "api");
const STRIPE: (&str, &str) = ("webhook", "stripe");
const CONSOLE: (&str, &str) = ("admin", "admin.console");

const fn created(note: &'static str, hours_ago: i64) -> MockEvent {
    MockEvent {
        event_type: "order_created",
        actor: API,
        transition: None,
        note: Some(note),
        hours_ago,
    }
}

const fn paid(hours_ago: i64) -> MockEvent {
    MockEvent {
        event_type: "payment_paid",
        actor: STRIPE,
        transition: Some(("pending_payment", "paid")),
        note: None,
        hours_ago,
    }
}

const fn changed(
    actor: (&'static str, &'static str),
    before: &'static str,
    after: &'static str,
    hours_ago: i64,
) -> MockEvent {
    MockEvent {
        event_type: "status_changed",
        actor,
        transition: Some((before, after)),
        note: None,
        hours_ago,
    }
}

const BOXWOOD: (&str, &str, &str) = ("boxwood", "柘植", "Boxwood");
const BLACK_BUFFALO: (&str, &str, &str) = ("black_buffalo", "黒水牛", "Black Buffalo");
const TITANIUM: (&str, &str, &str) = ("titanium", "チタン", "Titanium");

const ORDERS: &[MockOrder] = &[
    MockOrder {
        id:        "ord_1007",
        order_no:  "HF-20260209-1007",
        channel:   "web",
        locale:    "ja",
        status:    "manufacturing",
        country:   "JP",
        email:     "ito@example.com",
        seal:      ("伊", "藤"),
        material:  BLACK_BUFFALO,
        total_jpy: 5400,
        shipment:  None,
        created_h: 9,
        updated_h: 4,
        events:    &[
            created("注文を受付", 9),
            paid(6),
            changed(CONSOLE, "paid", "manufacturing", 4),
        ],
    },
    MockOrder {
        id:        "ord_1006",
        order_no:  "HF-20260209-1006",
        channel:   "app",
        locale:    "en",
        status:    "paid",
        country:   "US",
        email:     "jane.smith@example.com",
        seal:      ("JA", "NE"),
        material:  TITANIUM,
        total_jpy: 11600,
        shipment:  None,
        created_h: 12,
        updated_h: 2,
        events:    &[created("Order accepted", 12), paid(2)],
    },
    MockOrder {
        id:        "ord_1005",
        order_no:  "HF-20260209-1005",
        channel:   "web",
        locale:    "ja",
        status:    "shipped",
        country:   "SG",
        email:     "tanaka@example.com",
        seal:      ("田", "中"),
        material:  BOXWOOD,
        total_jpy: 4900,
        shipment:  Some(("DHL", "SGP-824901")),
        created_h: 36,
        updated_h: 26,
        events:    &[
            created("注文を受付", 36),
            paid(31),
            changed(CONSOLE, "paid", "manufacturing", 29),
            MockEvent {
                event_type: "shipment_registered",
                actor:      CONSOLE,
                transition: None,
                note:       Some("DHL / SGP-824901"),
                hours_ago:  26,
            },
            changed(CONSOLE, "manufacturing", "shipped", 26),
        ],
    },
    MockOrder {
        id:        "ord_1004",
        order_no:  "HF-20260208-1004",
        channel:   "app",
        locale:    "ja",
        status:    "delivered",
        country:   "JP",
        email:     "kato@example.com",
        seal:      ("加", "藤"),
        material:  BOXWOOD,
        total_jpy: 4200,
        shipment:  Some(("ヤマト運輸", "YMT-99120")),
        created_h: 96,
        updated_h: 72,
        events:    &[
            created("注文を受付", 96),
            changed(CONSOLE, "shipped", "delivered", 72),
        ],
    },
    MockOrder {
        id:        "ord_1003",
        order_no:  "HF-20260208-1003",
        channel:   "web",
        locale:    "en",
        status:    "pending_payment",
        country:   "CA",
        email:     "chris@example.com",
        seal:      ("CH", "RI"),
        material:  TITANIUM,
        total_jpy: 11800,
        shipment:  None,
        created_h: 30,
        updated_h: 8,
        events:    &[created("Order accepted", 30)],
    },
    MockOrder {
        id:        "ord_1002",
        order_no:  "HF-20260207-1002",
        channel:   "app",
        locale:    "ja",
        status:    "refunded",
        country:   "GB",
        email:     "suzuki@example.com",
        seal:      ("鈴", "木"),
        material:  BLACK_BUFFALO,
        total_jpy: 6900,
        shipment:  Some(("Royal Mail", "GB-12400")),
        created_h: 150,
        updated_h: 130,
        events:    &[
            created("注文を受付", 150),
            changed(CONSOLE, "shipped", "refunded", 130),
        ],
    },
    MockOrder {
        id:        "ord_1001",
        order_no:  "HF-20260207-1001",
        channel:   "web",
        locale:    "ja",
        status:    "canceled",
        country:   "AU",
        email:     "yamada@example.com",
        seal:      ("山", "田"),
        material:  BOXWOOD,
        total_jpy: 5600,
        shipment:  None,
        created_h: 120,
        updated_h: 80,
        events:    &[
            created("注文を受付", 120),
            changed(("system", "scheduler"), "pending_payment", "canceled", 80),
        ],
    },
];

/// 材質の (キー, バージョン, 有効)
const MATERIAL_STATES: &[(&str, i64, bool)] = &[
    ("boxwood", 3, true),
    ("black_buffalo", 5, true),
    ("titanium", 2, false),
];

fn order_document(order: &MockOrder, now: DateTime<Utc>) -> JsonValue {
    let at = |hours: i64| now - Duration::hours(hours);
    let (material_key, label_ja, label_en) = order.material;
    let (carrier, tracking_no) = order.shipment.unzip();

    // 支払い・出荷ステータスは読み込み時に導出する
    json!({
        "order_no": order.order_no,
        "channel": order.channel,
        "locale": order.locale,
        "status": order.status,
        "status_updated_at": at(order.updated_h),
        "seal": {
            "line1": order.seal.0,
            "line2": order.seal.1,
            "shape": "square",
            "font_key": "zen_maru_gothic",
        },
        "material": {
            "key": material_key,
            "label_i18n": {"ja": label_ja, "en": label_en},
        },
        "shipping": {"country_code": order.country},
        "contact": {"email": order.email, "preferred_locale": order.locale},
        "pricing": {"total_jpy": order.total_jpy, "currency": CURRENCY_JPY},
        "payment": {"provider": PAYMENT_PROVIDER_STRIPE},
        "fulfillment": {"carrier": carrier, "tracking_no": tracking_no},
        "terms_agreed": true,
        "created_at": at(order.created_h),
        "updated_at": at(order.updated_h),
    })
}

fn event_document(event: &MockEvent, now: DateTime<Utc>) -> JsonValue {
    let (actor_type, actor_id) = event.actor;
    let mut data = json!({
        "type": event.event_type,
        "actor_type": actor_type,
        "actor_id": actor_id,
        "created_at": now - Duration::hours(event.hours_ago),
    });
    if let Some((before, after)) = event.transition {
        data["before_status"] = json!(before);
        data["after_status"] = json!(after);
    }
    if let Some(note) = event.note {
        data["note"] = json!(note);
    }
    data
}

/// モックの注文・イベント・カタログを 1 トランザクションで投入する
pub async fn seed_mock_data(
    tx_manager: &dyn TransactionManager,
    now: DateTime<Utc>,
) -> Result<(), InfraError> {
    let mut tx = tx_manager.begin().await?;

    for (collection, id, data) in demo_catalog_documents(now) {
        tx.set(collection, &id, data).await?;
    }
    for &(key, version, is_active) in MATERIAL_STATES {
        tx.merge(
            collections::MATERIALS,
            key,
            json!({"version": version, "is_active": is_active}),
        )
        .await?;
    }

    for order in ORDERS {
        tx.set(collections::ORDERS, order.id, order_document(order, now))
            .await?;
        let events = collections::order_events(order.id);
        for (index, event) in order.events.iter().enumerate() {
            let id = format!("evt_{}_{:02}", order.id.trim_start_matches("ord_"), index + 1);
            tx.set(&events, &id, event_document(event, now)).await?;
        }
    }

    tx.commit().await?;

    tracing::info!(orders = ORDERS.len(), "モックデータを投入しました");
    Ok(())
}
