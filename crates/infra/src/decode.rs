//! # 保存データの寛容なデコード
//!
//! ストア上のドキュメントは型が揺れている（整数が浮動小数点や文字列で入っている、
//! 古いフィールド名が残っている等）ため、JSON から直接デシリアライズせず、
//! フィールドごとに寛容に読み取ってドメインの型に変換する。
//!
//! - 整数: JSON の整数・符号なし整数・浮動小数点（切り捨て）・数値文字列
//! - 文字列: 前後の空白を除く。文字列以外は空文字列
//! - 日時: RFC 3339 文字列
//!
//! 書き込みは常にドメインの型から行うため、読み取った値は正規の型で保存し直される。

use chrono::{DateTime, TimeDelta, Utc};
use hanko_domain::{
    catalog::{Country, Font, Material, MaterialPhoto, material::sort_photos},
    idempotency::{IDEMPOTENCY_RETENTION_DAYS, IdempotencyRecord},
    locale::{I18nText, LocaleConfig, normalize_i18n},
    order::{
        CURRENCY_JPY, ContactSnapshot, FulfillmentState, MaterialSnapshot, Order, OrderEvent,
        OrderId, OrderStatus, PAYMENT_PROVIDER_STRIPE, PaymentState, Pricing, SealSnapshot,
        ShippingSnapshot,
    },
    payment::{WEBHOOK_EVENT_RETENTION_DAYS, WebhookEventRecord},
};
use maplit::btreemap;
use serde_json::Value as JsonValue;

use crate::store::StoredDocument;

// ===== フィールドの読み取り =====

/// 整数として読み取る
pub fn read_i64(value: Option<&JsonValue>) -> Option<i64> {
    match value? {
        JsonValue::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().and_then(|n| i64::try_from(n).ok()))
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        JsonValue::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

/// 文字列として読み取る（前後の空白を除く）
pub fn read_string(value: Option<&JsonValue>) -> String {
    value
        .and_then(JsonValue::as_str)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// 空でない文字列のみを読み取る
pub fn read_non_empty(value: Option<&JsonValue>) -> Option<String> {
    Some(read_string(value)).filter(|text| !text.is_empty())
}

pub fn read_bool(value: Option<&JsonValue>) -> Option<bool> {
    value.and_then(JsonValue::as_bool)
}

/// RFC 3339 の日時として読み取る
pub fn read_timestamp(value: Option<&JsonValue>) -> Option<DateTime<Utc>> {
    value
        .and_then(JsonValue::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text.trim()).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// ロケール別テキストとして読み取る（文字列以外の値は無視）
pub fn read_i18n(value: Option<&JsonValue>) -> I18nText {
    value
        .and_then(JsonValue::as_object)
        .map(|map| {
            normalize_i18n(
                map.iter()
                    .filter_map(|(key, value)| value.as_str().map(|text| (key, text))),
            )
        })
        .unwrap_or_default()
}

/// `label_i18n` が空なら旧形式の単一文字列を `ja` として扱う
fn read_i18n_or_legacy(data: &JsonValue, i18n_field: &str, legacy_field: &str) -> I18nText {
    let values = read_i18n(data.get(i18n_field));
    if !values.is_empty() {
        return values;
    }
    match read_non_empty(data.get(legacy_field)) {
        Some(legacy) => btreemap! { "ja".to_string() => legacy },
        None => I18nText::new(),
    }
}

// ===== カタログ =====

/// 公開ロケール設定（ドキュメントがなければフォールバック）
pub fn decode_locale_config(document: Option<&StoredDocument>) -> LocaleConfig {
    let Some(document) = document else {
        return LocaleConfig::fallback();
    };

    let supported = document
        .data
        .get("supported_locales")
        .and_then(JsonValue::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(JsonValue::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    LocaleConfig::new(supported, &read_string(document.data.get("default_locale")))
}

/// 書体
///
/// `is_active` が欠けている書体は無効として扱う。
pub fn decode_font(document: &StoredDocument) -> Font {
    let data = &document.data;
    let font_family = read_non_empty(data.get("font_family"))
        .unwrap_or_else(|| read_string(data.get("family")));

    Font {
        key: document.id.clone(),
        label_i18n: read_i18n_or_legacy(data, "label_i18n", "label"),
        font_family,
        is_active: read_bool(data.get("is_active")).unwrap_or(false),
        sort_order: read_i64(data.get("sort_order")).unwrap_or(0),
        version: read_i64(data.get("version")).unwrap_or(1),
    }
}

/// 材質
///
/// `active_if_missing` は `is_active` が欠けているときの扱い。
/// 公開 API は無効、管理画面は有効として扱う。
pub fn decode_material(document: &StoredDocument, active_if_missing: bool) -> Material {
    let data = &document.data;
    let price_jpy = read_i64(data.get("price_jpy"))
        .or_else(|| read_i64(data.get("price")))
        .unwrap_or(0);

    let mut photos = data
        .get("photos")
        .and_then(JsonValue::as_array)
        .map(|photos| photos.iter().map(decode_photo).collect::<Vec<_>>())
        .unwrap_or_default();
    sort_photos(&mut photos);

    Material {
        key: document.id.clone(),
        label_i18n: read_i18n_or_legacy(data, "label_i18n", "label"),
        description_i18n: read_i18n_or_legacy(data, "description_i18n", "description"),
        photos,
        price_jpy,
        is_active: read_bool(data.get("is_active")).unwrap_or(active_if_missing),
        sort_order: read_i64(data.get("sort_order")).unwrap_or(0),
        version: read_i64(data.get("version")).unwrap_or(1),
        updated_at: read_timestamp(data.get("updated_at")).or(Some(document.updated_at)),
    }
}

fn decode_photo(data: &JsonValue) -> MaterialPhoto {
    MaterialPhoto {
        asset_id:     read_string(data.get("asset_id")),
        storage_path: read_string(data.get("storage_path")),
        alt_i18n:     read_i18n(data.get("alt_i18n")),
        sort_order:   read_i64(data.get("sort_order")).unwrap_or(0),
        is_primary:   read_bool(data.get("is_primary")).unwrap_or(false),
        width:        read_i64(data.get("width")).unwrap_or(0),
        height:       read_i64(data.get("height")).unwrap_or(0),
    }
}

/// 配送国
///
/// ドキュメント ID は大文字に揃える。
pub fn decode_country(document: &StoredDocument) -> Country {
    let data = &document.data;
    let shipping_fee_jpy = read_i64(data.get("shipping_fee_jpy"))
        .or_else(|| read_i64(data.get("shipping")))
        .unwrap_or(0);

    Country {
        code: document.id.trim().to_uppercase(),
        label_i18n: read_i18n_or_legacy(data, "label_i18n", "label"),
        shipping_fee_jpy,
        is_active: read_bool(data.get("is_active")).unwrap_or(false),
        sort_order: read_i64(data.get("sort_order")).unwrap_or(0),
        version: read_i64(data.get("version")).unwrap_or(1),
    }
}

// ===== 注文 =====

/// 注文
///
/// 欠けている値は次のように補う:
///
/// - `order_no` → ドキュメント ID
/// - `locale` → `default_locale`
/// - `status` → `pending_payment`
/// - `updated_at` → `created_at`、`status_updated_at` → `updated_at`
/// - 支払い・出荷ステータス → ステータスからの導出値
/// - `pricing.total_jpy` → 最上位の `total_jpy`
pub fn decode_order(document: &StoredDocument, default_locale: &str) -> Order {
    let data = &document.data;
    let empty = JsonValue::Null;
    let section = |name: &str| data.get(name).filter(|v| v.is_object()).unwrap_or(&empty);

    let seal = section("seal");
    let material = section("material");
    let shipping = section("shipping");
    let contact = section("contact");
    let pricing = section("pricing");
    let payment = section("payment");
    let fulfillment = section("fulfillment");

    let created_at = read_timestamp(data.get("created_at")).unwrap_or(document.created_at);
    let updated_at = read_timestamp(data.get("updated_at")).unwrap_or(created_at);
    let status_updated_at = read_timestamp(data.get("status_updated_at")).unwrap_or(updated_at);

    let mut material_labels = read_i18n_or_legacy(material, "label_i18n", "label");
    if material_labels.is_empty() {
        if let Some(label) = read_non_empty(data.get("material_label_ja")) {
            material_labels.insert("ja".to_string(), label);
        }
    }

    let subtotal_jpy = read_i64(pricing.get("subtotal_jpy")).unwrap_or(0);
    let shipping_jpy = read_i64(pricing.get("shipping_jpy")).unwrap_or(0);
    let total_jpy = read_i64(pricing.get("total_jpy"))
        .or_else(|| read_i64(data.get("total_jpy")))
        .unwrap_or(0);

    let mut order = Order {
        id: OrderId::from_string(document.id.clone()),
        order_no: read_non_empty(data.get("order_no")).unwrap_or_else(|| document.id.clone()),
        channel: read_string(data.get("channel")),
        locale: read_non_empty(data.get("locale")).unwrap_or_else(|| default_locale.to_string()),
        status: read_non_empty(data.get("status"))
            .unwrap_or_else(|| OrderStatus::PendingPayment.to_string()),
        status_updated_at,
        seal: SealSnapshot {
            line1:           read_string(seal.get("line1")),
            line2:           read_string(seal.get("line2")),
            shape:           read_string(seal.get("shape")),
            font_key:        read_string(seal.get("font_key")),
            font_label_i18n: read_i18n(seal.get("font_label_i18n")),
            font_version:    read_i64(seal.get("font_version")).unwrap_or(0),
        },
        material: MaterialSnapshot {
            key:            read_string(material.get("key")),
            label_i18n:     material_labels,
            unit_price_jpy: read_i64(material.get("unit_price_jpy")).unwrap_or(subtotal_jpy),
            version:        read_i64(material.get("version")).unwrap_or(0),
        },
        shipping: ShippingSnapshot {
            country_code:       read_string(shipping.get("country_code")).to_uppercase(),
            country_label_i18n: read_i18n(shipping.get("country_label_i18n")),
            country_version:    read_i64(shipping.get("country_version")).unwrap_or(0),
            fee_jpy:            read_i64(shipping.get("fee_jpy")).unwrap_or(shipping_jpy),
            recipient_name:     read_string(shipping.get("recipient_name")),
            phone:              read_string(shipping.get("phone")),
            postal_code:        read_string(shipping.get("postal_code")),
            state:              read_string(shipping.get("state")),
            city:               read_string(shipping.get("city")),
            address_line1:      read_string(shipping.get("address_line1")),
            address_line2:      read_string(shipping.get("address_line2")),
        },
        contact: ContactSnapshot {
            email:            read_string(contact.get("email")),
            preferred_locale: read_string(contact.get("preferred_locale")),
        },
        pricing: Pricing {
            subtotal_jpy,
            shipping_jpy,
            tax_jpy: read_i64(pricing.get("tax_jpy")).unwrap_or(0),
            discount_jpy: read_i64(pricing.get("discount_jpy")).unwrap_or(0),
            total_jpy,
            currency: read_non_empty(pricing.get("currency"))
                .unwrap_or_else(|| CURRENCY_JPY.to_string()),
        },
        payment: PaymentState {
            provider:      read_non_empty(payment.get("provider"))
                .unwrap_or_else(|| PAYMENT_PROVIDER_STRIPE.to_string()),
            status:        read_string(payment.get("status")),
            intent_id:     read_non_empty(payment.get("intent_id")),
            last_event_id: read_non_empty(payment.get("last_event_id")),
        },
        fulfillment: FulfillmentState {
            status:       read_string(fulfillment.get("status")),
            carrier:      read_non_empty(fulfillment.get("carrier")),
            tracking_no:  read_non_empty(fulfillment.get("tracking_no")),
            shipped_at:   read_timestamp(fulfillment.get("shipped_at")),
            delivered_at: read_timestamp(fulfillment.get("delivered_at")),
        },
        idempotency_key: read_string(data.get("idempotency_key")),
        terms_agreed: read_bool(data.get("terms_agreed")).unwrap_or(false),
        created_at,
        updated_at,
    };
    order.fill_derived_statuses();
    order
}

/// 注文イベント
///
/// 種別が欠けていれば `event`。メモが空ならペイロードの配送情報から組み立てる。
pub fn decode_event(document: &StoredDocument) -> OrderEvent {
    let data = &document.data;
    let payload = data.get("payload").filter(|v| v.is_object()).cloned();

    let note = read_non_empty(data.get("note")).or_else(|| {
        let payload = payload.as_ref()?;
        let carrier = read_string(payload.get("carrier"));
        let tracking_no = read_string(payload.get("tracking_no"));
        (!carrier.is_empty() || !tracking_no.is_empty())
            .then(|| format!("{carrier} / {tracking_no}").trim().to_string())
    });

    OrderEvent {
        id: document.id.clone(),
        event_type: read_non_empty(data.get("type")).unwrap_or_else(|| "event".to_string()),
        actor_type: read_string(data.get("actor_type")),
        actor_id: read_non_empty(data.get("actor_id")),
        before_status: read_non_empty(data.get("before_status")),
        after_status: read_non_empty(data.get("after_status")),
        note,
        payload,
        created_at: read_timestamp(data.get("created_at")).unwrap_or(document.created_at),
    }
}

// ===== 冪等キー・Webhook・採番 =====

pub fn decode_idempotency_record(document: &StoredDocument) -> IdempotencyRecord {
    let data = &document.data;
    let created_at = read_timestamp(data.get("created_at")).unwrap_or(document.created_at);

    IdempotencyRecord {
        channel: read_string(data.get("channel")),
        idempotency_key: read_string(data.get("idempotency_key")),
        request_hash: read_string(data.get("request_hash")),
        order_id: OrderId::from_string(read_string(data.get("order_id"))),
        created_at,
        expire_at: read_timestamp(data.get("expire_at"))
            .unwrap_or(created_at + TimeDelta::days(IDEMPOTENCY_RETENTION_DAYS)),
    }
}

pub fn decode_webhook_record(document: &StoredDocument) -> WebhookEventRecord {
    let data = &document.data;
    let created_at = read_timestamp(data.get("created_at")).unwrap_or(document.created_at);

    WebhookEventRecord {
        provider_event_id: document.id.clone(),
        provider: read_non_empty(data.get("provider"))
            .unwrap_or_else(|| PAYMENT_PROVIDER_STRIPE.to_string()),
        event_type: read_string(data.get("event_type")),
        order_id: read_non_empty(data.get("order_id")),
        processed: read_bool(data.get("processed")).unwrap_or(false),
        created_at,
        expire_at: read_timestamp(data.get("expire_at"))
            .unwrap_or(created_at + TimeDelta::days(WEBHOOK_EVENT_RETENTION_DAYS)),
    }
}

/// 採番カウンターの最終番号（なければ 0）
pub fn decode_last_seq(document: Option<&StoredDocument>) -> i64 {
    document
        .and_then(|document| read_i64(document.data.get("last_seq")))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn document(id: &str, data: JsonValue) -> StoredDocument {
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        StoredDocument {
            id: id.to_string(),
            data,
            created_at: at,
            updated_at: at,
        }
    }

    #[rstest]
    #[case(json!(3600), Some(3600))]
    #[case(json!(3600.9), Some(3600))]
    #[case(json!(9_000_000_000_u64), Some(9_000_000_000))]
    #[case(json!(" 4800 "), Some(4800))]
    #[case(json!("9800.0"), Some(9800))]
    #[case(json!("abc"), None)]
    #[case(json!(true), None)]
    fn test_整数の寛容な読み取り(#[case] value: JsonValue, #[case] expected: Option<i64>) {
        assert_eq!(read_i64(Some(&value)), expected);
    }

    #[test]
    fn test_公開設定がなければフォールバック() {
        assert_eq!(decode_locale_config(None), LocaleConfig::fallback());
    }

    #[test]
    fn test_公開設定は正規化される() {
        let doc = document(
            "public",
            json!({"supported_locales": ["EN", "ja", 3], "default_locale": "en"}),
        );

        let config = decode_locale_config(Some(&doc));

        assert_eq!(config.supported_locales(), &["en", "ja"]);
        assert_eq!(config.default_locale(), "en");
    }

    #[test]
    fn test_材質は旧フィールドにフォールバックし写真を並べ替える() {
        let doc = document(
            "boxwood",
            json!({
                "label": "柘植",
                "price": "3600",
                "photos": [
                    {"asset_id": "b", "sort_order": 1, "storage_path": "materials/b.webp"},
                    {"asset_id": "a", "sort_order": 1.0, "is_primary": true}
                ]
            }),
        );

        let material = decode_material(&doc, true);

        assert_eq!(material.label_i18n, btreemap! { "ja".to_string() => "柘植".to_string() });
        assert_eq!(material.price_jpy, 3600);
        assert_eq!(material.version, 1);
        assert!(material.is_active);
        assert_eq!(material.photos[0].asset_id, "a");
        assert!(!decode_material(&doc, false).is_active);
    }

    #[test]
    fn test_配送国は旧フィールドの送料を読み国コードを大文字にする() {
        let doc = document("jp", json!({"shipping": 0, "is_active": true}));

        let country = decode_country(&doc);

        assert_eq!(country.code, "JP");
        assert_eq!(country.shipping_fee_jpy, 0);
        assert!(country.is_active);
    }

    #[test]
    fn test_書体はfamilyにフォールバックする() {
        let doc = document("zen_maru_gothic", json!({"family": "Zen Maru Gothic"}));

        let font = decode_font(&doc);

        assert_eq!(font.font_family, "Zen Maru Gothic");
        assert!(!font.is_active);
    }

    #[test]
    fn test_欠けた注文フィールドは補われる() {
        let doc = document(
            "ord_1",
            json!({
                "status": "shipped",
                "total_jpy": 4800.0,
                "shipping": {"country_code": "us"},
                "created_at": "2026-02-10T01:00:00Z"
            }),
        );

        let order = decode_order(&doc, "ja");

        assert_eq!(order.order_no, "ord_1");
        assert_eq!(order.locale, "ja");
        assert_eq!(order.pricing.total_jpy, 4800);
        assert_eq!(order.pricing.currency, "JPY");
        assert_eq!(order.payment.status, "paid");
        assert_eq!(order.fulfillment.status, "shipped");
        assert_eq!(order.shipping.country_code, "US");
        assert_eq!(order.updated_at, order.created_at);
        assert_eq!(order.status_updated_at, order.created_at);
    }

    #[test]
    fn test_ステータスがなければ支払い待ち() {
        let order = decode_order(&document("ord_1", json!({})), "en");

        assert_eq!(order.status, "pending_payment");
        assert_eq!(order.payment.status, "unpaid");
        assert_eq!(order.locale, "en");
    }

    #[test]
    fn test_イベントのメモはペイロードの配送情報から補われる() {
        let doc = document(
            "evt_1",
            json!({
                "type": "shipment_registered",
                "payload": {"carrier": "ヤマト運輸", "tracking_no": "1234"}
            }),
        );

        let event = decode_event(&doc);

        assert_eq!(event.note.as_deref(), Some("ヤマト運輸 / 1234"));
        assert_eq!(event.created_at, doc.created_at);
    }

    #[test]
    fn test_種別のないイベントはeventになる() {
        assert_eq!(decode_event(&document("evt_1", json!({}))).event_type, "event");
    }

    #[test]
    fn test_カウンターがなければ0() {
        assert_eq!(decode_last_seq(None), 0);
        assert_eq!(
            decode_last_seq(Some(&document("202602", json!({"last_seq": 7.0})))),
            7
        );
    }
}
