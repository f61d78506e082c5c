//! 注文 API 統合テスト
//!
//! インメモリストアにデモカタログを投入し、ルーター全体をリクエスト単位で検証する。
//!
//! ## 実行方法
//!
//! ```bash
//! cargo test -p hanko-order-api --test order_api_test
//! ```
//!
//! ## テストケース
//!
//! - カタログ: ロケール解決、対応外ロケール、写真 URL
//! - 注文作成: 201 → 同じリクエストで 200 リプレイ → 内容違いで 409
//! - 注文作成: 参照エラー、ロケールエラー、バリデーションエラー、JSON エラー
//! - 決済 Webhook: 署名検証、適用、再送時の処理済み応答
//! - 未定義のパスとメソッド

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::{DateTime, TimeZone, Utc};
use hanko_domain::clock::FixedClock;
use hanko_infra::{memory::InMemoryDocumentStore, seed::seed_demo_catalog, stripe::sign_payload};
use hanko_order_api::{build_app, config::ApiConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;

const WEBHOOK_SECRET: &str = "whsec_test";

/// 2026-02-10 12:00 JST
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 10, 3, 0, 0).unwrap()
}

async fn app() -> Router {
    let store = Arc::new(InMemoryDocumentStore::new());
    seed_demo_catalog(store.as_ref(), now()).await.unwrap();

    let config = ApiConfig {
        host:                  "127.0.0.1".to_string(),
        port:                  0,
        project_id:            None,
        assets_bucket:         "hanko-assets".to_string(),
        stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
        database_url:          None,
    };

    build_app(
        &config,
        store.clone(),
        store,
        Arc::new(FixedClock::new(now())),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &JsonValue) -> Request<Body> {
    post_raw(uri, body.to_string())
}

fn post_raw(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn webhook(payload: &[u8], signature: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/v1/payments/stripe/webhook")
        .header("stripe-signature", signature)
        .body(Body::from(payload.to_vec()))
        .unwrap()
}

fn order_request() -> JsonValue {
    json!({
        "channel": "web",
        "locale": "ja",
        "idempotency_key": "demo_key_123",
        "terms_agreed": true,
        "seal": {"line1": "田", "line2": "中", "shape": "square", "font_key": "zen_maru_gothic"},
        "material_key": "boxwood",
        "shipping": {
            "country_code": "jp",
            "recipient_name": "山田 太郎",
            "phone": "090-0000-0000",
            "postal_code": "100-0001",
            "state": "東京都",
            "city": "千代田区",
            "address_line1": "千代田1-1"
        },
        "contact": {"email": "taro@example.com", "preferred_locale": "ja"}
    })
}

fn error_code(body: &JsonValue) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

// ===== ヘルスチェック・フォールバック =====

#[tokio::test]
async fn test_ヘルスチェックはokを返す() {
    let app = app().await;

    let (status, body) = send(&app, get("/healthz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_未定義のパスは404() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/unknown")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "not_found");
}

#[tokio::test]
async fn test_未対応のメソッドは405() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/orders")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body,
        json!({"error": {"code": "method_not_allowed", "message": "method not allowed"}})
    );
}

#[tokio::test]
async fn test_レスポンスにリクエストidが付与される() {
    let app = app().await;

    let response = app.oneshot(get("/healthz")).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

// ===== カタログ =====

#[tokio::test]
async fn test_公開設定を返す() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/config/public")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"supported_locales": ["ja", "en"], "default_locale": "ja"})
    );
}

#[rstest]
#[case("/v1/catalog", "ja", "柘植")]
#[case("/v1/catalog?locale=", "ja", "柘植")]
#[case("/v1/catalog?locale=%20EN%20", "en", "Boxwood")]
#[tokio::test]
async fn test_カタログはロケールで解決したラベルを返す(
    #[case] uri: &str,
    #[case] locale: &str,
    #[case] first_material: &str,
) {
    let app = app().await;

    let (status, body) = send(&app, get(uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locale"], json!(locale));
    assert_eq!(body["default_locale"], json!("ja"));
    assert_eq!(body["materials"][0]["label"], json!(first_material));
    assert_eq!(body["materials"].as_array().unwrap().len(), 3);
    assert_eq!(body["fonts"].as_array().unwrap().len(), 5);
    assert_eq!(body["countries"][0]["code"], json!("JP"));
}

#[tokio::test]
async fn test_材質の写真は配信urlを含む() {
    let app = app().await;

    let (_, body) = send(&app, get("/v1/catalog")).await;

    let photo = &body["materials"][0]["photos"][0];
    assert_eq!(
        photo["asset_url"],
        json!("https://storage.googleapis.com/hanko-assets/materials/boxwood/mat_boxwood_01.webp")
    );
    assert_eq!(photo["alt"], json!("柘植"));
    assert_eq!(photo["is_primary"], json!(true));
}

#[tokio::test]
async fn test_対応外のロケールはinvalid_locale() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/catalog?locale=fr")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": {"code": "invalid_locale", "message": "unsupported locale"}})
    );
}

// ===== 注文作成 =====

#[tokio::test]
async fn test_注文作成からリプレイと競合まで() {
    let app = app().await;

    // 初回作成
    let (status, created) = send(&app, post_json("/v1/orders", &order_request())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["order_no"], json!("HF-20260210-0001"));
    assert_eq!(created["status"], json!("pending_payment"));
    assert_eq!(created["payment_status"], json!("unpaid"));
    assert_eq!(created["fulfillment_status"], json!("pending"));
    assert_eq!(created["pricing"], json!({"total_jpy": 3600, "currency": "JPY"}));
    assert_eq!(created["idempotent_replay"], json!(false));

    // 同じリクエストの再送
    let (status, replayed) = send(&app, post_json("/v1/orders", &order_request())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replayed["idempotent_replay"], json!(true));
    assert_eq!(replayed["order_id"], created["order_id"]);
    assert_eq!(replayed["order_no"], created["order_no"]);

    // 同じキーで内容違い
    let mut changed = order_request();
    changed["seal"]["line1"] = json!("山");
    let (status, body) = send(&app, post_json("/v1/orders", &changed)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "idempotency_conflict");
}

#[tokio::test]
async fn test_海外配送は送料を含む() {
    let app = app().await;
    let mut request = order_request();
    request["material_key"] = json!("titanium");
    request["shipping"]["country_code"] = json!("us");

    let (status, body) = send(&app, post_json("/v1/orders", &request)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["pricing"]["total_jpy"], json!(9800 + 1800));
}

#[rstest]
#[case("material_key", json!("gold"), "invalid_reference")]
#[case("locale", json!("fr"), "unsupported_locale")]
#[case("terms_agreed", json!(false), "validation_error")]
#[case("unknown_field", json!(1), "invalid_json")]
#[tokio::test]
async fn test_注文作成のエラーは400(
    #[case] field: &str,
    #[case] value: JsonValue,
    #[case] code: &str,
) {
    let app = app().await;
    let mut request = order_request();
    request[field] = value;

    let (status, body) = send(&app, post_json("/v1/orders", &request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), code);
}

#[tokio::test]
async fn test_無効な参照のメッセージは対象を含む() {
    let app = app().await;
    let mut request = order_request();
    request["seal"]["font_key"] = json!("comic_sans");

    let (_, body) = send(&app, post_json("/v1/orders", &request)).await;

    assert_eq!(body["error"]["message"], json!("invalid font: comic_sans"));
}

#[tokio::test]
async fn test_末尾に余分なデータがあればinvalid_json() {
    let app = app().await;
    let body = format!("{} {{}}", order_request());

    let (status, body) = send(&app, post_raw("/v1/orders", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": {
            "code": "invalid_json",
            "message": "request body must contain a single JSON object"
        }})
    );
}

#[tokio::test]
async fn test_1mibを超えるボディは拒否される() {
    let app = app().await;
    let body = format!("{{\"channel\": \"{}\"}}", "a".repeat(1 << 20));

    let (status, body) = send(&app, post_raw("/v1/orders", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_json");
}

// ===== 決済 Webhook =====

fn payment_payload(event_id: &str, order_id: &JsonValue) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_1", "metadata": {"order_id": order_id}}}
    }))
    .unwrap()
}

#[tokio::test]
async fn test_webhookは1回だけ適用され再送は処理済みになる() {
    let app = app().await;
    let (_, created) = send(&app, post_json("/v1/orders", &order_request())).await;
    let payload = payment_payload("evt_1", &created["order_id"]);
    let signature = sign_payload(&payload, WEBHOOK_SECRET, now().timestamp());

    let (status, first) = send(&app, webhook(&payload, &signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        first,
        json!({"ok": true, "processed": true, "already_processed": false})
    );

    let (status, second) = send(&app, webhook(&payload, &signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        second,
        json!({"ok": true, "processed": false, "already_processed": true})
    );
}

#[tokio::test]
async fn test_注文と無関係なイベントも受理される() {
    let app = app().await;
    let payload = payment_payload("evt_2", &json!("ord_unknown"));
    let signature = sign_payload(&payload, WEBHOOK_SECRET, now().timestamp());

    let (status, body) = send(&app, webhook(&payload, &signature)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], json!(true));
}

#[rstest]
#[case("", "missing Stripe-Signature header")]
#[case("t=1770692400,v1=00ff", "invalid stripe signature")]
#[tokio::test]
async fn test_署名が不正なら401(#[case] signature: &str, #[case] message: &str) {
    let app = app().await;
    let payload = payment_payload("evt_3", &json!("ord_1"));

    let (status, body) = send(&app, webhook(&payload, signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"error": {"code": "invalid_signature", "message": message}})
    );
}

#[tokio::test]
async fn test_署名の期限切れは401() {
    let app = app().await;
    let payload = payment_payload("evt_4", &json!("ord_1"));
    let signature = sign_payload(&payload, WEBHOOK_SECRET, now().timestamp() - 301);

    let (status, body) = send(&app, webhook(&payload, &signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["error"]["message"],
        json!("stripe signature timestamp is outside tolerance")
    );
}

#[tokio::test]
async fn test_署名は正しいが本文が不正なら400() {
    let app = app().await;
    let payload = br#"{"type": "payment_intent.succeeded"}"#;
    let signature = sign_payload(payload, WEBHOOK_SECRET, now().timestamp());

    let (status, body) = send(&app, webhook(payload, &signature)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": {"code": "invalid_payload", "message": "stripe event must include id and type"}})
    );
}
