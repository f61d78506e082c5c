//! PgDocumentStore 統合テスト
//!
//! データベースを使用したテスト。sqlx::test マクロを使用して、
//! テストごとに独立したデータベースを作成する。
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://localhost/hanko cargo test -p hanko-infra --test document_store_test -- --ignored
//! ```

mod common;

use std::sync::Arc;

use common::{TEST_NAMESPACE, fixed_now, seeded_store};
use hanko_domain::order::OrderId;
use hanko_infra::{
    db::TransactionManager,
    repository::{
        CatalogRepository,
        DocumentCatalogRepository,
        DocumentOrderNoCounterRepository,
        DocumentOrderRepository,
        OrderNoCounterRepository,
        OrderRepository,
    },
    store::{DocumentStore, OrderBy, PgDocumentStore},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_コミットしなかった書き込みは残らない(pool: PgPool) {
    let store = PgDocumentStore::new(pool, TEST_NAMESPACE);

    let mut tx = store.begin().await.unwrap();
    tx.set("orders", "ord_1", json!({"status": "paid"})).await.unwrap();
    drop(tx);

    assert_eq!(store.get("orders", "ord_1").await.unwrap(), None);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_同じidの新規作成は競合になる(pool: PgPool) {
    let store = PgDocumentStore::new(pool, TEST_NAMESPACE);

    let mut tx = store.begin().await.unwrap();
    tx.create("idempotency_keys", "web:k", json!({})).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let err = tx.create("idempotency_keys", "web:k", json!({})).await.unwrap_err();

    assert!(err.is_retryable());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_名前空間が異なるドキュメントは見えない(pool: PgPool) {
    let store = PgDocumentStore::new(pool.clone(), TEST_NAMESPACE);
    let other = PgDocumentStore::new(pool, "other");

    let mut tx = store.begin().await.unwrap();
    tx.set("materials", "boxwood", json!({})).await.unwrap();
    tx.commit().await.unwrap();

    assert!(other.get("materials", "boxwood").await.unwrap().is_none());
    assert_eq!(store.list("materials", Some(OrderBy::asc("sort_order"))).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_デモカタログを読み出せる(pool: PgPool) {
    let store = seeded_store(pool).await;
    let repo = DocumentCatalogRepository::new(store);

    let config = repo.get_public_config().await.unwrap();
    let materials = repo.list_active_materials().await.unwrap();

    assert_eq!(config.default_locale(), "ja");
    assert_eq!(materials[0].key, "boxwood");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_採番はコミットごとに進む(pool: PgPool) {
    let store = seeded_store(pool).await;
    let repo = DocumentOrderNoCounterRepository::new();

    let mut seqs = Vec::new();
    for _ in 0..3 {
        let mut tx = store.begin().await.unwrap();
        seqs.push(repo.next_seq(&mut tx, "202602", fixed_now()).await.unwrap());
        tx.commit().await.unwrap();
    }

    assert_eq!(seqs, vec![1, 2, 3]);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_注文のライフサイクル更新はマージされる(pool: PgPool) {
    let store = seeded_store(pool).await;
    let repo = DocumentOrderRepository::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
    let id = OrderId::from_string("ord_1");

    let mut tx = store.begin().await.unwrap();
    tx.set(
        "orders",
        id.as_str(),
        json!({"status": "pending_payment", "pricing": {"total_jpy": 3600}}),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let mut order = repo.find_by_id_tx(&mut tx, &id, "ja").await.unwrap().unwrap();
    order.status = "paid".to_string();
    repo.update_lifecycle(&mut tx, &order).await.unwrap();
    tx.commit().await.unwrap();

    let stored = repo.find_by_id(&id, "ja").await.unwrap().unwrap();
    assert_eq!(stored.status, "paid");
    assert_eq!(stored.pricing.total_jpy, 3600);
}
