//! テスト共通フィクスチャ
//!
//! PostgreSQL を使用する統合テストで共通利用するストア生成とシードデータ。
//! Rust の統合テスト規約に従い `tests/common/mod.rs` に配置。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use hanko_infra::{seed::seed_demo_catalog, store::PgDocumentStore};
use sqlx::PgPool;

/// テスト用の名前空間
pub const TEST_NAMESPACE: &str = "hanko-test";

/// テスト用の固定時刻（2026-02-10 12:00 JST）
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 10, 3, 0, 0).unwrap()
}

/// デモカタログを投入したストアを作る
pub async fn seeded_store(pool: PgPool) -> Arc<PgDocumentStore> {
    let store = Arc::new(PgDocumentStore::new(pool, TEST_NAMESPACE));
    seed_demo_catalog(store.as_ref(), fixed_now()).await.unwrap();
    store
}
