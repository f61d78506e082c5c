//! # ドキュメントストア
//!
//! コレクション単位で JSON ドキュメントを読み書きする狭いポート。
//!
//! - 単一ドキュメントの取得
//! - コレクション全体の取得（任意のフィールドで並べ替え）
//! - トランザクション（[`crate::db::TxContext`]）内の読み取りと書き込み
//!
//! サブコレクションは `orders/{order_id}/events` のようにパスをそのままコレクション名として扱う。
//!
//! 実装は PostgreSQL（[`PgDocumentStore`]）とインメモリ（[`crate::memory::InMemoryDocumentStore`]）の 2 つ。

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use sqlx::PgPool;

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
};

/// コレクション名
pub mod collections {
    pub const APP_CONFIG: &str = "app_config";
    pub const FONTS: &str = "fonts";
    pub const MATERIALS: &str = "materials";
    pub const COUNTRIES: &str = "countries";
    pub const ORDERS: &str = "orders";
    pub const IDEMPOTENCY_KEYS: &str = "idempotency_keys";
    pub const ORDER_NO_COUNTERS: &str = "order_no_counters";
    pub const PAYMENT_WEBHOOK_EVENTS: &str = "payment_webhook_events";

    /// 公開設定のドキュメント ID
    pub const PUBLIC_CONFIG_ID: &str = "public";

    /// 注文イベントのサブコレクション
    pub fn order_events(order_id: &str) -> String {
        format!("{ORDERS}/{order_id}/events")
    }
}

/// 保存済みドキュメント
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id:         String,
    pub data:       JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 並べ替え指定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field:      String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field:      field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field:      field.into(),
            descending: true,
        }
    }
}

/// トランザクション外の読み取り
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// ドキュメントを取得する（存在しなければ `None`）
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, InfraError>;

    /// コレクションの全ドキュメントを取得する
    ///
    /// `order_by` 未指定時はドキュメント ID 順。
    async fn list(
        &self,
        collection: &str,
        order_by: Option<OrderBy>,
    ) -> Result<Vec<StoredDocument>, InfraError>;
}

/// ドキュメントを並べ替える
///
/// 指定フィールドの値で比較し、同値または欠損時はドキュメント ID で比較する。
/// 欠損値は常に末尾に置く。
pub fn sort_documents(documents: &mut [StoredDocument], order_by: Option<&OrderBy>) {
    documents.sort_by(|a, b| {
        let by_field = order_by.map_or(Ordering::Equal, |order_by| {
            let ordering = compare_fields(
                a.data.get(&order_by.field),
                b.data.get(&order_by.field),
            );
            match (a.data.get(&order_by.field), b.data.get(&order_by.field)) {
                (Some(_), Some(_)) if order_by.descending => ordering.reverse(),
                _ => ordering,
            }
        });
        by_field.then_with(|| a.id.cmp(&b.id))
    });
}

fn compare_fields(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

/// JSON 値を比較する（日時文字列は日時として、数値は数値として比較）
fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(a), JsonValue::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(a), JsonValue::String(b)) => {
            match (
                DateTime::parse_from_rfc3339(a),
                DateTime::parse_from_rfc3339(b),
            ) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (JsonValue::Bool(a), JsonValue::Bool(b)) => a.cmp(b),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// `patch` を `target` に再帰的にマージする
///
/// オブジェクト同士はキーごとにマージし、それ以外は `patch` の値で置き換える。
pub fn merge_json(target: &mut JsonValue, patch: JsonValue) {
    match (target, patch) {
        (JsonValue::Object(target), JsonValue::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// 空のドキュメント
pub fn empty_document() -> JsonValue {
    JsonValue::Object(Map::new())
}

// =============================================================================
// PostgreSQL 実装
// =============================================================================

/// PostgreSQL 上のドキュメントストア
///
/// `documents` テーブルの 1 行が 1 ドキュメント。
/// `namespace` にはプロジェクト ID を入れ、同じデータベースで複数環境を分離する。
#[derive(Clone)]
pub struct PgDocumentStore {
    pool:      PgPool,
    namespace: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }
}

type DocumentRow = (String, JsonValue, DateTime<Utc>, DateTime<Utc>);

pub(crate) fn from_row((id, data, created_at, updated_at): DocumentRow) -> StoredDocument {
    StoredDocument {
        id,
        data,
        created_at,
        updated_at,
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[tracing::instrument(skip_all, level = "debug", fields(%collection, %id))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, InfraError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data, created_at, updated_at
            FROM documents
            WHERE namespace = $1 AND collection = $2 AND id = $3
            "#,
        )
        .bind(&self.namespace)
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%collection))]
    async fn list(
        &self,
        collection: &str,
        order_by: Option<OrderBy>,
    ) -> Result<Vec<StoredDocument>, InfraError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data, created_at, updated_at
            FROM documents
            WHERE namespace = $1 AND collection = $2
            ORDER BY id
            "#,
        )
        .bind(&self.namespace)
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut documents = rows.into_iter().map(from_row).collect::<Vec<_>>();
        sort_documents(&mut documents, order_by.as_ref());
        Ok(documents)
    }
}

#[async_trait]
impl TransactionManager for PgDocumentStore {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        TxContext::begin_pg(&self.pool, &self.namespace).await
    }
}
