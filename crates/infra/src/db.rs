//! # データベース接続とトランザクション
//!
//! PostgreSQL 接続プールの作成、マイグレーション、およびドキュメントストアのトランザクションを扱う。
//!
//! ## トランザクションの規則
//!
//! - 読み取り（[`TxContext::get`]）は対象行を `FOR UPDATE` でロックする
//! - 書き込みは [`TxContext::commit`] でまとめて確定し、コミットせずにドロップするとロールバックする
//! - 新規作成（[`TxContext::create`]）は同じ ID が既にあれば [`InfraError::conflict`] を返す
//!
//! 存在しない行は `FOR UPDATE` でロックできないため、新規ドキュメントは必ず `create` で作る。
//! 同時に作成した側は競合エラーになり、トランザクションをやり直せば既存行を読める。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};

use crate::{
    error::InfraError,
    memory::MemoryTransaction,
    store::{StoredDocument, empty_document, from_row, merge_json},
};

/// データベースマイグレーションを実行する
///
/// 適用済みのマイグレーションはスキップされる。
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// PostgreSQL 接続プールを作成する
///
/// - `max_connections(10)`: 最大接続数
/// - `acquire_timeout(5秒)`: 接続取得のタイムアウト
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

// =============================================================================
// TxContext
// =============================================================================

/// トランザクションコンテキスト
///
/// 書き込みはすべてこのコンテキスト経由で行う。
///
/// # ライフサイクル
///
/// 1. `TransactionManager::begin()` で作成
/// 2. リポジトリの書き込みメソッドに `&mut TxContext` として渡す
/// 3. `commit()` でコミット、またはドロップでロールバック
pub struct TxContext(TxContextInner);

enum TxContextInner {
    Pg {
        tx:        Transaction<'static, Postgres>,
        namespace: String,
    },
    Memory(MemoryTransaction),
}

type DocumentRow = (String, JsonValue, DateTime<Utc>, DateTime<Utc>);

impl TxContext {
    /// Postgres トランザクションを開始する
    pub(crate) async fn begin_pg(pool: &PgPool, namespace: &str) -> Result<Self, InfraError> {
        Ok(Self(TxContextInner::Pg {
            tx:        pool.begin().await?,
            namespace: namespace.to_string(),
        }))
    }

    pub(crate) fn memory(tx: MemoryTransaction) -> Self {
        Self(TxContextInner::Memory(tx))
    }

    /// ドキュメントを読み取り、コミットまで行ロックを保持する
    pub async fn get(
        &mut self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredDocument>, InfraError> {
        match &mut self.0 {
            TxContextInner::Pg { tx, namespace } => {
                let row = sqlx::query_as::<_, DocumentRow>(
                    r#"
                    SELECT id, data, created_at, updated_at
                    FROM documents
                    WHERE namespace = $1 AND collection = $2 AND id = $3
                    FOR UPDATE
                    "#,
                )
                .bind(namespace.as_str())
                .bind(collection)
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
                Ok(row.map(from_row))
            }
            TxContextInner::Memory(tx) => Ok(tx.get(collection, id)),
        }
    }

    /// ドキュメントを作成または全体を置き換える
    pub async fn set(
        &mut self,
        collection: &str,
        id: &str,
        data: JsonValue,
    ) -> Result<(), InfraError> {
        match &mut self.0 {
            TxContextInner::Pg { tx, namespace } => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (namespace, collection, id, data, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, now(), now())
                    ON CONFLICT (namespace, collection, id)
                    DO UPDATE SET data = EXCLUDED.data, updated_at = now()
                    "#,
                )
                .bind(namespace.as_str())
                .bind(collection)
                .bind(id)
                .bind(&data)
                .execute(&mut **tx)
                .await?;
                Ok(())
            }
            TxContextInner::Memory(tx) => {
                tx.set(collection, id, data);
                Ok(())
            }
        }
    }

    /// 既存ドキュメントに `patch` をマージする（存在しなければ `patch` で作成）
    pub async fn merge(
        &mut self,
        collection: &str,
        id: &str,
        patch: JsonValue,
    ) -> Result<(), InfraError> {
        let mut data = self
            .get(collection, id)
            .await?
            .map_or_else(empty_document, |document| document.data);
        merge_json(&mut data, patch);
        self.set(collection, id, data).await
    }

    /// ドキュメントを新規作成する
    ///
    /// 同じ ID のドキュメントが既にあれば [`InfraError::conflict`] を返す。
    pub async fn create(
        &mut self,
        collection: &str,
        id: &str,
        data: JsonValue,
    ) -> Result<(), InfraError> {
        match &mut self.0 {
            TxContextInner::Pg { tx, namespace } => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO documents (namespace, collection, id, data, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, now(), now())
                    "#,
                )
                .bind(namespace.as_str())
                .bind(collection)
                .bind(id)
                .bind(&data)
                .execute(&mut **tx)
                .await;

                match result {
                    Ok(_) => Ok(()),
                    Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                        Err(InfraError::conflict(collection, id))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            TxContextInner::Memory(tx) => tx.create(collection, id, data),
        }
    }

    /// ドキュメントを削除する（存在しなければ何もしない）
    pub async fn delete(&mut self, collection: &str, id: &str) -> Result<(), InfraError> {
        match &mut self.0 {
            TxContextInner::Pg { tx, namespace } => {
                sqlx::query(
                    r#"
                    DELETE FROM documents
                    WHERE namespace = $1 AND collection = $2 AND id = $3
                    "#,
                )
                .bind(namespace.as_str())
                .bind(collection)
                .bind(id)
                .execute(&mut **tx)
                .await?;
                Ok(())
            }
            TxContextInner::Memory(tx) => {
                tx.delete(collection, id);
                Ok(())
            }
        }
    }

    /// トランザクションをコミットする
    ///
    /// 呼ばずにドロップすると、すべての書き込みが破棄される。
    pub async fn commit(self) -> Result<(), InfraError> {
        match self.0 {
            TxContextInner::Pg { tx, .. } => {
                tx.commit().await?;
                Ok(())
            }
            TxContextInner::Memory(tx) => tx.commit(),
        }
    }
}

// =============================================================================
// TransactionManager
// =============================================================================

/// トランザクション管理 trait
///
/// ユースケース層はこの trait 経由でトランザクションを開始し、
/// 接続プールやインメモリストアに直接依存しない。
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// トランザクションを開始し、TxContext を返す
    async fn begin(&self) -> Result<TxContext, InfraError>;
}
