//! # IdempotencyRepository
//!
//! 注文作成の冪等キー（`idempotency_keys/{channel}:{key}`）を管理するリポジトリ。
//!
//! 読み取りと作成はどちらも注文作成トランザクションの中で行う。
//! 同じキーの同時作成は一方が競合エラーになり、やり直すとリプレイとして扱われる。

use async_trait::async_trait;
use hanko_domain::idempotency::{IdempotencyRecord, document_id};

use crate::{
    db::TxContext,
    decode::decode_idempotency_record,
    error::InfraError,
    store::collections,
};

/// 冪等キーリポジトリトレイト
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// チャネルとキーで記録を取得する
    async fn find_tx(
        &self,
        tx: &mut TxContext,
        channel: &str,
        idempotency_key: &str,
    ) -> Result<Option<IdempotencyRecord>, InfraError>;

    /// 記録を作成する（既にあれば競合エラー）
    async fn insert(&self, tx: &mut TxContext, record: &IdempotencyRecord)
    -> Result<(), InfraError>;
}

/// ドキュメントストア実装の冪等キーリポジトリ
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentIdempotencyRepository;

impl DocumentIdempotencyRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdempotencyRepository for DocumentIdempotencyRepository {
    async fn find_tx(
        &self,
        tx: &mut TxContext,
        channel: &str,
        idempotency_key: &str,
    ) -> Result<Option<IdempotencyRecord>, InfraError> {
        let document = tx
            .get(
                collections::IDEMPOTENCY_KEYS,
                &document_id(channel, idempotency_key),
            )
            .await?;
        Ok(document.as_ref().map(decode_idempotency_record))
    }

    async fn insert(
        &self,
        tx: &mut TxContext,
        record: &IdempotencyRecord,
    ) -> Result<(), InfraError> {
        tx.create(
            collections::IDEMPOTENCY_KEYS,
            &record.id(),
            serde_json::to_value(record)?,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use hanko_domain::order::{Channel, OrderId};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{db::TransactionManager, memory::InMemoryDocumentStore};

    #[tokio::test]
    async fn test_作成した記録をチャネルとキーで読める() {
        // Arrange
        let store = InMemoryDocumentStore::new();
        let sut = DocumentIdempotencyRepository::new();
        let record = IdempotencyRecord::new(
            Channel::Web,
            "demo_key_123",
            "hash",
            OrderId::from_string("ord_1"),
            Utc::now(),
        );

        // Act
        let mut tx = store.begin().await.unwrap();
        sut.insert(&mut tx, &record).await.unwrap();
        tx.commit().await.unwrap();

        // Assert
        let mut tx = store.begin().await.unwrap();
        let found = sut.find_tx(&mut tx, "web", "demo_key_123").await.unwrap();
        assert_eq!(found, Some(record));
        assert_eq!(sut.find_tx(&mut tx, "app", "demo_key_123").await.unwrap(), None);
    }
}
