//! # インメモリドキュメントストア
//!
//! PostgreSQL 実装と同じトランザクション規則を持つインメモリ実装。
//! `DATABASE_URL` 未設定時のデモ起動と、ユースケース・HTTP テストで使う。
//!
//! トランザクションはストア全体の非同期 Mutex を保持して直列化し、
//! 書き込みと削除はコミットまでステージングする。
//! トランザクション中に同じタスクから [`DocumentStore`] の読み取りを呼ぶとデッドロックする。

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    store::{DocumentStore, OrderBy, StoredDocument, sort_documents},
};

type DocumentKey = (String, String);
type Documents = BTreeMap<DocumentKey, StoredDocument>;

fn key(collection: &str, id: &str) -> DocumentKey {
    (collection.to_string(), id.to_string())
}

/// インメモリのドキュメントストア
///
/// `Clone` したインスタンスは同じデータを共有する。
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents:      Arc<Mutex<Documents>>,
    reject_commits: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// コミットを失敗させるかどうかを切り替える
    ///
    /// 永続化失敗時のロールバックを検証するために使う。
    #[cfg(any(test, feature = "test-utils"))]
    pub fn set_reject_commits(&self, reject: bool) {
        self.reject_commits.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, InfraError> {
        let documents = self.documents.lock().await;
        Ok(documents.get(&key(collection, id)).cloned())
    }

    async fn list(
        &self,
        collection: &str,
        order_by: Option<OrderBy>,
    ) -> Result<Vec<StoredDocument>, InfraError> {
        let mut listed = {
            let documents = self.documents.lock().await;
            documents
                .iter()
                .filter(|((c, _), _)| c == collection)
                .map(|(_, document)| document.clone())
                .collect::<Vec<_>>()
        };
        sort_documents(&mut listed, order_by.as_ref());
        Ok(listed)
    }
}

#[async_trait]
impl TransactionManager for InMemoryDocumentStore {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        let guard = Arc::clone(&self.documents).lock_owned().await;
        Ok(TxContext::memory(MemoryTransaction {
            documents:      guard,
            staged:         BTreeMap::new(),
            reject_commits: self.reject_commits.load(Ordering::SeqCst),
        }))
    }
}

/// インメモリストアのトランザクション
///
/// ストア全体のロックを保持し、書き込みをステージングする。
/// ステージした `None` は削除を表す。
pub struct MemoryTransaction {
    documents:      OwnedMutexGuard<Documents>,
    staged:         BTreeMap<DocumentKey, Option<JsonValue>>,
    reject_commits: bool,
}

impl MemoryTransaction {
    pub(crate) fn get(&self, collection: &str, id: &str) -> Option<StoredDocument> {
        let key = key(collection, id);
        let base = self.documents.get(&key);

        match self.staged.get(&key) {
            Some(None) => None,
            Some(Some(data)) => {
                let now = Utc::now();
                Some(StoredDocument {
                    id:         id.to_string(),
                    data:       data.clone(),
                    created_at: base.map_or(now, |document| document.created_at),
                    updated_at: now,
                })
            }
            None => base.cloned(),
        }
    }

    pub(crate) fn set(&mut self, collection: &str, id: &str, data: JsonValue) {
        self.staged.insert(key(collection, id), Some(data));
    }

    pub(crate) fn delete(&mut self, collection: &str, id: &str) {
        self.staged.insert(key(collection, id), None);
    }

    pub(crate) fn create(
        &mut self,
        collection: &str,
        id: &str,
        data: JsonValue,
    ) -> Result<(), InfraError> {
        let key = key(collection, id);
        let exists = match self.staged.get(&key) {
            Some(staged) => staged.is_some(),
            None => self.documents.contains_key(&key),
        };
        if exists {
            return Err(InfraError::conflict(collection, id));
        }
        self.staged.insert(key, Some(data));
        Ok(())
    }

    pub(crate) fn commit(mut self) -> Result<(), InfraError> {
        if self.reject_commits {
            return Err(InfraError::unexpected("コミットが拒否されました"));
        }

        let now = Utc::now();
        for ((collection, id), data) in std::mem::take(&mut self.staged) {
            let Some(data) = data else {
                self.documents.remove(&(collection, id));
                continue;
            };
            let created_at = self
                .documents
                .get(&(collection.clone(), id.clone()))
                .map_or(now, |document| document.created_at);
            self.documents.insert(
                (collection, id.clone()),
                StoredDocument {
                    id,
                    data,
                    created_at,
                    updated_at: now,
                },
            );
        }
        Ok(())
    }
}
