//! # OrderNoCounterRepository
//!
//! 注文番号の採番カウンター（`order_no_counters/{YYYYMM}`）を管理するリポジトリ。
//!
//! ## 設計方針
//!
//! - **月単位の連番**: バケットは JST の年月。月が変わると 1 から振り直す
//! - **トランザクション内で採番**: 注文作成と同じトランザクションで読み書きし、
//!   既存のカウンター行はロックされる
//! - **初回作成は create**: 同じ月の初回採番が同時に起きた場合は一方が競合エラーになる

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{
    db::TxContext,
    decode::decode_last_seq,
    error::InfraError,
    store::collections,
};

/// 採番カウンターリポジトリトレイト
#[async_trait]
pub trait OrderNoCounterRepository: Send + Sync {
    /// 次の連番を取得する
    ///
    /// カウンターがなければ 1 を返し、カウンターを作成する。
    async fn next_seq(
        &self,
        tx: &mut TxContext,
        bucket: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, InfraError>;
}

/// ドキュメントストア実装の採番カウンターリポジトリ
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentOrderNoCounterRepository;

impl DocumentOrderNoCounterRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OrderNoCounterRepository for DocumentOrderNoCounterRepository {
    async fn next_seq(
        &self,
        tx: &mut TxContext,
        bucket: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, InfraError> {
        let current = tx.get(collections::ORDER_NO_COUNTERS, bucket).await?;
        let next = decode_last_seq(current.as_ref()) + 1;
        let data = json!({ "last_seq": next, "updated_at": now });

        match current {
            Some(_) => tx.merge(collections::ORDER_NO_COUNTERS, bucket, data).await?,
            None => tx.create(collections::ORDER_NO_COUNTERS, bucket, data).await?,
        }

        Ok(next)
    }
}
