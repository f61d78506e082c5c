//! # OrderRepository
//!
//! 注文と注文イベント（`orders/{order_id}/events`）の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **新規作成は create**: 同じ ID の注文が既にあれば競合エラー
//! - **ライフサイクル更新はマージ**: ステータス・支払い・出荷のフィールドのみを書き換え、
//!   スナップショットには触れない
//! - **イベントは追記のみ**: 既存イベントを更新・削除する操作は提供しない

use std::sync::Arc;

use async_trait::async_trait;
use hanko_domain::order::{Order, OrderEvent, OrderId};
use serde_json::json;

use crate::{
    db::TxContext,
    decode::{decode_event, decode_order},
    error::InfraError,
    store::{DocumentStore, OrderBy, collections},
};

/// 注文リポジトリトレイト
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 全注文を作成日時の降順で取得する
    ///
    /// `locale` が欠けた注文には `default_locale` を補う。
    async fn list_all(&self, default_locale: &str) -> Result<Vec<Order>, InfraError>;

    /// 注文 ID で取得する
    async fn find_by_id(
        &self,
        id: &OrderId,
        default_locale: &str,
    ) -> Result<Option<Order>, InfraError>;

    /// 注文のイベントを作成日時の昇順で取得する
    async fn list_events(&self, id: &OrderId) -> Result<Vec<OrderEvent>, InfraError>;

    /// トランザクション内で注文を取得する
    async fn find_by_id_tx(
        &self,
        tx: &mut TxContext,
        id: &OrderId,
        default_locale: &str,
    ) -> Result<Option<Order>, InfraError>;

    /// 注文を新規作成する
    async fn insert(&self, tx: &mut TxContext, order: &Order) -> Result<(), InfraError>;

    /// ステータス・支払い・出荷のフィールドを保存する
    ///
    /// `status`, `status_updated_at`, `updated_at`, `payment`, `fulfillment` をマージする。
    async fn update_lifecycle(&self, tx: &mut TxContext, order: &Order)
    -> Result<(), InfraError>;

    /// イベントを追記する
    async fn insert_events(
        &self,
        tx: &mut TxContext,
        id: &OrderId,
        events: &[OrderEvent],
    ) -> Result<(), InfraError>;
}

/// ドキュメントストア実装の注文リポジトリ
pub struct DocumentOrderRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentOrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OrderRepository for DocumentOrderRepository {
    async fn list_all(&self, default_locale: &str) -> Result<Vec<Order>, InfraError> {
        let documents = self
            .store
            .list(collections::ORDERS, Some(OrderBy::desc("created_at")))
            .await?;
        Ok(documents
            .iter()
            .map(|document| decode_order(document, default_locale))
            .collect())
    }

    async fn find_by_id(
        &self,
        id: &OrderId,
        default_locale: &str,
    ) -> Result<Option<Order>, InfraError> {
        let document = self.store.get(collections::ORDERS, id.as_str()).await?;
        Ok(document.map(|document| decode_order(&document, default_locale)))
    }

    async fn list_events(&self, id: &OrderId) -> Result<Vec<OrderEvent>, InfraError> {
        let documents = self
            .store
            .list(
                &collections::order_events(id.as_str()),
                Some(OrderBy::asc("created_at")),
            )
            .await?;
        Ok(documents.iter().map(decode_event).collect())
    }

    async fn find_by_id_tx(
        &self,
        tx: &mut TxContext,
        id: &OrderId,
        default_locale: &str,
    ) -> Result<Option<Order>, InfraError> {
        let document = tx.get(collections::ORDERS, id.as_str()).await?;
        Ok(document.map(|document| decode_order(&document, default_locale)))
    }

    async fn insert(&self, tx: &mut TxContext, order: &Order) -> Result<(), InfraError> {
        tx.create(
            collections::ORDERS,
            order.id.as_str(),
            serde_json::to_value(order)?,
        )
        .await
    }

    async fn update_lifecycle(
        &self,
        tx: &mut TxContext,
        order: &Order,
    ) -> Result<(), InfraError> {
        tx.merge(
            collections::ORDERS,
            order.id.as_str(),
            json!({
                "status": order.status,
                "status_updated_at": order.status_updated_at,
                "updated_at": order.updated_at,
                "payment": order.payment,
                "fulfillment": order.fulfillment,
            }),
        )
        .await
    }

    async fn insert_events(
        &self,
        tx: &mut TxContext,
        id: &OrderId,
        events: &[OrderEvent],
    ) -> Result<(), InfraError> {
        let collection = collections::order_events(id.as_str());
        for event in events {
            tx.create(&collection, &event.id, serde_json::to_value(event)?)
                .await?;
        }
        Ok(())
    }
}
