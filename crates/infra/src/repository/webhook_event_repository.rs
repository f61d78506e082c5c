//! # WebhookEventRepository
//!
//! 決済 Webhook の処理記録（`payment_webhook_events/{provider_event_id}`）を管理するリポジトリ。
//!
//! 記録の `processed` が true のイベントは二度と注文に適用しない。

use async_trait::async_trait;
use hanko_domain::payment::WebhookEventRecord;

use crate::{
    db::TxContext,
    decode::decode_webhook_record,
    error::InfraError,
    store::collections,
};

/// Webhook 処理記録リポジトリトレイト
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// プロバイダイベント ID で記録を取得する
    async fn find_tx(
        &self,
        tx: &mut TxContext,
        provider_event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, InfraError>;

    /// 記録を新規作成する（既にあれば競合エラー）
    async fn insert(&self, tx: &mut TxContext, record: &WebhookEventRecord)
    -> Result<(), InfraError>;

    /// 既存の記録にマージする
    async fn update(&self, tx: &mut TxContext, record: &WebhookEventRecord)
    -> Result<(), InfraError>;
}

/// ドキュメントストア実装の Webhook 処理記録リポジトリ
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentWebhookEventRepository;

impl DocumentWebhookEventRepository {
    pub fn new() -> Self {
        Self
    }
}

fn ensure_id(record: &WebhookEventRecord) -> Result<&str, InfraError> {
    let id = record.provider_event_id.trim();
    if id.is_empty() {
        return Err(InfraError::invalid_input("provider event id is required"));
    }
    Ok(id)
}

#[async_trait]
impl WebhookEventRepository for DocumentWebhookEventRepository {
    async fn find_tx(
        &self,
        tx: &mut TxContext,
        provider_event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, InfraError> {
        let document = tx
            .get(collections::PAYMENT_WEBHOOK_EVENTS, provider_event_id)
            .await?;
        Ok(document.as_ref().map(decode_webhook_record))
    }

    async fn insert(
        &self,
        tx: &mut TxContext,
        record: &WebhookEventRecord,
    ) -> Result<(), InfraError> {
        let id = ensure_id(record)?;
        tx.create(
            collections::PAYMENT_WEBHOOK_EVENTS,
            id,
            serde_json::to_value(record)?,
        )
        .await
    }

    async fn update(
        &self,
        tx: &mut TxContext,
        record: &WebhookEventRecord,
    ) -> Result<(), InfraError> {
        let id = ensure_id(record)?;
        tx.merge(
            collections::PAYMENT_WEBHOOK_EVENTS,
            id,
            serde_json::to_value(record)?,
        )
        .await
    }
}
