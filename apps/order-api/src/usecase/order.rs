//! # 注文作成ユースケース
//!
//! 検証済みの注文作成入力から注文を作る。
//!
//! ## 処理の流れ（1 トランザクション）
//!
//! 1. 公開ロケール設定を読み、`locale` と `contact.preferred_locale` が対応しているか確認
//! 2. 冪等キーの記録を読み、あればリプレイまたは競合
//! 3. 書体・材質・配送国を読み、存在と有効性を確認
//! 4. 注文番号を採番
//! 5. 注文、`order_created` イベント、冪等キーの記録を書き込む
//!
//! 途中で失敗した場合は何も書き込まれない。冪等キーや採番カウンターの同時作成で
//! 競合した場合はトランザクションごとやり直す。

use std::{sync::Arc, time::Duration};

use hanko_domain::{
    clock::SharedClock,
    idempotency::{IdempotencyMatch, IdempotencyRecord},
    order::{
        NewOrder,
        Order,
        OrderId,
        OrderSummary,
        number::{counter_bucket, format_order_no},
        request::CreateOrderInput,
    },
};
use hanko_infra::{
    db::TransactionManager,
    repository::{
        CatalogRepository,
        IdempotencyRepository,
        OrderNoCounterRepository,
        OrderRepository,
    },
};
use hanko_shared::{event_log::event, log_business_event};

use super::helpers::{retry_on_conflict, with_timeout};
use crate::error::ApiError;

/// 注文作成 1 回あたりの制限時間
pub const ORDER_CREATE_TIMEOUT: Duration = Duration::from_secs(7);

/// 注文作成の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderOutcome {
    pub summary:           OrderSummary,
    /// 冪等キーによるリプレイか
    pub idempotent_replay: bool,
}

/// 注文作成ユースケース実装
pub struct OrderUseCaseImpl {
    catalog_repo:     Arc<dyn CatalogRepository>,
    order_repo:       Arc<dyn OrderRepository>,
    idempotency_repo: Arc<dyn IdempotencyRepository>,
    counter_repo:     Arc<dyn OrderNoCounterRepository>,
    tx_manager:       Arc<dyn TransactionManager>,
    clock:            SharedClock,
}

impl OrderUseCaseImpl {
    pub fn new(
        catalog_repo: Arc<dyn CatalogRepository>,
        order_repo: Arc<dyn OrderRepository>,
        idempotency_repo: Arc<dyn IdempotencyRepository>,
        counter_repo: Arc<dyn OrderNoCounterRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: SharedClock,
    ) -> Self {
        Self {
            catalog_repo,
            order_repo,
            idempotency_repo,
            counter_repo,
            tx_manager,
            clock,
        }
    }

    /// 注文を作成する
    ///
    /// # エラー
    ///
    /// - `UnsupportedLocale`: ロケールが公開設定の対応一覧にない
    /// - `InvalidReference` / `InactiveReference`: 書体・材質・配送国が存在しない / 無効
    /// - `IdempotencyConflict`: 同じ冪等キーで異なる内容
    pub async fn create_order(
        &self,
        input: &CreateOrderInput,
    ) -> Result<CreateOrderOutcome, ApiError> {
        let request_hash = input.request_hash()?;
        let request_hash = request_hash.as_str();

        let outcome = retry_on_conflict("注文作成", || {
            with_timeout(
                "注文作成",
                ORDER_CREATE_TIMEOUT,
                self.try_create(input, request_hash),
            )
        })
        .await?;

        let action = if outcome.idempotent_replay {
            event::action::ORDER_REPLAYED
        } else {
            event::action::ORDER_CREATED
        };
        log_business_event!(
            event.category = event::category::ORDER,
            event.action = action,
            event.entity_type = event::entity_type::ORDER,
            event.entity_id = %outcome.summary.order_id,
            event.result = event::result::SUCCESS,
            order.order_no = %outcome.summary.order_no,
            order.channel = %input.channel,
            order.total_jpy = outcome.summary.total_jpy,
            "注文作成"
        );

        Ok(outcome)
    }

    async fn try_create(
        &self,
        input: &CreateOrderInput,
        request_hash: &str,
    ) -> Result<CreateOrderOutcome, ApiError> {
        let now = self.clock.now();
        let mut tx = self.tx_manager.begin().await?;

        let config = self.catalog_repo.get_public_config_tx(&mut tx).await?;
        if !config.supports(&input.locale) || !config.supports(&input.contact.preferred_locale) {
            return Err(ApiError::UnsupportedLocale);
        }

        let channel = input.channel.to_string();
        let existing = self
            .idempotency_repo
            .find_tx(&mut tx, &channel, &input.idempotency_key)
            .await?;
        if let Some(record) = existing {
            return match record.check(request_hash) {
                IdempotencyMatch::Replay(order_id) => {
                    let order = self
                        .order_repo
                        .find_by_id_tx(&mut tx, &order_id, config.default_locale())
                        .await?
                        .ok_or_else(|| {
                            ApiError::Internal(format!(
                                "冪等キーが参照する注文が見つかりません: {order_id}"
                            ))
                        })?;
                    Ok(CreateOrderOutcome {
                        summary:           order.summary(),
                        idempotent_replay: true,
                    })
                }
                IdempotencyMatch::Conflict => Err(ApiError::IdempotencyConflict),
            };
        }

        let font = self
            .catalog_repo
            .get_font_tx(&mut tx, &input.seal.font_key)
            .await?;
        let material = self
            .catalog_repo
            .get_material_tx(&mut tx, &input.material_key)
            .await?;
        let country = self
            .catalog_repo
            .get_country_tx(&mut tx, &input.shipping.country_code)
            .await?;

        let seq = self
            .counter_repo
            .next_seq(&mut tx, &counter_bucket(now), now)
            .await?;

        let (order, created) = Order::place(NewOrder {
            id: OrderId::new(),
            order_no: format_order_no(now, seq),
            input,
            font: &font,
            material: &material,
            country: &country,
            now,
        });

        self.order_repo.insert(&mut tx, &order).await?;
        self.order_repo
            .insert_events(&mut tx, &order.id, &[created])
            .await?;

        let record = IdempotencyRecord::new(
            input.channel,
            &input.idempotency_key,
            request_hash,
            order.id.clone(),
            now,
        );
        self.idempotency_repo.insert(&mut tx, &record).await?;

        tx.commit().await?;

        Ok(CreateOrderOutcome {
            summary:           order.summary(),
            idempotent_replay: false,
        })
    }
}
