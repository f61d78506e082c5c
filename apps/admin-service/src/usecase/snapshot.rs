//! # 管理画面スナップショット
//!
//! 注文・材質・配送国ラベルをストアから読み込み、プロセス内で共有する。
//!
//! ## 設計方針
//!
//! - 注文は作成日時の降順、イベントは作成日時の昇順で保持する
//! - 材質は `(sort_order, key)` 順で、無効化されたものも含む
//! - 配送国が 1 件もなければ、注文の国コードをそのままラベルにする
//! - 更新系は [`SnapshotCache::write`] のロックを保存完了（または読み直し）まで保持する

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use hanko_domain::{
    catalog::Material,
    locale::resolve_localized_text,
    order::{Order, OrderEvent},
};
use hanko_infra::repository::{CatalogRepository, OrderRepository};
use itertools::Itertools;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::with_timeout;
use crate::error::AdminError;

/// スナップショット読み込みの制限時間
pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(7);

/// イベント付きの注文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub order:  Order,
    pub events: Vec<OrderEvent>,
}

/// 管理画面が表示に使うデータ一式
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminSnapshot {
    pub orders:    Vec<OrderRecord>,
    pub materials: Vec<Material>,
    /// 国コード → 表示ラベル
    pub countries: BTreeMap<String, String>,
}

impl AdminSnapshot {
    pub fn order(&self, id: &str) -> Option<&OrderRecord> {
        self.orders.iter().find(|record| record.order.id.as_str() == id)
    }

    pub fn order_mut(&mut self, id: &str) -> Option<&mut OrderRecord> {
        self.orders
            .iter_mut()
            .find(|record| record.order.id.as_str() == id)
    }

    pub fn material(&self, key: &str) -> Option<&Material> {
        self.materials.iter().find(|material| material.key == key)
    }

    pub fn material_mut(&mut self, key: &str) -> Option<&mut Material> {
        self.materials.iter_mut().find(|material| material.key == key)
    }

    /// 国コードの表示ラベル（未登録ならコードのまま）
    pub fn country_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.countries.get(code).map_or(code, String::as_str)
    }
}

/// スナップショットの読み込みと共有
pub struct SnapshotCache {
    order_repo:     Arc<dyn OrderRepository>,
    catalog_repo:   Arc<dyn CatalogRepository>,
    locale:         String,
    default_locale: String,
    snapshot:       RwLock<AdminSnapshot>,
}

impl SnapshotCache {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        catalog_repo: Arc<dyn CatalogRepository>,
        locale: impl Into<String>,
        default_locale: impl Into<String>,
    ) -> Self {
        Self {
            order_repo,
            catalog_repo,
            locale: locale.into(),
            default_locale: default_locale.into(),
            snapshot: RwLock::new(AdminSnapshot::default()),
        }
    }

    /// 表示ロケール
    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, AdminSnapshot> {
        self.snapshot.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, AdminSnapshot> {
        self.snapshot.write().await
    }

    /// ストアから読み直して置き換える
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self) -> Result<(), AdminError> {
        let loaded = self.load().await?;
        *self.snapshot.write().await = loaded;
        Ok(())
    }

    /// 保存に失敗した更新を破棄する
    ///
    /// 書き込みロックを保持したまま読み直す。読み直しにも失敗した場合はログに残し、
    /// メモリ上の変更はそのまま残る。
    pub async fn rollback(&self, snapshot: &mut AdminSnapshot) {
        match self.load().await {
            Ok(loaded) => *snapshot = loaded,
            Err(e) => {
                tracing::error!(error = %e, "保存失敗後のスナップショット再読み込みに失敗しました");
            }
        }
    }

    async fn load(&self) -> Result<AdminSnapshot, AdminError> {
        with_timeout("スナップショット読み込み", SNAPSHOT_TIMEOUT, async {
            let mut orders = Vec::new();
            for mut order in self.order_repo.list_all(&self.default_locale).await? {
                order.fill_derived_statuses();
                let events = self.order_repo.list_events(&order.id).await?;
                orders.push(OrderRecord { order, events });
            }

            let materials = self.catalog_repo.list_materials().await?;

            let mut countries = self
                .catalog_repo
                .list_countries()
                .await?
                .into_iter()
                .map(|country| {
                    let label =
                        resolve_localized_text(&country.label_i18n, &self.locale, &self.default_locale);
                    let label = if label.is_empty() { country.code.clone() } else { label };
                    (country.code, label)
                })
                .collect::<BTreeMap<_, _>>();

            if countries.is_empty() {
                countries = orders
                    .iter()
                    .map(|record| record.order.shipping.country_code.clone())
                    .filter(|code| !code.is_empty())
                    .unique()
                    .map(|code| (code.clone(), code))
                    .collect();
            }

            tracing::debug!(
                orders = orders.len(),
                materials = materials.len(),
                countries = countries.len(),
                "スナップショットを読み込みました"
            );

            Ok(AdminSnapshot {
                orders,
                materials,
                countries,
            })
        })
        .await
    }
}
