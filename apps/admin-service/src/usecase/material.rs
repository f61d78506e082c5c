//! # 材質管理ユースケース
//!
//! 材質の一覧・詳細と作成・編集・削除を扱う。いずれも注文の更新と同じく、
//! 書き込みロックの下でメモリを変更してから保存し、失敗したら読み直す。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hanko_domain::{
    catalog::{
        Material,
        MaterialCreateInput,
        MaterialPatch,
        MaterialPatchInput,
        sort_entries,
        validate_material_key,
    },
    clock::SharedClock,
    locale::resolve_localized_text,
};
use hanko_infra::{db::TransactionManager, repository::CatalogRepository};
use hanko_shared::{event_log::event, log_business_event};
use serde::Serialize;

use super::{PERSIST_TIMEOUT, SnapshotCache, persistence_error, with_timeout};
use crate::error::{AdminError, MATERIAL_KEY_DUPLICATED, MATERIAL_KEY_INVALID, MATERIAL_NOT_FOUND};

/// 材質一覧の 1 行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialListItem {
    pub key:        String,
    pub label:      String,
    pub price_jpy:  i64,
    pub is_active:  bool,
    pub sort_order: i64,
    pub version:    i64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 材質の編集画面
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialDetail {
    pub key:                String,
    pub label_ja:           String,
    pub label_en:           String,
    pub description_ja:     String,
    pub description_en:     String,
    pub price_jpy:          i64,
    pub sort_order:         i64,
    pub is_active:          bool,
    pub version:            i64,
    pub updated_at:         Option<DateTime<Utc>>,
    pub photo_storage_path: String,
    pub photo_alt_ja:       String,
    pub photo_alt_en:       String,
}

impl From<&Material> for MaterialDetail {
    fn from(material: &Material) -> Self {
        let text = |values: &hanko_domain::locale::I18nText, locale: &str| {
            values.get(locale).cloned().unwrap_or_default()
        };
        let photo = material.primary_photo();

        Self {
            key:                material.key.clone(),
            label_ja:           text(&material.label_i18n, "ja"),
            label_en:           text(&material.label_i18n, "en"),
            description_ja:     text(&material.description_i18n, "ja"),
            description_en:     text(&material.description_i18n, "en"),
            price_jpy:          material.price_jpy,
            sort_order:         material.sort_order,
            is_active:          material.is_active,
            version:            material.version,
            updated_at:         material.updated_at,
            photo_storage_path: photo.map(|p| p.storage_path.clone()).unwrap_or_default(),
            photo_alt_ja:       photo.map(|p| text(&p.alt_i18n, "ja")).unwrap_or_default(),
            photo_alt_en:       photo.map(|p| text(&p.alt_i18n, "en")).unwrap_or_default(),
        }
    }
}

/// 材質管理ユースケース
pub struct AdminMaterialUseCaseImpl {
    cache:        Arc<SnapshotCache>,
    catalog_repo: Arc<dyn CatalogRepository>,
    tx_manager:   Arc<dyn TransactionManager>,
    clock:        SharedClock,
}

impl AdminMaterialUseCaseImpl {
    pub fn new(
        cache: Arc<SnapshotCache>,
        catalog_repo: Arc<dyn CatalogRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: SharedClock,
    ) -> Self {
        Self {
            cache,
            catalog_repo,
            tx_manager,
            clock,
        }
    }

    /// ストアから読み直して材質一覧を返す（無効化されたものも含む）
    pub async fn list_materials(&self) -> Result<Vec<MaterialListItem>, AdminError> {
        self.cache.refresh().await?;

        let snapshot = self.cache.read().await;
        Ok(snapshot
            .materials
            .iter()
            .map(|material| MaterialListItem {
                key:        material.key.clone(),
                label:      resolve_localized_text(
                    &material.label_i18n,
                    self.cache.locale(),
                    self.cache.default_locale(),
                ),
                price_jpy:  material.price_jpy,
                is_active:  material.is_active,
                sort_order: material.sort_order,
                version:    material.version,
                updated_at: material.updated_at,
            })
            .collect())
    }

    pub async fn get_material_detail(&self, key: &str) -> Result<MaterialDetail, AdminError> {
        let snapshot = self.cache.read().await;
        snapshot
            .material(key)
            .map(MaterialDetail::from)
            .ok_or(AdminError::NotFound(MATERIAL_NOT_FOUND))
    }

    /// 材質を新規作成する
    ///
    /// キーと入力を検証し、`version` 1 で保存する。
    #[tracing::instrument(skip_all, fields(material_key = %input.key.trim()))]
    pub async fn create_material(
        &self,
        input: MaterialCreateInput,
    ) -> Result<MaterialDetail, AdminError> {
        let key = input.key.trim().to_string();
        validate_material_key(&key)?;
        let patch = MaterialPatch::new(input.fields)?;
        let now = self.clock.now();

        let mut snapshot = self.cache.write().await;
        if snapshot.material(&key).is_some() {
            return Err(AdminError::Conflict(MATERIAL_KEY_DUPLICATED));
        }
        let created = Material::create(&key, &patch, now);
        snapshot.materials.push(created.clone());
        sort_entries(&mut snapshot.materials);

        let result = with_timeout("材質の作成", PERSIST_TIMEOUT, self.try_create(&created)).await;
        if let Err(e) = result {
            tracing::warn!(material_key = %key, error = %e, "材質の保存に失敗したため読み直します");
            self.cache.rollback(&mut snapshot).await;
            return Err(persistence_error(e));
        }

        log_business_event!(
            event.category = event::category::CATALOG,
            event.action = event::action::MATERIAL_CREATED,
            event.entity_type = event::entity_type::MATERIAL,
            event.entity_id = %created.key,
            event.result = event::result::SUCCESS,
            material.price_jpy = created.price_jpy,
            "材質作成"
        );

        Ok(MaterialDetail::from(&created))
    }

    /// 材質を編集する
    ///
    /// 入力を検証してから適用し、`version` は保存値の次の版にする。
    #[tracing::instrument(skip_all, fields(material_key = %key))]
    pub async fn update_material(
        &self,
        key: &str,
        input: MaterialPatchInput,
    ) -> Result<MaterialDetail, AdminError> {
        let patch = MaterialPatch::new(input)?;
        let now = self.clock.now();

        let mut snapshot = self.cache.write().await;
        let material = snapshot
            .material_mut(key)
            .ok_or(AdminError::NotFound(MATERIAL_NOT_FOUND))?;
        material.apply_patch(&patch, now);
        let updated = material.clone();

        let saved = match with_timeout("材質の更新", PERSIST_TIMEOUT, self.try_update(&updated)).await
        {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(material_key = %key, error = %e, "材質の保存に失敗したため読み直します");
                self.cache.rollback(&mut snapshot).await;
                return Err(persistence_error(e));
            }
        };
        if let Some(material) = snapshot.material_mut(key) {
            *material = saved.clone();
        }

        log_business_event!(
            event.category = event::category::CATALOG,
            event.action = event::action::MATERIAL_UPDATED,
            event.entity_type = event::entity_type::MATERIAL,
            event.entity_id = %saved.key,
            event.result = event::result::SUCCESS,
            material.version = saved.version,
            material.price_jpy = saved.price_jpy,
            "材質更新"
        );

        Ok(MaterialDetail::from(&saved))
    }

    /// 材質を削除する
    #[tracing::instrument(skip_all, fields(material_key = %key.trim()))]
    pub async fn delete_material(&self, key: &str) -> Result<(), AdminError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AdminError::Validation(MATERIAL_KEY_INVALID.to_string()));
        }

        let mut snapshot = self.cache.write().await;
        let before = snapshot.materials.len();
        snapshot.materials.retain(|material| material.key != key);
        if snapshot.materials.len() == before {
            return Err(AdminError::NotFound(MATERIAL_NOT_FOUND));
        }

        let result = with_timeout("材質の削除", PERSIST_TIMEOUT, self.try_delete(key)).await;
        if let Err(e) = result {
            tracing::warn!(material_key = %key, error = %e, "材質の削除に失敗したため読み直します");
            self.cache.rollback(&mut snapshot).await;
            return Err(persistence_error(e));
        }

        log_business_event!(
            event.category = event::category::CATALOG,
            event.action = event::action::MATERIAL_DELETED,
            event.entity_type = event::entity_type::MATERIAL,
            event.entity_id = %key,
            event.result = event::result::SUCCESS,
            "材質削除"
        );

        Ok(())
    }

    async fn try_create(&self, material: &Material) -> Result<(), AdminError> {
        let mut tx = self.tx_manager.begin().await?;
        match self.catalog_repo.create_material(&mut tx, material).await {
            Err(e) if e.as_conflict().is_some() => {
                return Err(AdminError::Conflict(MATERIAL_KEY_DUPLICATED));
            }
            other => other?,
        }
        tx.commit().await?;
        Ok(())
    }

    /// 保存した材質を返す
    async fn try_update(&self, material: &Material) -> Result<Material, AdminError> {
        let mut tx = self.tx_manager.begin().await?;
        let stored = self
            .catalog_repo
            .find_material_tx(&mut tx, &material.key)
            .await?
            .ok_or_else(|| AdminError::Persistence(MATERIAL_NOT_FOUND.to_string()))?;

        // 読み込み後に別の編集で版が進んでいても、保存値の次の版にする
        let mut saved = material.clone();
        saved.version = stored.version + 1;

        self.catalog_repo.save_material(&mut tx, &saved).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn try_delete(&self, key: &str) -> Result<(), AdminError> {
        let mut tx = self.tx_manager.begin().await?;
        self.catalog_repo.delete_material(&mut tx, key).await?;
        tx.commit().await?;
        Ok(())
    }
}
