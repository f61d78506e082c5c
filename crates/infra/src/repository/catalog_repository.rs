//! # CatalogRepository
//!
//! 公開ロケール設定と、書体・材質・配送国の読み書きを担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **公開一覧は有効なもののみ**: `is_active=true` を `sort_order` → キーの順で返す
//! - **注文作成時の参照はトランザクション内**: 存在しなければ `InvalidReference`、
//!   無効化されていれば `InactiveReference`
//! - **管理画面は全件**: 無効化されたものも含め、`is_active` の欠損は有効として扱う

use std::sync::Arc;

use async_trait::async_trait;
use hanko_domain::{
    catalog::{CatalogEntry, CatalogKind, Country, Font, Material, active_sorted, sort_entries},
    locale::LocaleConfig,
};
use serde_json::{Value as JsonValue, json};

use crate::{
    db::TxContext,
    decode::{decode_country, decode_font, decode_locale_config, decode_material},
    error::InfraError,
    store::{DocumentStore, OrderBy, StoredDocument, collections},
};

/// カタログリポジトリトレイト
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// 公開ロケール設定を取得する（ドキュメントがなければ `{ja, en}` / `ja`）
    async fn get_public_config(&self) -> Result<LocaleConfig, InfraError>;

    async fn list_active_fonts(&self) -> Result<Vec<Font>, InfraError>;

    /// 有効な材質を取得する（写真は `(sort_order, asset_id)` 順）
    async fn list_active_materials(&self) -> Result<Vec<Material>, InfraError>;

    async fn list_active_countries(&self) -> Result<Vec<Country>, InfraError>;

    /// 管理画面向けに全材質を取得する
    async fn list_materials(&self) -> Result<Vec<Material>, InfraError>;

    /// 管理画面向けに全配送国を取得する
    async fn list_countries(&self) -> Result<Vec<Country>, InfraError>;

    /// トランザクション内で公開ロケール設定を取得する
    async fn get_public_config_tx(&self, tx: &mut TxContext) -> Result<LocaleConfig, InfraError>;

    /// トランザクション内で注文が参照する書体を取得する
    ///
    /// # 戻り値
    ///
    /// - `Ok(font)`: 有効な書体
    /// - `Err(InvalidReference)`: 存在しない
    /// - `Err(InactiveReference)`: 無効化されている
    async fn get_font_tx(&self, tx: &mut TxContext, key: &str) -> Result<Font, InfraError>;

    /// トランザクション内で注文が参照する材質を取得する
    async fn get_material_tx(&self, tx: &mut TxContext, key: &str)
    -> Result<Material, InfraError>;

    /// トランザクション内で注文が参照する配送国を取得する
    async fn get_country_tx(&self, tx: &mut TxContext, code: &str) -> Result<Country, InfraError>;

    /// トランザクション内で材質を取得する（管理画面の更新用）
    async fn find_material_tx(
        &self,
        tx: &mut TxContext,
        key: &str,
    ) -> Result<Option<Material>, InfraError>;

    /// 材質を保存する
    async fn save_material(&self, tx: &mut TxContext, material: &Material)
    -> Result<(), InfraError>;

    /// 材質を新規作成する（同じキーがあれば `Conflict`）
    async fn create_material(
        &self,
        tx: &mut TxContext,
        material: &Material,
    ) -> Result<(), InfraError>;

    /// 材質を削除する
    async fn delete_material(&self, tx: &mut TxContext, key: &str) -> Result<(), InfraError>;
}

/// ドキュメントストア実装のカタログリポジトリ
pub struct DocumentCatalogRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentCatalogRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn list(&self, kind: CatalogKind) -> Result<Vec<StoredDocument>, InfraError> {
        self.store
            .list(kind.collection(), Some(OrderBy::asc("sort_order")))
            .await
    }
}

/// 材質ドキュメントの本文
fn material_document(material: &Material) -> JsonValue {
    json!({
        "label_i18n": material.label_i18n,
        "description_i18n": material.description_i18n,
        "photos": material.photos,
        "price_jpy": material.price_jpy,
        "is_active": material.is_active,
        "sort_order": material.sort_order,
        "version": material.version,
        "updated_at": material.updated_at,
    })
}

/// 参照先の存在と有効性を確認する
fn ensure_active<T: CatalogEntry>(
    kind: CatalogKind,
    key: &str,
    entry: Option<T>,
) -> Result<T, InfraError> {
    match entry {
        None => Err(InfraError::invalid_reference(kind, key)),
        Some(entry) if !entry.is_active() => Err(InfraError::inactive_reference(kind, key)),
        Some(entry) => Ok(entry),
    }
}

#[async_trait]
impl CatalogRepository for DocumentCatalogRepository {
    async fn get_public_config(&self) -> Result<LocaleConfig, InfraError> {
        let document = self
            .store
            .get(collections::APP_CONFIG, collections::PUBLIC_CONFIG_ID)
            .await?;
        Ok(decode_locale_config(document.as_ref()))
    }

    async fn list_active_fonts(&self) -> Result<Vec<Font>, InfraError> {
        let documents = self.list(CatalogKind::Font).await?;
        Ok(active_sorted(documents.iter().map(decode_font)))
    }

    async fn list_active_materials(&self) -> Result<Vec<Material>, InfraError> {
        let documents = self.list(CatalogKind::Material).await?;
        Ok(active_sorted(
            documents.iter().map(|document| decode_material(document, false)),
        ))
    }

    async fn list_active_countries(&self) -> Result<Vec<Country>, InfraError> {
        let documents = self.list(CatalogKind::Country).await?;
        Ok(active_sorted(documents.iter().map(decode_country)))
    }

    async fn list_materials(&self) -> Result<Vec<Material>, InfraError> {
        let documents = self.list(CatalogKind::Material).await?;
        let mut materials = documents
            .iter()
            .map(|document| decode_material(document, true))
            .collect::<Vec<_>>();
        sort_entries(&mut materials);
        Ok(materials)
    }

    async fn list_countries(&self) -> Result<Vec<Country>, InfraError> {
        let documents = self.list(CatalogKind::Country).await?;
        let mut countries = documents.iter().map(decode_country).collect::<Vec<_>>();
        sort_entries(&mut countries);
        Ok(countries)
    }

    async fn get_public_config_tx(&self, tx: &mut TxContext) -> Result<LocaleConfig, InfraError> {
        let document = tx
            .get(collections::APP_CONFIG, collections::PUBLIC_CONFIG_ID)
            .await?;
        Ok(decode_locale_config(document.as_ref()))
    }

    async fn get_font_tx(&self, tx: &mut TxContext, key: &str) -> Result<Font, InfraError> {
        let kind = CatalogKind::Font;
        let document = tx.get(kind.collection(), key).await?;
        ensure_active(kind, key, document.as_ref().map(decode_font))
    }

    async fn get_material_tx(
        &self,
        tx: &mut TxContext,
        key: &str,
    ) -> Result<Material, InfraError> {
        let kind = CatalogKind::Material;
        let document = tx.get(kind.collection(), key).await?;
        ensure_active(
            kind,
            key,
            document.as_ref().map(|document| decode_material(document, false)),
        )
    }

    async fn get_country_tx(&self, tx: &mut TxContext, code: &str) -> Result<Country, InfraError> {
        let kind = CatalogKind::Country;
        let document = tx.get(kind.collection(), code).await?;
        ensure_active(kind, code, document.as_ref().map(decode_country))
    }

    async fn find_material_tx(
        &self,
        tx: &mut TxContext,
        key: &str,
    ) -> Result<Option<Material>, InfraError> {
        let document = tx.get(CatalogKind::Material.collection(), key).await?;
        Ok(document.as_ref().map(|document| decode_material(document, true)))
    }

    async fn save_material(
        &self,
        tx: &mut TxContext,
        material: &Material,
    ) -> Result<(), InfraError> {
        tx.merge(
            CatalogKind::Material.collection(),
            &material.key,
            material_document(material),
        )
        .await
    }

    async fn create_material(
        &self,
        tx: &mut TxContext,
        material: &Material,
    ) -> Result<(), InfraError> {
        tx.create(
            CatalogKind::Material.collection(),
            &material.key,
            material_document(material),
        )
        .await
    }

    async fn delete_material(&self, tx: &mut TxContext, key: &str) -> Result<(), InfraError> {
        tx.delete(CatalogKind::Material.collection(), key).await
    }
}
