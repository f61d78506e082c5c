//! # カタログユースケース
//!
//! 公開ロケール設定と、有効な書体・材質・配送国の取得を扱う。
//! ローカライズ（表示ラベルの選択）はハンドラ層の DTO 変換で行う。

use std::{sync::Arc, time::Duration};

use hanko_domain::{
    catalog::{Country, Font, Material},
    locale::LocaleConfig,
};
use hanko_infra::repository::CatalogRepository;

use super::helpers::with_timeout;
use crate::error::ApiError;

/// カタログ読み取りの制限時間
pub const CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

/// ロケールを解決したカタログ
#[derive(Debug, Clone)]
pub struct LocalizedCatalog {
    /// 解決済みのロケール
    pub locale:    String,
    pub config:    LocaleConfig,
    pub fonts:     Vec<Font>,
    pub materials: Vec<Material>,
    pub countries: Vec<Country>,
}

/// カタログユースケース実装
pub struct CatalogUseCaseImpl {
    catalog_repo: Arc<dyn CatalogRepository>,
}

impl CatalogUseCaseImpl {
    pub fn new(catalog_repo: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog_repo }
    }

    /// 公開ロケール設定を取得する
    pub async fn get_public_config(&self) -> Result<LocaleConfig, ApiError> {
        with_timeout("公開設定の取得", CATALOG_TIMEOUT, async {
            Ok(self.catalog_repo.get_public_config().await?)
        })
        .await
    }

    /// カタログを取得する
    ///
    /// `requested_locale` は trim + 小文字化し、空なら既定ロケールを使う。
    /// 対応一覧にないロケールは [`ApiError::InvalidLocale`]。
    pub async fn get_catalog(
        &self,
        requested_locale: Option<&str>,
    ) -> Result<LocalizedCatalog, ApiError> {
        with_timeout("カタログの取得", CATALOG_TIMEOUT, async {
            let config = self.catalog_repo.get_public_config().await?;
            let locale = config
                .resolve_requested(requested_locale)
                .ok_or(ApiError::InvalidLocale)?;

            let fonts = self.catalog_repo.list_active_fonts().await?;
            let materials = self.catalog_repo.list_active_materials().await?;
            let countries = self.catalog_repo.list_active_countries().await?;

            Ok(LocalizedCatalog {
                locale,
                config,
                fonts,
                materials,
                countries,
            })
        })
        .await
    }
}
