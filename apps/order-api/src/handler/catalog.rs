//! # 公開設定・カタログ API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /v1/config/public`: 対応ロケールと既定ロケール
//! - `GET /v1/catalog?locale={locale}`: 有効な書体・材質・配送国（ラベルはロケールで解決）

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use hanko_domain::{
    catalog::{Country, Font, Material, MaterialPhoto, make_asset_url},
    locale::{I18nText, resolve_localized_text},
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, usecase::CatalogUseCaseImpl};

/// カタログハンドラーの State
pub struct CatalogState {
    pub usecase:       CatalogUseCaseImpl,
    /// 写真の配信 URL を組み立てるバケット
    pub assets_bucket: String,
}

/// カタログ取得のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub locale: Option<String>,
}

/// 公開設定レスポンス
#[derive(Debug, Serialize)]
pub struct PublicConfigResponse {
    pub supported_locales: Vec<String>,
    pub default_locale:    String,
}

/// カタログレスポンス
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub locale:            String,
    pub supported_locales: Vec<String>,
    pub default_locale:    String,
    pub fonts:             Vec<FontDto>,
    pub materials:         Vec<MaterialDto>,
    pub countries:         Vec<CountryDto>,
}

#[derive(Debug, Serialize)]
pub struct FontDto {
    pub key:         String,
    pub label:       String,
    pub font_family: String,
    pub version:     i64,
}

#[derive(Debug, Serialize)]
pub struct MaterialDto {
    pub key:         String,
    pub label:       String,
    pub description: String,
    pub price_jpy:   i64,
    pub version:     i64,
    pub photos:      Vec<MaterialPhotoDto>,
}

#[derive(Debug, Serialize)]
pub struct MaterialPhotoDto {
    pub asset_id:     String,
    pub asset_url:    String,
    pub storage_path: String,
    pub alt:          String,
    pub sort_order:   i64,
    pub is_primary:   bool,
    pub width:        i64,
    pub height:       i64,
}

#[derive(Debug, Serialize)]
pub struct CountryDto {
    pub code:             String,
    pub label:            String,
    pub shipping_fee_jpy: i64,
    pub version:          i64,
}

/// ロケール別テキストの解決に使う文脈
struct Localizer<'a> {
    locale:         &'a str,
    default_locale: &'a str,
    assets_bucket:  &'a str,
}

impl Localizer<'_> {
    fn text(&self, values: &I18nText) -> String {
        resolve_localized_text(values, self.locale, self.default_locale)
    }

    fn font(&self, font: &Font) -> FontDto {
        FontDto {
            key:         font.key.clone(),
            label:       self.text(&font.label_i18n),
            font_family: font.font_family.clone(),
            version:     font.version,
        }
    }

    fn material(&self, material: &Material) -> MaterialDto {
        MaterialDto {
            key:         material.key.clone(),
            label:       self.text(&material.label_i18n),
            description: self.text(&material.description_i18n),
            price_jpy:   material.price_jpy,
            version:     material.version,
            photos:      material.photos.iter().map(|photo| self.photo(photo)).collect(),
        }
    }

    fn photo(&self, photo: &MaterialPhoto) -> MaterialPhotoDto {
        MaterialPhotoDto {
            asset_id:     photo.asset_id.clone(),
            asset_url:    make_asset_url(self.assets_bucket, &photo.storage_path),
            storage_path: photo.storage_path.clone(),
            alt:          self.text(&photo.alt_i18n),
            sort_order:   photo.sort_order,
            is_primary:   photo.is_primary,
            width:        photo.width,
            height:       photo.height,
        }
    }

    fn country(&self, country: &Country) -> CountryDto {
        CountryDto {
            code:             country.code.clone(),
            label:            self.text(&country.label_i18n),
            shipping_fee_jpy: country.shipping_fee_jpy,
            version:          country.version,
        }
    }
}

/// 公開設定を取得する
///
/// ## エンドポイント
/// GET /v1/config/public
#[tracing::instrument(skip_all)]
pub async fn get_public_config(
    State(state): State<Arc<CatalogState>>,
) -> Result<impl IntoResponse, ApiError> {
    let config = state.usecase.get_public_config().await?;

    Ok(Json(PublicConfigResponse {
        supported_locales: config.supported_locales().to_vec(),
        default_locale:    config.default_locale().to_string(),
    }))
}

/// カタログを取得する
///
/// ## エンドポイント
/// GET /v1/catalog?locale={locale}
#[tracing::instrument(skip_all)]
pub async fn get_catalog(
    State(state): State<Arc<CatalogState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let catalog = state.usecase.get_catalog(query.locale.as_deref()).await?;

    let localizer = Localizer {
        locale:         &catalog.locale,
        default_locale: catalog.config.default_locale(),
        assets_bucket:  &state.assets_bucket,
    };

    Ok(Json(CatalogResponse {
        fonts:             catalog.fonts.iter().map(|f| localizer.font(f)).collect(),
        materials:         catalog.materials.iter().map(|m| localizer.material(m)).collect(),
        countries:         catalog.countries.iter().map(|c| localizer.country(c)).collect(),
        locale:            catalog.locale.clone(),
        supported_locales: catalog.config.supported_locales().to_vec(),
        default_locale:    catalog.config.default_locale().to_string(),
    }))
}
