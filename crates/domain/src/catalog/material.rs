//! # 材質
//!
//! 材質はロケール別の名称・説明文、価格、写真を持つ。
//! 管理画面からの編集は [`MaterialPatch`] を検証してから [`Material::apply_patch`] で適用する。
//! 新規作成は [`validate_material_key`] でキーを検証し、[`Material::create`] で `version` 1 から始める。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, locale::I18nText};

/// 材質の写真
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialPhoto {
    pub asset_id:     String,
    pub storage_path: String,
    pub alt_i18n:     I18nText,
    pub sort_order:   i64,
    pub is_primary:   bool,
    pub width:        i64,
    pub height:       i64,
}

/// 材質
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub key:              String,
    pub label_i18n:       I18nText,
    pub description_i18n: I18nText,
    pub photos:           Vec<MaterialPhoto>,
    pub price_jpy:        i64,
    pub is_active:        bool,
    pub sort_order:       i64,
    pub version:          i64,
    pub updated_at:       Option<DateTime<Utc>>,
}

/// 写真を `(sort_order, asset_id)` の昇順に並べる
pub fn sort_photos(photos: &mut [MaterialPhoto]) {
    photos.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.asset_id.cmp(&b.asset_id))
    });
}

/// ストレージパスを正規化する（前後の空白と先頭の `/` を除く）
pub fn normalize_storage_path(value: &str) -> String {
    value.trim().trim_start_matches('/').to_string()
}

/// キーの最大長（バイト数）
const MAX_KEY_LEN: usize = 64;

/// 材質キーを検証する
///
/// 英小文字・数字・`-`・`_` のみ、64 文字以内。`__...__` 形式は予約済み。
pub fn validate_material_key(key: &str) -> Result<(), DomainError> {
    if key.is_empty() {
        return Err(invalid("材質キーは必須です。"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(invalid("材質キーは 64 文字以内で入力してください。"));
    }
    if key.starts_with("__") && key.ends_with("__") {
        return Err(invalid("材質キーに `__...__` 形式は利用できません。"));
    }
    if !key
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '-' | '_'))
    {
        return Err(invalid(
            "材質キーは英小文字・数字・ハイフン・アンダースコアのみ使用できます。",
        ));
    }
    Ok(())
}

impl Material {
    /// 検証済みの内容から新しい材質を作る
    pub fn create(key: &str, patch: &MaterialPatch, now: DateTime<Utc>) -> Self {
        let mut material = Self {
            key:              key.to_string(),
            label_i18n:       I18nText::new(),
            description_i18n: I18nText::new(),
            photos:           Vec::new(),
            price_jpy:        0,
            is_active:        true,
            sort_order:       0,
            version:          0,
            updated_at:       None,
        };
        material.apply_patch(patch, now);
        material
    }

    /// 代表写真（`is_primary` の最初、なければ先頭）
    pub fn primary_photo(&self) -> Option<&MaterialPhoto> {
        self.photos
            .iter()
            .find(|photo| photo.is_primary)
            .or_else(|| self.photos.first())
    }

    /// 検証済みの編集内容を適用する
    ///
    /// `version` を 1 増やし、`updated_at` を更新する。
    pub fn apply_patch(&mut self, patch: &MaterialPatch, now: DateTime<Utc>) {
        self.label_i18n.insert("ja".to_string(), patch.label_ja.clone());
        self.label_i18n.insert("en".to_string(), patch.label_en.clone());
        self.description_i18n
            .insert("ja".to_string(), patch.description_ja.clone());
        self.description_i18n
            .insert("en".to_string(), patch.description_en.clone());
        self.price_jpy = patch.price_jpy;
        self.sort_order = patch.sort_order;
        self.is_active = patch.is_active;
        self.merge_primary_photo(
            &patch.photo_storage_path,
            &patch.photo_alt_ja,
            &patch.photo_alt_en,
        );
        self.version += 1;
        self.updated_at = Some(now);
    }

    /// 代表写真のパスと代替テキストを差し替える
    ///
    /// パスが空なら何もしない。写真がなければ `mat_{key}_01` を代表写真として作る。
    fn merge_primary_photo(&mut self, storage_path: &str, alt_ja: &str, alt_en: &str) {
        if storage_path.is_empty() {
            return;
        }

        if self.photos.is_empty() {
            self.photos.push(MaterialPhoto {
                asset_id:     default_asset_id(&self.key),
                storage_path: storage_path.to_string(),
                alt_i18n:     I18nText::new(),
                sort_order:   0,
                is_primary:   true,
                width:        0,
                height:       0,
            });
        }

        let primary_index = self
            .photos
            .iter()
            .position(|photo| photo.is_primary)
            .unwrap_or(0);

        for (index, photo) in self.photos.iter_mut().enumerate() {
            if index != primary_index {
                photo.is_primary = false;
                continue;
            }

            photo.storage_path = storage_path.to_string();
            photo.is_primary = true;
            if photo.asset_id.trim().is_empty() {
                photo.asset_id = default_asset_id(&self.key);
            }
            for (locale, alt) in [("ja", alt_ja), ("en", alt_en)] {
                if alt.is_empty() {
                    photo.alt_i18n.remove(locale);
                } else {
                    photo.alt_i18n.insert(locale.to_string(), alt.to_string());
                }
            }
        }
    }
}

fn default_asset_id(material_key: &str) -> String {
    format!("mat_{material_key}_01")
}

/// 管理画面からの材質編集内容
///
/// [`MaterialPatch::new`] で正規化と検証を行う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialPatch {
    label_ja:           String,
    label_en:           String,
    description_ja:     String,
    description_en:     String,
    price_jpy:          i64,
    sort_order:         i64,
    is_active:          bool,
    photo_storage_path: String,
    photo_alt_ja:       String,
    photo_alt_en:       String,
}

/// 材質編集の入力値（未検証）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MaterialPatchInput {
    pub label_ja:           String,
    pub label_en:           String,
    pub description_ja:     String,
    pub description_en:     String,
    pub price_jpy:          i64,
    pub sort_order:         i64,
    pub is_active:          bool,
    pub photo_storage_path: String,
    pub photo_alt_ja:       String,
    pub photo_alt_en:       String,
}

/// 材質作成の入力値（未検証）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MaterialCreateInput {
    pub key:    String,
    #[serde(flatten)]
    pub fields: MaterialPatchInput,
}

impl MaterialPatch {
    pub fn new(input: MaterialPatchInput) -> Result<Self, DomainError> {
        let patch = Self {
            label_ja:           input.label_ja.trim().to_string(),
            label_en:           input.label_en.trim().to_string(),
            description_ja:     input.description_ja.trim().to_string(),
            description_en:     input.description_en.trim().to_string(),
            price_jpy:          input.price_jpy,
            sort_order:         input.sort_order,
            is_active:          input.is_active,
            photo_storage_path: normalize_storage_path(&input.photo_storage_path),
            photo_alt_ja:       input.photo_alt_ja.trim().to_string(),
            photo_alt_en:       input.photo_alt_en.trim().to_string(),
        };

        if patch.label_ja.is_empty() || patch.label_en.is_empty() {
            return Err(invalid("材質名（ja/en）は必須です。"));
        }
        if patch.description_ja.is_empty() || patch.description_en.is_empty() {
            return Err(invalid("説明文（ja/en）は必須です。"));
        }
        if patch.price_jpy < 0 {
            return Err(invalid("価格は 0 以上で入力してください。"));
        }
        if patch.sort_order < 0 {
            return Err(invalid("表示順は 0 以上で入力してください。"));
        }
        validate_photo_storage_path(&patch.photo_storage_path)?;

        Ok(patch)
    }
}

fn validate_photo_storage_path(storage_path: &str) -> Result<(), DomainError> {
    let lowered = storage_path.to_lowercase();
    if ["http://", "https://", "gs://"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return Err(invalid(
            "写真は URL ではなく Storage パス（例: materials/titanium/mat_titanium_01.webp）を入力してください。",
        ));
    }
    if storage_path.chars().any(char::is_whitespace) {
        return Err(invalid("写真パスに空白文字は使用できません。"));
    }
    Ok(())
}

fn invalid(message: &str) -> DomainError {
    DomainError::Validation(message.to_string())
}
