//! # カタログ
//!
//! 注文作成時に参照する書体・材質・配送国を定義する。
//!
//! いずれも `label_i18n`、`is_active`、`sort_order`、`version` を持つ。
//! `version` は編集のたびに 1 ずつ増え、注文作成時にスナップショットとして注文に埋め込まれる。

pub mod material;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

pub use self::material::{
    Material,
    MaterialCreateInput,
    MaterialPatch,
    MaterialPatchInput,
    MaterialPhoto,
    validate_material_key,
};
use crate::locale::I18nText;

/// カタログの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CatalogKind {
    Font,
    Material,
    Country,
}

impl CatalogKind {
    /// 保存先のコレクション名
    pub fn collection(self) -> &'static str {
        match self {
            Self::Font => "fonts",
            Self::Material => "materials",
            Self::Country => "countries",
        }
    }
}

/// カタログエントリ共通の並び順・有効判定
pub trait CatalogEntry {
    fn key(&self) -> &str;
    fn sort_order(&self) -> i64;
    fn is_active(&self) -> bool;
}

/// `sort_order` → キーの昇順に並べる
pub fn sort_entries<T: CatalogEntry>(entries: &mut [T]) {
    entries.sort_by(|a, b| {
        a.sort_order()
            .cmp(&b.sort_order())
            .then_with(|| a.key().cmp(b.key()))
    });
}

/// 有効なエントリのみを並び順どおりに返す
pub fn active_sorted<T: CatalogEntry>(entries: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut active = entries
        .into_iter()
        .filter(|entry| entry.is_active())
        .collect::<Vec<_>>();
    sort_entries(&mut active);
    active
}

/// 書体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font {
    pub key:         String,
    pub label_i18n:  I18nText,
    pub font_family: String,
    pub is_active:   bool,
    pub sort_order:  i64,
    pub version:     i64,
}

/// 配送国
///
/// `code` は ISO 3166-1 alpha-2 の大文字。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code:             String,
    pub label_i18n:       I18nText,
    pub shipping_fee_jpy: i64,
    pub is_active:        bool,
    pub sort_order:       i64,
    pub version:          i64,
}

impl CatalogEntry for Font {
    fn key(&self) -> &str {
        &self.key
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

impl CatalogEntry for Material {
    fn key(&self) -> &str {
        &self.key
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

impl CatalogEntry for Country {
    fn key(&self) -> &str {
        &self.code
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// 写真のストレージパスから配信 URL を組み立てる
///
/// - パスが空なら空文字列
/// - バケット未設定なら `/{path}`
/// - それ以外は `https://storage.googleapis.com/{bucket}/{path}`
pub fn make_asset_url(bucket: &str, storage_path: &str) -> String {
    let path = storage_path.trim().trim_start_matches('/');
    let bucket = bucket.trim().trim_matches('/');

    if path.is_empty() {
        return String::new();
    }
    if bucket.is_empty() {
        return format!("/{path}");
    }
    format!("https://storage.googleapis.com/{bucket}/{path}")
}
