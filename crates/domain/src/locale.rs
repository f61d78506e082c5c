//! # ロケール
//!
//! 公開ロケール設定（対応ロケール一覧と既定ロケール）と、
//! ロケール別テキスト（`label_i18n` など）から表示文字列を選ぶ規則を定義する。

use std::{
    collections::{BTreeMap, HashSet},
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 既定ロケール
pub const DEFAULT_LOCALE: &str = "ja";

/// 小文字の BCP-47 タグ
static LOCALE_TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[a-z0-9]{2,8})*$").expect("ロケールの正規表現が不正"));

/// ロケール別テキスト（ロケール → 文字列）
///
/// キー順が安定している必要があるため `BTreeMap` を使う。
pub type I18nText = BTreeMap<String, String>;

/// 小文字の BCP-47 タグとして妥当か
pub fn is_valid_locale_tag(value: &str) -> bool {
    LOCALE_TAG_PATTERN.is_match(value)
}

/// 公開ロケール設定
///
/// 常に空でなく、`default_locale` は `supported_locales` に含まれる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    supported_locales: Vec<String>,
    default_locale:    String,
}

impl LocaleConfig {
    /// 保存値から設定を組み立てる
    ///
    /// - 各タグは trim + 小文字化し、空と重複を除く
    /// - 一覧が空なら `[ja, en]`
    /// - 既定ロケールが空または一覧にない場合は `ja`
    /// - 既定ロケールが一覧にない場合は先頭に追加する
    pub fn new(
        supported_locales: impl IntoIterator<Item = impl AsRef<str>>,
        default_locale: &str,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut normalized = supported_locales
            .into_iter()
            .map(|locale| locale.as_ref().trim().to_lowercase())
            .filter(|locale| !locale.is_empty() && seen.insert(locale.clone()))
            .collect::<Vec<_>>();

        if normalized.is_empty() {
            normalized = vec![DEFAULT_LOCALE.to_string(), "en".to_string()];
        }

        let mut default_locale = default_locale.trim().to_lowercase();
        if default_locale.is_empty() || !normalized.contains(&default_locale) {
            default_locale = DEFAULT_LOCALE.to_string();
        }
        if !normalized.contains(&default_locale) {
            normalized.insert(0, default_locale.clone());
        }

        Self {
            supported_locales: normalized,
            default_locale,
        }
    }

    /// 公開設定ドキュメントがない場合の設定
    pub fn fallback() -> Self {
        Self::new(["ja", "en"], DEFAULT_LOCALE)
    }

    pub fn supported_locales(&self) -> &[String] {
        &self.supported_locales
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// 正規化済みのロケールが対応一覧に含まれるか
    pub fn supports(&self, locale: &str) -> bool {
        self.supported_locales.iter().any(|l| l == locale)
    }

    /// リクエストされたロケールを解決する
    ///
    /// 未指定（空）の場合は既定ロケール。対応外なら `None`。
    pub fn resolve_requested(&self, requested: Option<&str>) -> Option<String> {
        let requested = requested
            .map(|locale| locale.trim().to_lowercase())
            .filter(|locale| !locale.is_empty())
            .unwrap_or_else(|| self.default_locale.clone());

        self.supports(&requested).then_some(requested)
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self::fallback()
    }
}

/// ロケール別テキストのキーと値を正規化する
///
/// キーは trim + 小文字化、値は trim し、空の値は除く。
pub fn normalize_i18n<K, V>(values: impl IntoIterator<Item = (K, V)>) -> I18nText
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    values
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.as_ref().trim().to_lowercase();
            let value = value.as_ref().trim();
            (!key.is_empty() && !value.is_empty()).then(|| (key, value.to_string()))
        })
        .collect()
}

/// ロケール別テキストから表示文字列を選ぶ
///
/// 次の順に最初に見つかった空でない値を返す:
///
/// 1. リクエストロケールの完全一致、次にプライマリサブタグ（`ja-jp` → `ja`）
/// 2. 既定ロケール（同上）
/// 3. `ja`
/// 4. キーを昇順に並べた最初の空でない値
///
/// すべて空なら空文字列。
pub fn resolve_localized_text(values: &I18nText, locale: &str, default_locale: &str) -> String {
    [locale, default_locale, DEFAULT_LOCALE]
        .into_iter()
        .find_map(|target| lookup_locale(values, target))
        .or_else(|| {
            values
                .values()
                .map(|value| value.trim())
                .find(|value| !value.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn lookup_locale(values: &I18nText, target: &str) -> Option<String> {
    let target = target.trim().to_lowercase();
    if target.is_empty() {
        return None;
    }

    let find = |wanted: &str| {
        values
            .iter()
            .filter(|(key, _)| key.trim().to_lowercase() == wanted)
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    };

    find(&target).or_else(|| {
        target
            .split_once('-')
            .and_then(|(primary, _)| find(primary))
    })
}
