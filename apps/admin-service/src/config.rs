//! # 管理画面設定
//!
//! 環境変数から管理画面サーバーの設定を読み込む。
//!
//! ## 起動モード
//!
//! | モード | ストア | プロジェクト ID / `DATABASE_URL` |
//! |--------|--------|----------------------------------|
//! | `mock` | モックデータを投入したインメモリストア | 不要 |
//! | `dev`  | PostgreSQL（`_DEV` のプロジェクト ID を優先） | 必須 |
//! | `prod` | PostgreSQL（`_PROD` のプロジェクト ID を優先） | 必須 |

use std::env;

use strum::EnumString;
use thiserror::Error;

const MODE_KEYS: &[&str] = &["HANKO_ADMIN_MODE", "HANKO_ADMIN_ENV"];
const ADDR_KEYS: &[&str] = &["ADMIN_HTTP_ADDR"];
const LOCALE_KEYS: &[&str] = &["HANKO_ADMIN_LOCALE"];
const DEFAULT_LOCALE_KEYS: &[&str] = &["HANKO_ADMIN_DEFAULT_LOCALE"];

const DEV_PROJECT_ID_KEYS: &[&str] = &[
    "HANKO_ADMIN_FIREBASE_PROJECT_ID_DEV",
    "HANKO_ADMIN_FIREBASE_PROJECT_ID",
    "FIRESTORE_PROJECT_ID",
    "FIREBASE_PROJECT_ID",
    "GOOGLE_CLOUD_PROJECT",
];
const PROD_PROJECT_ID_KEYS: &[&str] = &[
    "HANKO_ADMIN_FIREBASE_PROJECT_ID_PROD",
    "HANKO_ADMIN_FIREBASE_PROJECT_ID",
    "FIRESTORE_PROJECT_ID",
    "FIREBASE_PROJECT_ID",
    "GOOGLE_CLOUD_PROJECT",
];

const DEFAULT_ADDR: &str = ":3051";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_LOCALE: &str = "ja";

/// 起動モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum AdminMode {
    Mock,
    Dev,
    Prod,
}

impl AdminMode {
    fn project_id_keys(self) -> &'static [&'static str] {
        match self {
            Self::Mock => &[],
            Self::Dev => DEV_PROJECT_ID_KEYS,
            Self::Prod => PROD_PROJECT_ID_KEYS,
        }
    }
}

/// 設定エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid HANKO_ADMIN_MODE {0:?}: use mock, dev, or prod")]
    InvalidMode(String),

    #[error("ADMIN_HTTP_ADDR は host:port 形式である必要があります: {0}")]
    InvalidAddr(String),

    #[error("{mode} モードではプロジェクト ID が必要です: {}", .keys.join(", "))]
    MissingProjectId {
        mode: AdminMode,
        keys: &'static [&'static str],
    },

    #[error("{0} モードでは DATABASE_URL が必要です")]
    MissingDatabaseUrl(AdminMode),
}

/// 管理画面サーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub mode:           AdminMode,
    /// バインドアドレス
    pub host:           String,
    /// ポート番号
    pub port:           u16,
    /// 表示ロケール
    pub locale:         String,
    /// ラベルが表示ロケールにないときのロケール
    pub default_locale: String,
    /// プロジェクト ID（ドキュメントストアの名前空間、mock では `None`）
    pub project_id:     Option<String>,
    /// PostgreSQL 接続 URL（mock では `None`）
    pub database_url:   Option<String>,
}

impl AdminConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = match env_first(&lookup, MODE_KEYS) {
            Some((_, value)) => value
                .to_lowercase()
                .parse::<AdminMode>()
                .map_err(|_| ConfigError::InvalidMode(value.to_lowercase()))?,
            None => AdminMode::Mock,
        };

        let addr = env_first(&lookup, ADDR_KEYS)
            .map_or_else(|| DEFAULT_ADDR.to_string(), |(_, value)| value);
        let (host, port) = parse_addr(&addr)?;

        let string_or = |keys: &[&'static str], default: &str| {
            env_first(&lookup, keys).map_or_else(|| default.to_string(), |(_, value)| value)
        };
        let locale = string_or(LOCALE_KEYS, DEFAULT_LOCALE).to_lowercase();
        let default_locale = string_or(DEFAULT_LOCALE_KEYS, DEFAULT_LOCALE).to_lowercase();

        let (project_id, database_url) = if mode == AdminMode::Mock {
            (None, None)
        } else {
            let keys = mode.project_id_keys();
            let project_id = env_first(&lookup, keys)
                .map(|(_, value)| value)
                .ok_or(ConfigError::MissingProjectId { mode, keys })?;
            let database_url = env_first(&lookup, &["DATABASE_URL"])
                .map(|(_, value)| value)
                .ok_or(ConfigError::MissingDatabaseUrl(mode))?;
            (Some(project_id), Some(database_url))
        };

        Ok(Self {
            mode,
            host,
            port,
            locale,
            default_locale,
            project_id,
            database_url,
        })
    }
}

/// `host:port` または `:port` を分解する
///
/// ホストを省略した場合は全インターフェースで待ち受ける。
fn parse_addr(addr: &str) -> Result<(String, u16), ConfigError> {
    let invalid = || ConfigError::InvalidAddr(addr.to_string());

    let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = if host.is_empty() { DEFAULT_HOST } else { host };

    Ok((host.to_string(), port))
}

/// 最初に見つかった空でない値をキーと一緒に返す（値は trim 済み）
fn env_first(
    lookup: impl Fn(&str) -> Option<String>,
    keys: &[&'static str],
) -> Option<(&'static str, String)> {
    keys.iter().find_map(|&key| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| (key, value))
    })
}
