//! # 注文 API 設定
//!
//! 環境変数から注文 API サーバーの設定を読み込む。
//!
//! 同じ設定に複数の環境変数名がある場合は、先に挙げたものから順に
//! 最初の空でない値を採用する。

use std::env;

use thiserror::Error;

const PROJECT_ID_KEYS: &[&str] = &[
    "API_FIRESTORE_PROJECT_ID",
    "FIRESTORE_PROJECT_ID",
    "API_FIREBASE_PROJECT_ID",
    "FIREBASE_PROJECT_ID",
    "GOOGLE_CLOUD_PROJECT",
];
const PORT_KEYS: &[&str] = &["API_SERVER_PORT", "PORT"];
const ASSETS_BUCKET_KEYS: &[&str] = &["API_STORAGE_ASSETS_BUCKET"];
const WEBHOOK_SECRET_KEYS: &[&str] = &["API_PSP_STRIPE_WEBHOOK_SECRET"];

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3050;
const DEFAULT_ASSETS_BUCKET: &str = "local-assets";

/// 設定エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} は有効なポート番号である必要があります: {value}")]
    InvalidPort { key: &'static str, value: String },

    #[error("DATABASE_URL を指定する場合はプロジェクト ID（{}）が必要です", PROJECT_ID_KEYS.join(", "))]
    MissingProjectId,
}

/// 注文 API サーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// プロジェクト ID（ドキュメントストアの名前空間）
    pub project_id: Option<String>,
    /// 材質写真のバケット
    pub assets_bucket: String,
    /// Stripe Webhook の署名シークレット（空なら検証しない）
    pub stripe_webhook_secret: String,
    /// PostgreSQL 接続 URL（未設定ならインメモリストア）
    pub database_url: Option<String>,
}

impl ApiConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match env_first(&lookup, PORT_KEYS) {
            Some((key, value)) => value
                .parse()
                .map_err(|_| ConfigError::InvalidPort { key, value })?,
            None => DEFAULT_PORT,
        };

        let project_id = env_first(&lookup, PROJECT_ID_KEYS).map(|(_, value)| value);
        let database_url = env_first(&lookup, &["DATABASE_URL"]).map(|(_, value)| value);
        if database_url.is_some() && project_id.is_none() {
            return Err(ConfigError::MissingProjectId);
        }

        Ok(Self {
            host: env_first(&lookup, &["API_SERVER_HOST"])
                .map_or_else(|| DEFAULT_HOST.to_string(), |(_, value)| value),
            port,
            project_id,
            assets_bucket: env_first(&lookup, ASSETS_BUCKET_KEYS)
                .map_or_else(|| DEFAULT_ASSETS_BUCKET.to_string(), |(_, value)| value),
            stripe_webhook_secret: env_first(&lookup, WEBHOOK_SECRET_KEYS)
                .map(|(_, value)| value)
                .unwrap_or_default(),
            database_url,
        })
    }
}

/// 最初に見つかった空でない値をキーと一緒に返す（値は trim 済み）
pub fn env_first(
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
