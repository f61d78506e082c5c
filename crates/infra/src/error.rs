//! # インフラ層エラー定義
//!
//! ドキュメントストアとの通信や保存データの解釈で発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Database, Conflict, InvalidReference 等）
//!
//! `From` 実装と convenience constructor はエラー生成時の呼び出し経路を自動記録する。

use std::fmt;

use derive_more::Display;
use hanko_domain::catalog::CatalogKind;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
///
/// ## パターンマッチ
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::InvalidReference { kind, key } => { /* 400 */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// データベースエラー
    ///
    /// SQL の実行失敗、接続エラーなど。
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// シリアライズ/デシリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// 同じ ID のドキュメントが同時に作成された
    ///
    /// 冪等キー・採番カウンター・Webhook 記録の同時作成で発生する。
    /// 呼び出し側はトランザクションをやり直せる。
    #[error("競合が発生しました: {entity}(id={id})")]
    Conflict {
        /// コレクション名
        entity: String,
        /// ドキュメント ID
        id:     String,
    },

    /// 注文が参照するカタログが存在しない
    #[error("invalid {kind}: {key}")]
    InvalidReference { kind: CatalogKind, key: String },

    /// 注文が参照するカタログが無効化されている
    #[error("inactive {kind}: {key}")]
    InactiveReference { kind: CatalogKind, key: String },

    /// 操作がタイムアウトした
    #[error("{operation} が {seconds} 秒以内に完了しませんでした")]
    Timeout { operation: String, seconds: u64 },

    /// 呼び出し側の入力が不正
    #[error("入力エラー: {0}")]
    InvalidInput(String),

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Conflict バリアントの場合、entity と id を返す
    pub fn as_conflict(&self) -> Option<(&str, &str)> {
        match &self.kind {
            InfraErrorKind::Conflict { entity, id } => Some((entity, id)),
            _ => None,
        }
    }

    /// やり直しで解消しうるエラーか
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, InfraErrorKind::Conflict { .. })
    }

    fn new(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    // ===== Convenience constructors =====

    /// 同時作成の競合エラーを生成する
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::Conflict {
            entity: entity.into(),
            id:     id.into(),
        })
    }

    /// 参照先が存在しないエラーを生成する
    pub fn invalid_reference(kind: CatalogKind, key: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::InvalidReference {
            kind,
            key: key.into(),
        })
    }

    /// 参照先が無効化されているエラーを生成する
    pub fn inactive_reference(kind: CatalogKind, key: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::InactiveReference {
            kind,
            key: key.into(),
        })
    }

    /// タイムアウトエラーを生成する
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::new(InfraErrorKind::Timeout {
            operation: operation.into(),
            seconds,
        })
    }

    /// 入力エラーを生成する
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::InvalidInput(msg.into()))
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::Unexpected(msg.into()))
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self::new(InfraErrorKind::Database(source))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self::new(InfraErrorKind::Serialization(source))
    }
}
