//! # エラーレスポンス
//!
//! 全エンドポイントで共通のエラーレスポンス `{"error": {"code", "message"}}` を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は各サービスの責務（shared に axum 依存を入れない）
//! - `code` はクライアントが分岐に使う安定した識別子、`message` は人間向けの説明

use serde::{Deserialize, Serialize};

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// エラーの中身
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code:    String,
    pub message: String,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code:    code.into(),
                message: message.into(),
            },
        }
    }

    /// 404 Not Found
    pub fn not_found() -> Self {
        Self::new("not_found", "not found")
    }

    /// 405 Method Not Allowed
    pub fn method_not_allowed() -> Self {
        Self::new("method_not_allowed", "method not allowed")
    }

    /// 500 Internal Server Error
    ///
    /// message は固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new("internal", "internal server error")
    }

    /// エラーコード
    pub fn code(&self) -> &str {
        &self.error.code
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_jsonはerrorの下にcodeとmessageを持つ() {
        let error = ErrorResponse::new("invalid_locale", "unsupported locale");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "error": {"code": "invalid_locale", "message": "unsupported locale"}
            })
        );
    }

    #[test]
    fn test_internal_errorは固定メッセージを返す() {
        let error = ErrorResponse::internal_error();

        assert_eq!(error.code(), "internal");
        assert_eq!(error.error.message, "internal server error");
    }

    #[test]
    fn test_jsonデシリアライズが正しく動作する() {
        let json = r#"{"error": {"code": "not_found", "message": "not found"}}"#;
        let error: ErrorResponse = serde_json::from_str(json).unwrap();

        assert_eq!(error, ErrorResponse::not_found());
    }
}
