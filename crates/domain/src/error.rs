//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 同時更新・キー重複 |
//! | `InvalidTransition` | 400 Bad Request | ステータス遷移表にない遷移 |
//!
//! ## 使用例
//!
//! ```rust
//! use hanko_domain::DomainError;
//!
//! fn validate_carrier(carrier: &str) -> Result<(), DomainError> {
//!     if carrier.trim().is_empty() {
//!         return Err(DomainError::Validation(
//!             "配送業者を入力してください。".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_carrier("").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// `Validation` と `InvalidTransition` のメッセージはそのまま利用者に表示される。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// メッセージは問題のあるフィールド名を含む完結した文とする。
    #[error("{0}")]
    Validation(String),

    /// エンティティが見つからない
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"Order", "Material" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// ステータス遷移表にない遷移
    ///
    /// 現在と遷移先の両方を表示ラベルで保持する。
    #[error("{from_label} から {to_label} には遷移できません。")]
    InvalidTransition {
        from_label: String,
        to_label:   String,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_遷移エラーのメッセージに両方のラベルが含まれる() {
        let error = DomainError::InvalidTransition {
            from_label: "支払い待ち".to_string(),
            to_label:   "配達完了".to_string(),
        };

        assert_eq!(error.to_string(), "支払い待ち から 配達完了 には遷移できません。");
    }

    #[test]
    fn test_バリデーションエラーはメッセージをそのまま表示する() {
        let error = DomainError::Validation("terms_agreed must be true".to_string());

        assert_eq!(error.to_string(), "terms_agreed must be true");
    }
}
