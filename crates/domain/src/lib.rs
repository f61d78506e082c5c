//! # Hanko ドメイン層
//!
//! 印鑑注文バックオフィスのビジネスルールを定義する。
//!
//! ## 設計方針
//!
//! - **参照エンティティ**: 書体・材質・配送国はロケール別ラベルとバージョンを持つ
//! - **注文集約**: 注文は作成時にカタログのスナップショットを埋め込み、以後カタログ編集の影響を受けない
//! - **ライフサイクル**: 注文ステータスの遷移はルックアップテーブルで定義し、管理画面と Webhook で共有する
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! apps → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`locale`] - ロケール設定とローカライズ文字列の解決
//! - [`catalog`] - 書体・材質・配送国
//! - [`order`] - 注文集約、ステータス遷移、注文番号、注文作成リクエスト
//! - [`payment`] - 決済イベントとステータス対応表
//! - [`idempotency`] - 冪等キーの記録
//!
//! ## 使用例
//!
//! ```rust
//! use hanko_domain::{DomainError, order::OrderId};
//!
//! let order_id = OrderId::new();
//! assert!(order_id.as_str().starts_with("ord_"));
//!
//! let error = DomainError::NotFound {
//!     entity_type: "Order",
//!     id:          order_id.to_string(),
//! };
//! assert!(error.to_string().contains("Order"));
//! ```

#[macro_use]
mod macros;

pub mod catalog;
pub mod clock;
pub mod error;
pub mod idempotency;
pub mod locale;
pub mod order;
pub mod payment;

pub use error::DomainError;
