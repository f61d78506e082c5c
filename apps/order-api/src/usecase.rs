//! # ユースケース層
//!
//! 注文 API のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリとトランザクションマネージャを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **書き込みは 1 トランザクション**: 注文作成と Webhook 適用は途中で失敗しても何も残さない
//!
//! ## モジュール構成
//!
//! - `catalog`: 公開設定とカタログの取得
//! - `order`: 注文作成（冪等キー・採番・スナップショット）
//! - `webhook`: 決済 Webhook の適用（1 イベント 1 回）

pub(crate) mod helpers;

pub mod catalog;
pub mod order;
pub mod webhook;

pub use catalog::{CatalogUseCaseImpl, LocalizedCatalog};
pub use order::{CreateOrderOutcome, OrderUseCaseImpl};
pub use webhook::{WebhookOutcome, WebhookUseCaseImpl};
