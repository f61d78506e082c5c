//! # 注文 API ライブラリ
//!
//! 公開の注文 API（カタログ取得、注文作成、決済 Webhook）を提供する。
//! 統合テスト用に内部モジュールへのアクセスを提供する。
//!
//! ## モジュール構成
//!
//! - [`config`] - 環境変数からの設定読み込み
//! - [`error`] - API エラーと HTTP レスポンスへの変換
//! - [`usecase`] - ビジネスロジック
//! - [`handler`] - HTTP ハンドラ
//! - [`app_builder`] - ルーター構築

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;

pub use app_builder::build_app;
