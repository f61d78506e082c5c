//! # 管理画面サービス
//!
//! オペレーター向けの注文・材質管理 API を提供する。
//! 統合テスト用に内部モジュールへのアクセスを提供する。
//!
//! ## モジュール構成
//!
//! - [`config`] - 起動モードと環境変数からの設定読み込み
//! - [`error`] - 管理画面エラーと HTTP レスポンスへの変換
//! - [`usecase`] - スナップショットと更新処理
//! - [`handler`] - HTTP ハンドラ
//! - [`mock`] - `mock` モードのデータ
//! - [`app_builder`] - ルーター構築

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod mock;
pub mod usecase;

pub use app_builder::build_app;
