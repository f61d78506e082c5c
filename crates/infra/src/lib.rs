//! # Hanko インフラ層
//!
//! ドキュメントストアとの接続・読み書き、決済プロバイダの Webhook 検証を担当する。
//!
//! ## 設計方針
//!
//! 論理的にはコレクションとドキュメントからなるストアを、PostgreSQL の JSONB テーブル
//! （[`store::PgDocumentStore`]）とインメモリ（[`memory::InMemoryDocumentStore`]）の
//! 2 つの実装で提供する。リポジトリは [`store::DocumentStore`] と [`db::TxContext`] にのみ依存し、
//! どちらの実装でも同じように動く。
//!
//! ## 依存関係
//!
//! ```text
//! apps → infra → domain
//!    ↘          ↗
//!      shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - 接続プール、マイグレーション、トランザクション
//! - [`store`] - ドキュメントストアのポートと PostgreSQL 実装
//! - [`memory`] - インメモリ実装
//! - [`decode`] - 保存データの寛容なデコード
//! - [`repository`] - 型付きリポジトリ
//! - [`stripe`] - Stripe Webhook の署名検証とイベント解析
//! - [`seed`] - デモカタログ
//! - [`error`] - インフラ層エラー定義
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use hanko_infra::{db, store::PgDocumentStore};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/hanko").await?;
//!     db::run_migrations(&pool).await?;
//!
//!     let store = Arc::new(PgDocumentStore::new(pool, "hanko-dev"));
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod decode;
pub mod error;
pub mod memory;
pub mod repository;
pub mod seed;
pub mod store;
pub mod stripe;

pub use error::InfraError;
