//! # リポジトリ実装
//!
//! ドキュメントストア上のコレクションを型付きで読み書きする。
//!
//! ## 設計方針
//!
//! - **ストア抽象化**: すべて [`crate::store::DocumentStore`] と [`crate::db::TxContext`] 経由で操作し、
//!   PostgreSQL とインメモリの両方で動く
//! - **書き込みはトランザクション内**: 書き込みメソッドは `&mut TxContext` を受け取る
//! - **寛容な読み取り**: 読み取りは [`crate::decode`] で型の揺れを吸収する
//! - **テスタビリティ**: トレイト経由で差し替え可能な設計

pub mod catalog_repository;
pub mod idempotency_repository;
pub mod order_no_counter_repository;
pub mod order_repository;
pub mod webhook_event_repository;

pub use catalog_repository::{CatalogRepository, DocumentCatalogRepository};
pub use idempotency_repository::{DocumentIdempotencyRepository, IdempotencyRepository};
pub use order_no_counter_repository::{DocumentOrderNoCounterRepository, OrderNoCounterRepository};
pub use order_repository::{DocumentOrderRepository, OrderRepository};
pub use webhook_event_repository::{DocumentWebhookEventRepository, WebhookEventRepository};
