//! # 管理画面サーバー
//!
//! オペレーターが注文のステータス変更・出荷登録と材質の編集を行う API のエントリーポイント。
//!
//! ## 起動モード
//!
//! `HANKO_ADMIN_MODE` で切り替える。
//!
//! - `mock`（既定）: モックの注文とデモカタログを投入したインメモリストア
//! - `dev` / `prod`: PostgreSQL のドキュメントテーブル（プロジェクト ID を名前空間とする）
//!
//! ## 起動方法
//!
//! ```bash
//! HANKO_ADMIN_MODE=mock cargo run -p hanko-admin-service
//! ```

use std::sync::Arc;

use anyhow::Context;
use hanko_admin_service::{
    build_app,
    config::{AdminConfig, AdminMode},
    mock::seed_mock_data,
};
use hanko_domain::clock::{Clock, SharedClock, SystemClock};
use hanko_infra::{
    db::{self, TransactionManager},
    memory::InMemoryDocumentStore,
    store::{DocumentStore, PgDocumentStore},
};
use hanko_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let _app_span = init_tracing(&TracingConfig::from_env("admin-service"));

    // 設定読み込み
    let config = AdminConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        mode = %config.mode,
        "管理画面サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let clock: SharedClock = Arc::new(SystemClock);

    // ストアの初期化
    let (store, tx_manager): (Arc<dyn DocumentStore>, Arc<dyn TransactionManager>) =
        match (config.mode, &config.database_url, &config.project_id) {
            (AdminMode::Dev | AdminMode::Prod, Some(database_url), Some(project_id)) => {
                let pool = db::create_pool(database_url)
                    .await
                    .context("データベース接続に失敗しました")?;
                db::run_migrations(&pool)
                    .await
                    .context("マイグレーションに失敗しました")?;
                tracing::info!(namespace = %project_id, "データベースに接続しました");

                let store = Arc::new(PgDocumentStore::new(pool, project_id.clone()));
                (store.clone() as Arc<dyn DocumentStore>, store as Arc<dyn TransactionManager>)
            }
            (AdminMode::Dev | AdminMode::Prod, _, _) => {
                anyhow::bail!("{} モードにはデータベース URL とプロジェクト ID が必要です", config.mode);
            }
            (AdminMode::Mock, _, _) => {
                let store = Arc::new(InMemoryDocumentStore::new());
                seed_mock_data(store.as_ref(), clock.now())
                    .await
                    .context("モックデータの投入に失敗しました")?;
                (store.clone() as Arc<dyn DocumentStore>, store as Arc<dyn TransactionManager>)
            }
        };

    let app = build_app(&config, store, tx_manager, clock)
        .await
        .context("スナップショットの読み込みに失敗しました")?;

    // サーバー起動
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .context("アドレスのバインドに失敗しました")?;
    tracing::info!("管理画面サーバーが起動しました: {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
