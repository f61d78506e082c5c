//! # 注文 API サーバー
//!
//! 公開アプリ・Web から呼ばれる注文 API のエントリーポイント。
//!
//! ## 役割
//!
//! - **カタログ**: 公開ロケール設定と、有効な書体・材質・配送国
//! - **注文作成**: 冪等キー付きの注文作成と注文番号の採番
//! - **決済 Webhook**: Stripe の署名検証と、1 イベント 1 回の注文への適用
//!
//! ## ストア
//!
//! `DATABASE_URL` が設定されていれば PostgreSQL のドキュメントテーブルを使い、
//! プロジェクト ID を名前空間とする。未設定ならデモカタログを投入したインメモリストアで起動する。
//!
//! ## 起動方法
//!
//! ```bash
//! cargo run -p hanko-order-api
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use hanko_domain::clock::{Clock, SharedClock, SystemClock};
use hanko_infra::{
    db::{self, TransactionManager},
    memory::InMemoryDocumentStore,
    seed::seed_demo_catalog,
    store::{DocumentStore, PgDocumentStore},
};
use hanko_order_api::{build_app, config::ApiConfig};
use hanko_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let _app_span = init_tracing(&TracingConfig::from_env("order-api"));

    // 設定読み込み
    let config = ApiConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!("注文 API サーバーを起動します: {}:{}", config.host, config.port);

    let clock: SharedClock = Arc::new(SystemClock);

    // ストアの初期化
    let (store, tx_manager): (Arc<dyn DocumentStore>, Arc<dyn TransactionManager>) =
        match (&config.database_url, &config.project_id) {
            (Some(database_url), Some(project_id)) => {
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
            _ => {
                tracing::warn!("DATABASE_URL が未設定のため、インメモリストアで起動します");
                let store = Arc::new(InMemoryDocumentStore::new());
                seed_demo_catalog(store.as_ref(), clock.now())
                    .await
                    .context("デモカタログの投入に失敗しました")?;
                (store.clone() as Arc<dyn DocumentStore>, store as Arc<dyn TransactionManager>)
            }
        };

    if config.stripe_webhook_secret.is_empty() {
        tracing::warn!("Stripe Webhook の署名シークレットが未設定のため、署名を検証しません");
    }

    let app = build_app(&config, store, tx_manager, clock);

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("注文 API サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
