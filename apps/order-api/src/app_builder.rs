//! # 注文 API アプリケーション構築
//!
//! リポジトリ・ユースケース・State の組み立てとルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use hanko_domain::clock::SharedClock;
use hanko_infra::{
    db::TransactionManager,
    repository::{
        CatalogRepository,
        DocumentCatalogRepository,
        DocumentIdempotencyRepository,
        DocumentOrderNoCounterRepository,
        DocumentOrderRepository,
        DocumentWebhookEventRepository,
        OrderRepository,
    },
    store::DocumentStore,
};
use hanko_shared::{
    canonical_log::CanonicalLogLineLayer,
    observability::{MakeRequestUuidV7, make_request_span},
};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    config::ApiConfig,
    handler::{
        CatalogState,
        MAX_REQUEST_BODY_BYTES,
        OrderState,
        WebhookState,
        create_order,
        get_catalog,
        get_public_config,
        health_check,
        method_not_allowed,
        not_found,
        stripe_webhook,
    },
    usecase::{CatalogUseCaseImpl, OrderUseCaseImpl, WebhookUseCaseImpl},
};

/// ユースケースの組み立てとルーター定義を行う
///
/// ストアは PostgreSQL 実装とインメモリ実装のどちらでもよい。
pub fn build_app(
    config: &ApiConfig,
    store: Arc<dyn DocumentStore>,
    tx_manager: Arc<dyn TransactionManager>,
    clock: SharedClock,
) -> Router {
    let catalog_repo: Arc<dyn CatalogRepository> =
        Arc::new(DocumentCatalogRepository::new(store.clone()));
    let order_repo: Arc<dyn OrderRepository> = Arc::new(DocumentOrderRepository::new(store));

    let catalog_state = Arc::new(CatalogState {
        usecase:       CatalogUseCaseImpl::new(catalog_repo.clone()),
        assets_bucket: config.assets_bucket.clone(),
    });

    let order_state = Arc::new(OrderState {
        usecase: OrderUseCaseImpl::new(
            catalog_repo,
            order_repo.clone(),
            Arc::new(DocumentIdempotencyRepository::new()),
            Arc::new(DocumentOrderNoCounterRepository::new()),
            tx_manager.clone(),
            clock.clone(),
        ),
    });

    let webhook_state = Arc::new(WebhookState {
        usecase:        WebhookUseCaseImpl::new(
            order_repo,
            Arc::new(DocumentWebhookEventRepository::new()),
            tx_manager,
            clock.clone(),
        ),
        webhook_secret: config.stripe_webhook_secret.clone(),
        clock,
    });

    Router::new()
        .route("/healthz", get(health_check))
        .merge(
            Router::new()
                .route("/v1/config/public", get(get_public_config))
                .route("/v1/catalog", get(get_catalog))
                .with_state(catalog_state),
        )
        .merge(
            Router::new()
                .route("/v1/orders", post(create_order))
                .with_state(order_state),
        )
        .merge(
            Router::new()
                .route("/v1/payments/stripe/webhook", post(stripe_webhook))
                .with_state(webhook_state),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        // 下に書いたものが外側
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CanonicalLogLineLayer)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
