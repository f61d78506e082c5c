//! # 管理画面アプリケーション構築
//!
//! スナップショット・ユースケース・State の組み立てとルーター構築を担当する。

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch},
};
use hanko_domain::clock::SharedClock;
use hanko_infra::{
    db::TransactionManager,
    repository::{
        CatalogRepository,
        DocumentCatalogRepository,
        DocumentOrderRepository,
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
    config::AdminConfig,
    error::AdminError,
    handler::{
        MAX_REQUEST_BODY_BYTES,
        MaterialState,
        OrderState,
        create_material,
        delete_material,
        get_material,
        get_order,
        health_check,
        list_materials,
        list_orders,
        method_not_allowed,
        not_found,
        update_material,
        update_order_shipping,
        update_order_status,
    },
    usecase::{AdminMaterialUseCaseImpl, AdminOrderUseCaseImpl, SnapshotCache},
};

/// ユースケースの組み立てとルーター定義を行う
///
/// 起動時にスナップショットを 1 度読み込み、失敗したらエラーを返す。
pub async fn build_app(
    config: &AdminConfig,
    store: Arc<dyn DocumentStore>,
    tx_manager: Arc<dyn TransactionManager>,
    clock: SharedClock,
) -> Result<Router, AdminError> {
    let catalog_repo: Arc<dyn CatalogRepository> =
        Arc::new(DocumentCatalogRepository::new(store.clone()));
    let order_repo: Arc<dyn OrderRepository> = Arc::new(DocumentOrderRepository::new(store));

    let cache = Arc::new(SnapshotCache::new(
        order_repo.clone(),
        catalog_repo.clone(),
        config.locale.clone(),
        config.default_locale.clone(),
    ));
    cache.refresh().await?;

    let order_state = Arc::new(OrderState {
        usecase: AdminOrderUseCaseImpl::new(
            cache.clone(),
            order_repo,
            tx_manager.clone(),
            clock.clone(),
        ),
    });

    let material_state = Arc::new(MaterialState {
        usecase: AdminMaterialUseCaseImpl::new(cache, catalog_repo, tx_manager, clock),
    });

    Ok(Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/admin/orders", get(list_orders))
                .route("/admin/orders/{id}", get(get_order))
                .route("/admin/orders/{id}/status", patch(update_order_status))
                .route("/admin/orders/{id}/shipping", patch(update_order_shipping))
                .with_state(order_state),
        )
        .merge(
            Router::new()
                .route("/admin/materials", get(list_materials).post(create_material))
                .route(
                    "/admin/materials/{key}",
                    get(get_material)
                        .patch(update_material)
                        .delete(delete_material),
                )
                .with_state(material_state),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        // 下に書いたものが外側
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CanonicalLogLineLayer)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7)))
}
