//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! ログを `jq` で調査しやすいよう、フィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! 既存の `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.result`: 結果（[`event::result`] の定数を使用）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const ORDER: &str = "order";
        pub const PAYMENT: &str = "payment";
        pub const CATALOG: &str = "catalog";
    }

    /// イベントアクション
    pub mod action {
        // 注文
        pub const ORDER_CREATED: &str = "order.created";
        pub const ORDER_REPLAYED: &str = "order.replayed";
        pub const ORDER_STATUS_CHANGED: &str = "order.status_changed";
        pub const ORDER_SHIPMENT_REGISTERED: &str = "order.shipment_registered";

        // 決済
        pub const WEBHOOK_PROCESSED: &str = "payment.webhook_processed";

        // カタログ
        pub const MATERIAL_CREATED: &str = "material.created";
        pub const MATERIAL_UPDATED: &str = "material.updated";
        pub const MATERIAL_DELETED: &str = "material.deleted";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const ORDER: &str = "order";
        pub const WEBHOOK_EVENT: &str = "payment_webhook_event";
        pub const MATERIAL: &str = "material";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（ドキュメントストア）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス（決済プロバイダ）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const TIMEOUT: &str = "timeout";
        pub const INTERNAL: &str = "internal";
        pub const WEBHOOK_SIGNATURE: &str = "webhook_signature";
    }
}
