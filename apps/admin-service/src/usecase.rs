//! # 管理画面ユースケース
//!
//! 注文と材質の一覧・詳細・更新を実装する。
//!
//! ## 設計方針
//!
//! - **スナップショット**: 注文（イベント付き）・材質・配送国ラベルをメモリに保持し、
//!   一覧表示のたびにストアから読み直す
//! - **更新は書き込みロックの下で**: メモリ上の集約を変更してからストアへ 1 トランザクションで保存する
//! - **保存失敗はロールバック**: ストアからスナップショットを読み直し、メモリ上の変更を破棄する

pub mod material;
pub mod order;
pub mod snapshot;

use std::{future::Future, time::Duration};

use hanko_infra::InfraError;

pub use self::{
    material::{AdminMaterialUseCaseImpl, MaterialDetail, MaterialListItem},
    order::{
        AdminOrderUseCaseImpl,
        OrderDetail,
        OrderFilter,
        OrderListItem,
        ShippingUpdate,
        StatusUpdate,
    },
    snapshot::{AdminSnapshot, OrderRecord, SnapshotCache},
};
use crate::error::AdminError;

/// 保存 1 回あたりの制限時間
pub const PERSIST_TIMEOUT: Duration = Duration::from_secs(7);

/// 操作者 ID が指定されなかったときの値
pub const DEFAULT_ACTOR_ID: &str = "admin.console";

/// 制限時間内に完了しなければタイムアウトエラーにする
pub(crate) async fn with_timeout<T>(
    operation: &'static str,
    limit: Duration,
    future: impl Future<Output = Result<T, AdminError>>,
) -> Result<T, AdminError> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| AdminError::Store(InfraError::timeout(operation, limit.as_secs())))?
}

/// 保存処理のエラーを利用者向けに変換する
///
/// ストアのエラーは `store update failed: ...` にまとめ、検証・遷移エラーはそのまま返す。
pub(crate) fn persistence_error(err: AdminError) -> AdminError {
    match err {
        AdminError::Store(e) => AdminError::Persistence(e.to_string()),
        other => other,
    }
}

/// 空白のみの操作者 ID は既定値にする
pub(crate) fn actor_or_default(actor_id: Option<&str>) -> &str {
    actor_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_ACTOR_ID)
}
