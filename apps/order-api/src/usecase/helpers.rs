//! ユースケース層の共通ヘルパー
//!
//! ストア操作の制限時間と、同時作成競合時のやり直しを共通化する。

use std::{future::Future, time::Duration};

use hanko_infra::InfraError;

use crate::error::ApiError;

/// 同時作成競合時の最大試行回数
pub(crate) const MAX_ATTEMPTS: u32 = 3;

/// 制限時間内に完了しなければタイムアウトエラーにする
pub(crate) async fn with_timeout<T>(
    operation: &'static str,
    limit: Duration,
    future: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| ApiError::Store(InfraError::timeout(operation, limit.as_secs())))?
}

/// 同時作成競合（[`ApiError::is_retryable`]）の間は最大 [`MAX_ATTEMPTS`] 回まで実行する
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    operation: &'static str,
    mut attempt: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut tried = 1;
    loop {
        match attempt().await {
            Err(e) if e.is_retryable() && tried < MAX_ATTEMPTS => {
                tracing::warn!(operation, attempt = tried, error = %e, "競合のため再試行します");
                tried += 1;
            }
            result => return result,
        }
    }
}
