//! # ログとリクエストトレース
//!
//! 注文 API と管理画面が起動時に呼ぶトレーシング初期化。
//!
//! - `LOG_FORMAT=json|pretty`（既定は pretty）
//! - `RUST_LOG` が未設定なら [`DEFAULT_LOG_FILTER`]
//! - HTTP リクエストごとに UUID v7 の `x-request-id` を振り、[`make_request_span`] のスパンに載せる

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解釈する（未知の値は警告して pretty）
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: LOG_FORMAT={other:?} は未対応のため pretty で出力します");
                Self::Pretty
            }
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `app` スパンの `service` に入る名前（`order-api` / `admin-service`）
    pub service_name: &'static str,
    pub log_format:   LogFormat,
}

impl TracingConfig {
    /// `LOG_FORMAT` を読んで設定を作る
    pub fn from_env(service_name: &'static str) -> Self {
        let log_format = std::env::var("LOG_FORMAT")
            .map_or_else(|_| LogFormat::default(), |value| LogFormat::parse(&value));
        Self {
            service_name,
            log_format,
        }
    }
}

/// 既定のログフィルタ（`RUST_LOG` 未設定時）
pub const DEFAULT_LOG_FILTER: &str = "info,hanko=debug";

/// リクエスト ID のヘッダ名
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// トレーシングを初期化し、`app` スパンに入る
///
/// 戻り値は `main` の終わりまで保持する。
/// インフラ層のエラーが `SpanTrace` を取れるよう `ErrorLayer` も登録する。
#[cfg(feature = "observability")]
pub fn init_tracing(config: &TracingConfig) -> tracing::span::EnteredSpan {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();

    tracing::info_span!("app", service = config.service_name).entered()
}

/// リクエストスパンを作る（`TraceLayer::make_span_with` 用）
///
/// `method`, `uri`, `request_id` を持つ。リクエスト ID は
/// `SetRequestIdLayer` が付与した `x-request-id` ヘッダから読む。
#[cfg(feature = "observability")]
pub fn make_request_span<B>(request: &http::Request<B>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// UUID v7 のリクエスト ID を生成する
///
/// `SetRequestIdLayer::x_request_id(MakeRequestUuidV7)` として使う。
/// 時刻順に並ぶため、ログを ID でソートすると到着順になる。
#[cfg(feature = "observability")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

#[cfg(feature = "observability")]
impl tower_http::request_id::MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(
        &mut self,
        _request: &http::Request<B>,
    ) -> Option<tower_http::request_id::RequestId> {
        http::HeaderValue::from_str(&uuid::Uuid::now_v7().to_string())
            .ok()
            .map(tower_http::request_id::RequestId::new)
    }
}
