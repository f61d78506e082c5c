/// プレフィックス付き文字列 ID 型を定義する宣言型マクロ
///
/// ドキュメント ID として使う `ord_0192...` 形式の ID を生成する。
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`String` をラップ）
/// - `derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()`: `{prefix}_{UUID の 16 進表記}` を生成
/// - `from_string()`: 既存 ID から復元（ストアから読み出した ID をそのまま使う）
/// - `as_str()`: 内部文字列への参照
/// - `Default` impl（`new()` に委譲）
///
/// UUID のバージョンは `v7`（時刻順）または `v4`（ランダム）を指定する。
///
/// # 使用例
///
/// ```rust
/// use hanko_domain::order::OrderId;
///
/// let id = OrderId::new();
/// let restored = OrderId::from_string(id.as_str());
/// assert_eq!(id, restored);
/// ```
macro_rules! define_prefixed_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident($prefix:literal, $version:ident);
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl $Name {
            /// 新しい ID を生成する
            pub fn new() -> Self {
                Self(format!(
                    "{}_{}",
                    $prefix,
                    define_prefixed_id!(@uuid $version).simple()
                ))
            }

            /// 既存の文字列から ID を作成する
            pub fn from_string(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// 内部の文字列参照を取得する
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    (@uuid v7) => {
        uuid::Uuid::now_v7()
    };
    (@uuid v4) => {
        uuid::Uuid::new_v4()
    };
}
