//! # デモカタログ
//!
//! インメモリストアで起動したときと、テストで使うカタログ一式を投入する。
//!
//! - 公開設定: `ja` / `en`、既定 `ja`
//! - 書体 5 種
//! - 材質: 柘植 3,600 円、黒水牛 4,800 円、チタン 9,800 円
//! - 配送国: JP（送料 0 円）, US, CA, GB, AU, SG

use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue, json};

use crate::{
    db::TransactionManager,
    error::InfraError,
    store::collections,
};

const FONTS: &[(&str, &str, &str)] = &[
    ("zen_maru_gothic", "Zen Maru Gothic", "'Zen Maru Gothic', sans-serif"),
    ("kosugi_maru", "Kosugi Maru", "'Kosugi Maru', sans-serif"),
    ("potta_one", "Potta One", "'Potta One', sans-serif"),
    ("kiwi_maru", "Kiwi Maru", "'Kiwi Maru', sans-serif"),
    ("wdxl_lubrifont_jp_n", "WDXL Lubrifont JP N", "'WDXL Lubrifont JP N', sans-serif"),
];

/// (キー, ja, en, 説明 ja, 説明 en, 価格)
const MATERIALS: &[(&str, &str, &str, &str, &str, i64)] = &[
    (
        "boxwood",
        "柘植",
        "Boxwood",
        "軽くて扱いやすい定番材",
        "A standard wood that is lightweight and easy to handle.",
        3600,
    ),
    (
        "black_buffalo",
        "黒水牛",
        "Black Buffalo",
        "しっとりした質感で耐久性が高い",
        "Durable material with a smooth texture.",
        4800,
    ),
    (
        "titanium",
        "チタン",
        "Titanium",
        "重厚で摩耗に強いプレミアム材",
        "Premium material with excellent wear resistance.",
        9800,
    ),
];

/// (国コード, ja, en, 送料)
const COUNTRIES: &[(&str, &str, &str, i64)] = &[
    ("JP", "日本", "Japan", 0),
    ("US", "アメリカ", "United States", 1800),
    ("CA", "カナダ", "Canada", 1900),
    ("GB", "イギリス", "United Kingdom", 2000),
    ("AU", "オーストラリア", "Australia", 2100),
    ("SG", "シンガポール", "Singapore", 1300),
];

/// デモカタログのドキュメント一覧（コレクション, ID, 本文）
pub fn demo_catalog_documents(now: DateTime<Utc>) -> Vec<(&'static str, String, JsonValue)> {
    let mut documents = vec![(
        collections::APP_CONFIG,
        collections::PUBLIC_CONFIG_ID.to_string(),
        json!({
            "supported_locales": ["ja", "en"],
            "default_locale": "ja",
            "updated_at": now,
        }),
    )];

    documents.extend(FONTS.iter().zip(1_i64..).map(|(&(key, label, family), order)| {
        (
            collections::FONTS,
            key.to_string(),
            json!({
                "label_i18n": {"ja": label, "en": label},
                "font_family": family,
                "is_active": true,
                "sort_order": order * 10,
                "version": 1,
            }),
        )
    }));

    documents.extend(MATERIALS.iter().zip(1_i64..).map(
        |(&(key, label_ja, label_en, description_ja, description_en, price), order)| {
            (
                collections::MATERIALS,
                key.to_string(),
                json!({
                    "label_i18n": {"ja": label_ja, "en": label_en},
                    "description_i18n": {"ja": description_ja, "en": description_en},
                    "photos": [{
                        "asset_id": format!("mat_{key}_01"),
                        "storage_path": format!("materials/{key}/mat_{key}_01.webp"),
                        "alt_i18n": {"ja": label_ja, "en": label_en},
                        "sort_order": 0,
                        "is_primary": true,
                        "width": 1200,
                        "height": 800,
                    }],
                    "price_jpy": price,
                    "is_active": true,
                    "sort_order": order * 10,
                    "version": 1,
                    "updated_at": now,
                }),
            )
        },
    ));

    documents.extend(COUNTRIES.iter().zip(1_i64..).map(
        |(&(code, label_ja, label_en, fee), order)| {
            (
                collections::COUNTRIES,
                code.to_string(),
                json!({
                    "label_i18n": {"ja": label_ja, "en": label_en},
                    "shipping_fee_jpy": fee,
                    "is_active": true,
                    "sort_order": order * 10,
                    "version": 1,
                }),
            )
        },
    ));

    documents
}

/// デモカタログを 1 トランザクションで投入する
///
/// 既存のドキュメントは上書きする。
pub async fn seed_demo_catalog(
    tx_manager: &dyn TransactionManager,
    now: DateTime<Utc>,
) -> Result<(), InfraError> {
    let mut tx = tx_manager.begin().await?;
    for (collection, id, data) in demo_catalog_documents(now) {
        tx.set(collection, &id, data).await?;
    }
    tx.commit().await?;

    tracing::info!("デモカタログを投入しました");
    Ok(())
}
