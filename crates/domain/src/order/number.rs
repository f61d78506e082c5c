//! # 注文番号
//!
//! 注文番号は `HF-{YYYYMMDD}-{連番4桁}` 形式。
//! 連番は JST の暦月ごとにリセットされ、日付部分は JST の日付を使う。
//! 保存時刻は UTC のまま扱い、暦の計算のみ +09:00 固定で行う。

use chrono::{DateTime, FixedOffset, Utc};

/// JST（+09:00 固定）
const JST: FixedOffset = match FixedOffset::east_opt(9 * 3600) {
    Some(offset) => offset,
    None => panic!("JST の時差が範囲外"),
};

fn to_jst(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    now.with_timezone(&JST)
}

/// 連番カウンターのバケット ID（JST の `YYYYMM`）
pub fn counter_bucket(now: DateTime<Utc>) -> String {
    to_jst(now).format("%Y%m").to_string()
}

/// 注文番号を組み立てる
pub fn format_order_no(now: DateTime<Utc>, seq: i64) -> String {
    format!("HF-{}-{seq:04}", to_jst(now).format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    // UTC 2026-01-31 15:00 は JST 2026-02-01 00:00
    #[case(Utc.with_ymd_and_hms(2026, 1, 31, 15, 0, 0).unwrap(), "202602", "HF-20260201-0001")]
    #[case(Utc.with_ymd_and_hms(2026, 1, 31, 14, 59, 59).unwrap(), "202601", "HF-20260131-0001")]
    #[case(Utc.with_ymd_and_hms(2025, 12, 31, 15, 30, 0).unwrap(), "202601", "HF-20260101-0001")]
    fn test_jstの暦でバケットと日付を決める(
        #[case] now: DateTime<Utc>,
        #[case] bucket: &str,
        #[case] order_no: &str,
    ) {
        assert_eq!(counter_bucket(now), bucket);
        assert_eq!(format_order_no(now, 1), order_no);
    }

    #[test]
    fn test_連番は4桁ゼロ埋めで桁あふれしても切り詰めない() {
        let now = Utc.with_ymd_and_hms(2026, 5, 10, 0, 0, 0).unwrap();

        assert_eq!(format_order_no(now, 42), "HF-20260510-0042");
        assert_eq!(format_order_no(now, 12345), "HF-20260510-12345");
    }
}
