//! # 注文ライフサイクル
//!
//! 注文ステータスの遷移表と、ステータスから導出される支払い・出荷ステータスを定義する。
//!
//! 遷移表・導出表はいずれもルックアップテーブルとして持ち、
//! 管理画面からの更新と決済 Webhook の両方がこのテーブルを参照する。
//!
//! ```text
//! pending_payment → paid | canceled
//! paid            → manufacturing | refunded
//! manufacturing   → shipped | refunded
//! shipped         → delivered | refunded
//! delivered / canceled / refunded は終端
//! ```
//!
//! 保存済みの値には未知の文字列が含まれうるため、判定関数は `&str` を受け取り、
//! 未知のステータスからの遷移はすべて不正とする。

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::DomainError;

/// 注文ステータス
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumIter,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    /// 支払い待ち
    PendingPayment,
    /// 支払い済み
    Paid,
    /// 製造中
    Manufacturing,
    /// 出荷済み
    Shipped,
    /// 配達完了
    Delivered,
    /// キャンセル
    Canceled,
    /// 返金済み
    Refunded,
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("不正な注文ステータス: {s}")))
    }
}

/// 支払いステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    /// 未払い
    Unpaid,
    /// 処理中
    Processing,
    /// 支払い済み
    Paid,
    /// 失敗
    Failed,
    /// 返金済み
    Refunded,
}

/// 出荷ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FulfillmentStatus {
    /// 未着手
    Pending,
    /// 製造中
    Manufacturing,
    /// 出荷済み
    Shipped,
    /// 配達完了
    Delivered,
}

/// 遷移表
const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (OrderStatus::PendingPayment, &[OrderStatus::Paid, OrderStatus::Canceled]),
    (OrderStatus::Paid, &[OrderStatus::Manufacturing, OrderStatus::Refunded]),
    (OrderStatus::Manufacturing, &[OrderStatus::Shipped, OrderStatus::Refunded]),
    (OrderStatus::Shipped, &[OrderStatus::Delivered, OrderStatus::Refunded]),
    (OrderStatus::Delivered, &[]),
    (OrderStatus::Canceled, &[]),
    (OrderStatus::Refunded, &[]),
];

/// 出荷登録と同時に指定できる遷移先
const SHIPPING_STAGES: &[OrderStatus] = &[
    OrderStatus::Manufacturing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
];

/// 導出表（`None` は「現在値を保持し、空なら pending」）
const DERIVED: &[(OrderStatus, PaymentStatus, Option<FulfillmentStatus>)] = &[
    (
        OrderStatus::PendingPayment,
        PaymentStatus::Unpaid,
        Some(FulfillmentStatus::Pending),
    ),
    (OrderStatus::Paid, PaymentStatus::Paid, Some(FulfillmentStatus::Pending)),
    (
        OrderStatus::Manufacturing,
        PaymentStatus::Paid,
        Some(FulfillmentStatus::Manufacturing),
    ),
    (OrderStatus::Shipped, PaymentStatus::Paid, Some(FulfillmentStatus::Shipped)),
    (
        OrderStatus::Delivered,
        PaymentStatus::Paid,
        Some(FulfillmentStatus::Delivered),
    ),
    (
        OrderStatus::Canceled,
        PaymentStatus::Failed,
        Some(FulfillmentStatus::Pending),
    ),
    (OrderStatus::Refunded, PaymentStatus::Refunded, None),
];

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// 表示ラベル
    pub fn label(self) -> &'static str {
        match self {
            Self::PendingPayment => "支払い待ち",
            Self::Paid => "支払い済み",
            Self::Manufacturing => "製造中",
            Self::Shipped => "出荷済み",
            Self::Delivered => "配達完了",
            Self::Canceled => "キャンセル",
            Self::Refunded => "返金済み",
        }
    }

    /// 遷移可能なステータス
    pub fn next_statuses(self) -> &'static [OrderStatus] {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map(|(_, to)| *to)
            .unwrap_or_default()
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    /// 出荷登録と同時に指定できるステータスか
    pub fn is_shipping_stage(self) -> bool {
        SHIPPING_STAGES.contains(&self)
    }
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unpaid => "未払い",
            Self::Processing => "処理中",
            Self::Paid => "支払い済み",
            Self::Failed => "失敗",
            Self::Refunded => "返金済み",
        }
    }
}

impl FulfillmentStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "未着手",
            Self::Manufacturing => "製造中",
            Self::Shipped => "出荷済み",
            Self::Delivered => "配達完了",
        }
    }
}

/// 保存値の注文ステータスから遷移可能なステータスを返す（未知の値は空）
pub fn next_statuses(current: &str) -> &'static [OrderStatus] {
    current
        .parse::<OrderStatus>()
        .map(OrderStatus::next_statuses)
        .unwrap_or_default()
}

/// `(current, next)` が遷移表にあるか
pub fn can_transition(current: &str, next: &str) -> bool {
    next.parse::<OrderStatus>()
        .is_ok_and(|next| next_statuses(current).contains(&next))
}

/// 出荷登録画面で選べる遷移先（出荷関連のステータスのみ）
pub fn shipping_transitions(current: &str) -> Vec<OrderStatus> {
    next_statuses(current)
        .iter()
        .copied()
        .filter(|status| status.is_shipping_stage())
        .collect()
}

/// ステータスから導出される支払い・出荷ステータス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedStatuses {
    pub payment_status:     String,
    pub fulfillment_status: String,
}

/// 注文ステータスから支払い・出荷ステータスを導出する
///
/// 返金済みと未知のステータスは出荷ステータスを保持し、空の場合のみ `pending` にする。
pub fn derive_statuses(status: &str, current_fulfillment: &str) -> DerivedStatuses {
    let row = status
        .parse::<OrderStatus>()
        .ok()
        .and_then(|status| DERIVED.iter().find(|(s, _, _)| *s == status));

    let (payment, fulfillment) = match row {
        Some((_, payment, fulfillment)) => (*payment, *fulfillment),
        None => (PaymentStatus::Processing, None),
    };

    let fulfillment_status = match fulfillment {
        Some(fulfillment) => fulfillment.as_str().to_string(),
        None if current_fulfillment.is_empty() => FulfillmentStatus::Pending.as_str().to_string(),
        None => current_fulfillment.to_string(),
    };

    DerivedStatuses {
        payment_status: payment.as_str().to_string(),
        fulfillment_status,
    }
}

/// 空の支払い・出荷ステータスのみを導出値で埋める
pub fn fill_derived_statuses(status: &str, payment_status: &mut String, fulfillment_status: &mut String) {
    if !payment_status.is_empty() && !fulfillment_status.is_empty() {
        return;
    }

    let derived = derive_statuses(status, fulfillment_status);
    if payment_status.is_empty() {
        *payment_status = derived.payment_status;
    }
    if fulfillment_status.is_empty() {
        *fulfillment_status = derived.fulfillment_status;
    }
}

/// 注文ステータスの表示ラベル（未知の値はそのまま）
pub fn order_status_label(value: &str) -> &str {
    value.parse::<OrderStatus>().map_or(value, |status| status.label())
}

/// 支払いステータスの表示ラベル（未知の値はそのまま）
pub fn payment_status_label(value: &str) -> &str {
    PaymentStatus::iter()
        .find(|status| status.as_str() == value)
        .map_or(value, |status| status.label())
}

/// 出荷ステータスの表示ラベル（未知の値はそのまま）
pub fn fulfillment_status_label(value: &str) -> &str {
    FulfillmentStatus::iter()
        .find(|status| status.as_str() == value)
        .map_or(value, |status| status.label())
}
