//! # 注文作成リクエスト
//!
//! 公開 API が受け取る注文作成リクエストの検証と正規化、
//! および冪等性判定に使うリクエストハッシュの計算を行う。
//!
//! 検証は入力の形式のみを見る。ロケールが対応一覧に含まれるか、
//! 参照先のカタログが有効かといった保存データに依存する判定は注文作成ユースケースで行う。

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Channel;
use crate::{DomainError, locale::is_valid_locale_tag};

static IDEMPOTENCY_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{8,128}$").expect("冪等キーの正規表現が不正")
});

/// メールアドレス（addr-spec の dot-atom 形式）
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*$",
    )
    .expect("メールアドレスの正規表現が不正")
});

// ===== 受信形式 =====

/// 注文作成リクエスト（未検証）
///
/// 未知のフィールドは拒否する。欠けているフィールドは空値として扱い、検証で弾く。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub channel:         String,
    pub locale:          String,
    pub idempotency_key: String,
    pub terms_agreed:    bool,
    pub seal:            SealRequest,
    pub material_key:    String,
    pub shipping:        ShippingRequest,
    pub contact:         ContactRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SealRequest {
    pub line1:    String,
    pub line2:    String,
    pub shape:    String,
    pub font_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShippingRequest {
    pub country_code:   String,
    pub recipient_name: String,
    pub phone:          String,
    pub postal_code:    String,
    pub state:          String,
    pub city:           String,
    pub address_line1:  String,
    pub address_line2:  String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactRequest {
    pub email:            String,
    pub preferred_locale: String,
}

// ===== 正規化済み入力 =====

/// 検証・正規化済みの注文作成入力
///
/// フィールドの宣言順がそのままハッシュ計算時のシリアライズ順になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderInput {
    pub channel:         Channel,
    pub locale:          String,
    pub idempotency_key: String,
    pub terms_agreed:    bool,
    pub seal:            SealInput,
    pub material_key:    String,
    pub shipping:        ShippingInput,
    pub contact:         ContactInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SealInput {
    pub line1:    String,
    pub line2:    String,
    pub shape:    SealShape,
    pub font_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingInput {
    pub country_code:   String,
    pub recipient_name: String,
    pub phone:          String,
    pub postal_code:    String,
    pub state:          String,
    pub city:           String,
    pub address_line1:  String,
    pub address_line2:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactInput {
    pub email:            String,
    pub preferred_locale: String,
}

/// 印影の形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SealShape {
    Square,
    Round,
}

impl CreateOrderRequest {
    /// 入力を検証し、正規化済みの入力を返す
    ///
    /// 最初に見つかった不正なフィールドを名指ししたバリデーションエラーを返す。
    pub fn validate(&self) -> Result<CreateOrderInput, DomainError> {
        let channel = match self.channel.trim().to_lowercase().as_str() {
            "app" => Channel::App,
            "web" => Channel::Web,
            _ => return Err(invalid("channel must be one of app or web")),
        };

        let locale = normalize_locale(&self.locale);
        if !is_valid_locale_tag(&locale) {
            return Err(invalid("locale must be a valid BCP-47 lowercase tag"));
        }

        let idempotency_key = self.idempotency_key.trim().to_string();
        if !IDEMPOTENCY_KEY_PATTERN.is_match(&idempotency_key) {
            return Err(invalid(
                "idempotency_key must match ^[A-Za-z0-9_-]{8,128}$",
            ));
        }

        if !self.terms_agreed {
            return Err(invalid("terms_agreed must be true"));
        }

        let seal = self.seal.validate()?;

        let material_key = require_non_empty("material_key", &self.material_key)?;

        let shipping = self.shipping.validate()?;
        let contact = self.contact.validate()?;

        Ok(CreateOrderInput {
            channel,
            locale,
            idempotency_key,
            terms_agreed: self.terms_agreed,
            seal,
            material_key,
            shipping,
            contact,
        })
    }
}

impl SealRequest {
    fn validate(&self) -> Result<SealInput, DomainError> {
        let line1 = self.line1.trim().to_string();
        validate_seal_line("seal.line1", &line1, 1, 2)?;
        let line2 = self.line2.trim().to_string();
        validate_seal_line("seal.line2", &line2, 0, 2)?;

        let shape = match self.shape.trim().to_lowercase().as_str() {
            "square" => SealShape::Square,
            "round" => SealShape::Round,
            _ => return Err(invalid("seal.shape must be one of square or round")),
        };

        Ok(SealInput {
            line1,
            line2,
            shape,
            font_key: require_non_empty("seal.font_key", &self.font_key)?,
        })
    }
}

impl ShippingRequest {
    fn validate(&self) -> Result<ShippingInput, DomainError> {
        let country_code = self.country_code.trim().to_uppercase();
        if country_code.chars().count() != 2
            || !country_code.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(invalid("shipping.country_code must be ISO alpha-2"));
        }

        Ok(ShippingInput {
            country_code,
            recipient_name: require_non_empty("shipping.recipient_name", &self.recipient_name)?,
            phone: require_non_empty("shipping.phone", &self.phone)?,
            postal_code: require_non_empty("shipping.postal_code", &self.postal_code)?,
            state: require_non_empty("shipping.state", &self.state)?,
            city: require_non_empty("shipping.city", &self.city)?,
            address_line1: require_non_empty("shipping.address_line1", &self.address_line1)?,
            address_line2: self.address_line2.trim().to_string(),
        })
    }
}

impl ContactRequest {
    fn validate(&self) -> Result<ContactInput, DomainError> {
        let email = require_non_empty("contact.email", &self.email)?;
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(invalid("contact.email must be valid"));
        }

        let preferred_locale = normalize_locale(&self.preferred_locale);
        if !is_valid_locale_tag(&preferred_locale) {
            return Err(invalid(
                "contact.preferred_locale must be a valid BCP-47 lowercase tag",
            ));
        }

        Ok(ContactInput {
            email,
            preferred_locale,
        })
    }
}

impl CreateOrderInput {
    /// リクエストハッシュ（正規化済み入力の JSON の SHA-256 を 16 進表記したもの）
    ///
    /// 同じ冪等キーで異なる内容が送られたかを判定するために使う。
    pub fn request_hash(&self) -> Result<String, DomainError> {
        let payload = serde_json::to_vec(self).map_err(|e| {
            DomainError::Validation(format!("リクエストのシリアライズに失敗: {e}"))
        })?;
        Ok(hex::encode(Sha256::digest(&payload)))
    }
}

fn normalize_locale(value: &str) -> String {
    value.trim().to_lowercase()
}

fn require_non_empty(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(&format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// 印影の 1 行を検証する（文字数は Unicode スカラー値で数える）
fn validate_seal_line(field: &str, value: &str, min: usize, max: usize) -> Result<(), DomainError> {
    let length = value.chars().count();
    if length < min || length > max {
        return Err(invalid(&format!("{field} must be {min}-{max} characters")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(&format!("{field} must not contain whitespace")));
    }
    Ok(())
}

fn invalid(message: &str) -> DomainError {
    DomainError::Validation(message.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn request() -> CreateOrderRequest {
        serde_json::from_value(json!({
            "channel": " WEB ",
            "locale": "ja",
            "idempotency_key": "demo_key_123",
            "terms_agreed": true,
            "seal": {
                "line1": "田",
                "line2": "中",
                "shape": "Square",
                "font_key": "zen_maru_gothic"
            },
            "material_key": " boxwood ",
            "shipping": {
                "country_code": "jp",
                "recipient_name": "山田 太郎",
                "phone": "090-0000-0000",
                "postal_code": "100-0001",
                "state": "東京都",
                "city": "千代田区",
                "address_line1": "千代田1-1"
            },
            "contact": {
                "email": "taro@example.com",
                "preferred_locale": "JA"
            }
        }))
        .unwrap()
    }

    fn message(result: Result<CreateOrderInput, DomainError>) -> String {
        match result {
            Err(DomainError::Validation(message)) => message,
            other => panic!("バリデーションエラーを期待したが {other:?}"),
        }
    }

    #[rstest]
    fn test_正常なリクエストは正規化される(request: CreateOrderRequest) {
        let input = request.validate().unwrap();

        assert_eq!(input.channel, Channel::Web);
        assert_eq!(input.seal.shape, SealShape::Square);
        assert_eq!(input.material_key, "boxwood");
        assert_eq!(input.shipping.country_code, "JP");
        assert_eq!(input.shipping.address_line2, "");
        assert_eq!(input.contact.preferred_locale, "ja");
    }

    #[test]
    fn test_未知のフィールドは拒否される() {
        let result = serde_json::from_value::<CreateOrderRequest>(json!({
            "channel": "web",
            "coupon": "FREE"
        }));

        assert!(result.is_err());
    }

    #[rstest]
    #[case("", "seal.line1 must be 1-2 characters")]
    #[case("田中太", "seal.line1 must be 1-2 characters")]
    #[case("田 ", "")]
    #[case("山田", "")]
    #[case("\u{3000}田\u{3000}", "")]
    fn test_印影1行目の文字数と空白(
        mut request: CreateOrderRequest,
        #[case] line1: &str,
        #[case] expected: &str,
    ) {
        request.seal.line1 = line1.to_string();

        let result = request.validate();

        if expected.is_empty() {
            assert!(result.is_ok());
        } else {
            assert_eq!(message(result), expected);
        }
    }

    #[rstest]
    fn test_印影2行目は空でもよい(mut request: CreateOrderRequest) {
        request.seal.line2 = String::new();

        assert!(request.validate().is_ok());
    }

    #[rstest]
    #[case("jpn")]
    #[case("j")]
    #[case("1a")]
    fn test_国コードは英字2文字のみ(mut request: CreateOrderRequest, #[case] code: &str) {
        request.shipping.country_code = code.to_string();

        assert_eq!(
            message(request.validate()),
            "shipping.country_code must be ISO alpha-2"
        );
    }

    #[rstest]
    #[case("channel", "channel must be one of app or web")]
    #[case("locale", "locale must be a valid BCP-47 lowercase tag")]
    #[case("idempotency_key", "idempotency_key must match ^[A-Za-z0-9_-]{8,128}$")]
    #[case("terms_agreed", "terms_agreed must be true")]
    #[case("shape", "seal.shape must be one of square or round")]
    #[case("font_key", "seal.font_key is required")]
    #[case("material_key", "material_key is required")]
    #[case("city", "shipping.city is required")]
    #[case("email", "contact.email must be valid")]
    #[case("preferred_locale", "contact.preferred_locale must be a valid BCP-47 lowercase tag")]
    fn test_不正なフィールドを名指しする(
        mut request: CreateOrderRequest,
        #[case] field: &str,
        #[case] expected: &str,
    ) {
        match field {
            "channel" => request.channel = "mail".to_string(),
            "locale" => request.locale = "ja_JP".to_string(),
            "idempotency_key" => request.idempotency_key = "short".to_string(),
            "terms_agreed" => request.terms_agreed = false,
            "shape" => request.seal.shape = "oval".to_string(),
            "font_key" => request.seal.font_key = "  ".to_string(),
            "material_key" => request.material_key = String::new(),
            "city" => request.shipping.city = " ".to_string(),
            "email" => request.contact.email = "taro@@example.com".to_string(),
            "preferred_locale" => request.contact.preferred_locale = "日本語".to_string(),
            _ => unreachable!(),
        }

        assert_eq!(message(request.validate()), expected);
    }

    #[rstest]
    fn test_正規化後に同じ内容ならハッシュも同じ(request: CreateOrderRequest) {
        let mut same = request.clone();
        same.channel = "web".to_string();
        same.material_key = "boxwood".to_string();

        let a = request.validate().unwrap().request_hash().unwrap();
        let b = same.validate().unwrap().request_hash().unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[rstest]
    fn test_内容が異なればハッシュも異なる(request: CreateOrderRequest) {
        let mut other = request.clone();
        other.material_key = "titanium".to_string();

        let a = request.validate().unwrap().request_hash().unwrap();
        let b = other.validate().unwrap().request_hash().unwrap();

        assert_ne!(a, b);
    }
}
