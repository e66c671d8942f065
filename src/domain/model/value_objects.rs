use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// 商品の一意識別子（SKU）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    /// SKUを作成
    /// 前後の空白を取り除いた結果が空の場合はエラー
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(DomainError::InvalidValue("SKU must not be empty".to_string()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 商品名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductName(String);

impl ProductName {
    /// 商品名を作成
    /// 前後の空白を取り除いた結果が空の場合はエラー
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(DomainError::InvalidValue(
                "product name must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 価格を表す値オブジェクト
/// 10進数で保持するため、単価 × 数量の計算で誤差が出ない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// 価格を作成
    /// 負の価格はエラー
    pub fn new(amount: Decimal) -> Result<Self, DomainError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::InvalidValue(format!(
                "price must not be negative: {}",
                amount
            )));
        }
        Ok(Self(amount))
    }

    /// 文字列から価格を作成（永続化層・コンソール入力用）
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::InvalidValue(format!("invalid price '{}': {}", s, e)))?;
        Self::new(amount)
    }

    /// 金額を取得
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// 数量を掛けた金額を計算
    /// オーバーフローした場合はエラー
    pub fn multiply(&self, quantity: u32) -> Result<Price, DomainError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Price)
            .ok_or_else(|| DomainError::InvalidValue("price overflow".to_string()))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 購入トランザクションの一意識別子
/// `txn` + UTCのマイクロ秒精度タイムスタンプで構成される
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    const PREFIX: &'static str = "txn";
    const TIMESTAMP_FORMAT: &'static str = "%Y%m%d%H%M%S%6f";

    /// 時刻からトランザクションIDを作成
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self(format!(
            "{}{}",
            Self::PREFIX,
            instant.format(Self::TIMESTAMP_FORMAT)
        ))
    }

    /// 文字列からトランザクションIDを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        let digits = s.strip_prefix(Self::PREFIX).ok_or_else(|| {
            DomainError::InvalidValue(format!("invalid transaction id: {}", s))
        })?;
        // YYYYMMDDhhmmss + 6桁のマイクロ秒
        if digits.len() != 20 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidValue(format!(
                "invalid transaction id: {}",
                s
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
