use crate::domain::error::DomainError;
use crate::domain::model::{Price, Sku, TransactionId};
use chrono::{DateTime, Utc};

/// 購入記録（台帳のエントリ）
/// 一度作成されたら変更されない
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    transaction_id: TransactionId,
    sku: Sku,
    quantity: u32,
    total_price: Price,
    timestamp: DateTime<Utc>,
}

impl Purchase {
    /// 新しい購入記録を作成
    /// 合計金額は購入時点の単価 × 数量で確定する
    ///
    /// # Arguments
    /// * `transaction_id` - トランザクションID
    /// * `sku` - 購入した商品のSKU
    /// * `quantity` - 購入数量（1以上）
    /// * `unit_price` - 購入時点の単価
    /// * `timestamp` - 購入日時
    pub fn record(
        transaction_id: TransactionId,
        sku: Sku,
        quantity: u32,
        unit_price: Price,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let total_price = unit_price.multiply(quantity)?;
        Ok(Self {
            transaction_id,
            sku,
            quantity,
            total_price,
            timestamp,
        })
    }

    /// 永続化されたデータから購入記録を再構築
    /// 合計金額は再計算しない
    pub fn reconstruct(
        transaction_id: TransactionId,
        sku: Sku,
        quantity: u32,
        total_price: Price,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            transaction_id,
            sku,
            quantity,
            total_price,
            timestamp,
        })
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 合計金額を取得
    pub fn total_price(&self) -> Price {
        self.total_price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
