use crate::domain::error::DomainError;
use crate::domain::model::{Price, ProductName, Sku};

/// 商品集約
/// カタログ上の1商品と、その在庫数を管理する
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    sku: Sku,
    name: ProductName,
    price: Price,
    quantity: u32,
}

impl Product {
    /// 新しい商品を作成
    ///
    /// # Arguments
    /// * `sku` - SKU
    /// * `name` - 商品名
    /// * `price` - 単価
    /// * `quantity` - 在庫数
    pub fn new(sku: Sku, name: ProductName, price: Price, quantity: u32) -> Self {
        Self {
            sku,
            name,
            price,
            quantity,
        }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &ProductName {
        &self.name
    }

    /// 単価を取得
    pub fn price(&self) -> Price {
        self.price
    }

    /// 在庫数を取得
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 指定された数量の在庫が利用可能かチェック
    pub fn has_available_stock(&self, quantity: u32) -> bool {
        self.quantity >= quantity
    }

    /// 商品を販売し、在庫数を減らす
    ///
    /// # Returns
    /// * `Ok(())` - 販売成功
    /// * `Err(DomainError::InvalidQuantity)` - 数量が0
    /// * `Err(DomainError::InsufficientStock)` - 在庫不足
    pub fn sell(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if !self.has_available_stock(quantity) {
            return Err(DomainError::InsufficientStock {
                requested: u64::from(quantity),
                available: self.quantity,
            });
        }
        self.quantity -= quantity;
        Ok(())
    }

    /// 在庫数を増減する（入荷は正、払い出しは負）
    /// 結果が負になる場合、または上限を超える場合は在庫数を変更しない
    pub fn adjust_quantity(&mut self, delta: i64) -> Result<(), DomainError> {
        let adjusted = i64::from(self.quantity)
            .checked_add(delta)
            .ok_or_else(|| DomainError::InvalidValue("quantity overflow".to_string()))?;
        if adjusted < 0 {
            return Err(DomainError::InsufficientStock {
                requested: delta.unsigned_abs(),
                available: self.quantity,
            });
        }
        self.quantity = u32::try_from(adjusted).map_err(|_| {
            DomainError::InvalidValue(format!("quantity overflow: {}", adjusted))
        })?;
        Ok(())
    }
}
