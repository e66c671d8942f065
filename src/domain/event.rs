use crate::domain::model::{Price, ProductName, Sku, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// イベントメタデータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// イベントID
    pub event_id: Uuid,
    /// イベント発生日時
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// ドメインイベント列挙型
/// 永続化された状態を変更した操作を表現する
/// 購読者（履歴スナップショットなど）に配信される
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    /// 商品がカタログに追加された
    ProductAdded(ProductAdded),
    /// 在庫数が調整された
    QuantityAdjusted(QuantityAdjusted),
    /// 購入が完了した
    PurchaseCompleted(PurchaseCompleted),
}

impl DomainEvent {
    /// イベントタイプ名を取得
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ProductAdded(_) => "ProductAdded",
            DomainEvent::QuantityAdjusted(_) => "QuantityAdjusted",
            DomainEvent::PurchaseCompleted(_) => "PurchaseCompleted",
        }
    }

    pub fn metadata(&self) -> &EventMetadata {
        match self {
            DomainEvent::ProductAdded(e) => &e.metadata,
            DomainEvent::QuantityAdjusted(e) => &e.metadata,
            DomainEvent::PurchaseCompleted(e) => &e.metadata,
        }
    }

    /// 履歴スナップショットのコミットメッセージ
    pub fn snapshot_message(&self) -> String {
        match self {
            DomainEvent::ProductAdded(e) => format!("Added new product: {}", e.name),
            DomainEvent::QuantityAdjusted(e) => {
                format!("Updated quantity for product SKU: {}", e.sku)
            }
            DomainEvent::PurchaseCompleted(e) => {
                format!("Purchase: {}x {} sold", e.quantity, e.product_name)
            }
        }
    }
}

/// 商品追加イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAdded {
    pub metadata: EventMetadata,
    pub sku: Sku,
    pub name: ProductName,
    pub price: Price,
    pub quantity: u32,
}

impl ProductAdded {
    pub fn new(sku: Sku, name: ProductName, price: Price, quantity: u32) -> Self {
        Self {
            metadata: EventMetadata::new(),
            sku,
            name,
            price,
            quantity,
        }
    }
}

/// 在庫数調整イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityAdjusted {
    pub metadata: EventMetadata,
    pub sku: Sku,
    /// 増減量
    pub delta: i64,
    /// 調整後の在庫数
    pub new_quantity: u32,
}

impl QuantityAdjusted {
    pub fn new(sku: Sku, delta: i64, new_quantity: u32) -> Self {
        Self {
            metadata: EventMetadata::new(),
            sku,
            delta,
            new_quantity,
        }
    }
}

/// 購入完了イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCompleted {
    pub metadata: EventMetadata,
    pub transaction_id: TransactionId,
    pub sku: Sku,
    pub product_name: ProductName,
    pub quantity: u32,
    pub total_price: Price,
}

impl PurchaseCompleted {
    pub fn new(
        transaction_id: TransactionId,
        sku: Sku,
        product_name: ProductName,
        quantity: u32,
        total_price: Price,
    ) -> Self {
        Self {
            metadata: EventMetadata::new(),
            transaction_id,
            sku,
            product_name,
            quantity,
            total_price,
        }
    }
}
