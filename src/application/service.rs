mod catalog_query_service;
mod ledger_query_service;

pub use catalog_query_service::CatalogQueryService;
pub use ledger_query_service::LedgerQueryService;

use crate::application::ApplicationError;
use crate::domain::event::{DomainEvent, ProductAdded, PurchaseCompleted, QuantityAdjusted};
use crate::domain::model::{Price, Product, ProductName, Sku, TransactionId};
use crate::domain::port::{EventBus, ProductRepository, PurchaseRepository, RepositoryError};
use crate::domain::service::{PurchaseLedger, TransactionIdGenerator};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

/// 購入完了時に呼び出し側へ返す内容
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub transaction_id: TransactionId,
    pub sku: Sku,
    pub product_name: ProductName,
    /// 販売数量
    pub quantity: u32,
    /// 合計金額（単価 × 数量）
    pub total_price: Price,
    /// 販売後の在庫数
    pub remaining_quantity: u32,
    pub timestamp: DateTime<Utc>,
}

/// 在庫アプリケーションサービス
/// カタログと台帳を変更する操作を提供し、成功した変更をイベントとして発行する
pub struct InventoryApplicationService {
    product_repository: Arc<dyn ProductRepository>,
    purchase_repository: Arc<dyn PurchaseRepository>,
    ledger: PurchaseLedger,
    event_bus: Arc<dyn EventBus>,
}

impl InventoryApplicationService {
    /// 新しい在庫アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `product_repository` - 商品リポジトリ
    /// * `purchase_repository` - 購入リポジトリ
    /// * `ledger` - 購入台帳（トランザクションIDの採番を含む）
    /// * `event_bus` - イベントバス
    pub fn new(
        product_repository: Arc<dyn ProductRepository>,
        purchase_repository: Arc<dyn PurchaseRepository>,
        ledger: PurchaseLedger,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            product_repository,
            purchase_repository,
            ledger,
            event_bus,
        }
    }

    /// 永続化済みの台帳から採番を再開してサービスを作成
    pub async fn bootstrap(
        product_repository: Arc<dyn ProductRepository>,
        purchase_repository: Arc<dyn PurchaseRepository>,
        event_bus: Arc<dyn EventBus>,
    ) -> Result<Self, ApplicationError> {
        let last_purchase_at = purchase_repository.latest_timestamp().await?;
        let ledger = PurchaseLedger::new(TransactionIdGenerator::seeded(last_purchase_at));
        Ok(Self::new(
            product_repository,
            purchase_repository,
            ledger,
            event_bus,
        ))
    }

    /// 商品をカタログに追加
    ///
    /// # Arguments
    /// * `sku` - SKU（空不可）
    /// * `name` - 商品名（空不可）
    /// * `price` - 単価（0以上）
    /// * `quantity` - 初期在庫数
    ///
    /// # Returns
    /// * `Ok(Product)` - 追加された商品
    /// * `Err(ApplicationError::DuplicateKey)` - SKUが既に存在する（カタログは変更されない）
    /// * `Err(ApplicationError::InvalidInput)` - 入力値が無効
    pub async fn add_product(
        &self,
        sku: &str,
        name: &str,
        price: Decimal,
        quantity: u32,
    ) -> Result<Product, ApplicationError> {
        let sku_value = Sku::new(sku).map_err(|e| ApplicationError::from_domain(sku, e))?;
        let name = ProductName::new(name).map_err(|e| ApplicationError::from_domain(sku, e))?;
        let price = Price::new(price).map_err(|e| ApplicationError::from_domain(sku, e))?;
        let product = Product::new(sku_value, name, price, quantity);

        self.product_repository
            .insert(&product)
            .await
            .map_err(|e| match e {
                RepositoryError::DuplicateKey(_) => {
                    ApplicationError::DuplicateKey(product.sku().to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(sku = %product.sku(), name = %product.name(), "product added");
        self.publish(DomainEvent::ProductAdded(ProductAdded::new(
            product.sku().clone(),
            product.name().clone(),
            product.price(),
            product.quantity(),
        )))
        .await;

        Ok(product)
    }

    /// 在庫数を増減する（入荷は正、払い出しは負）
    ///
    /// # Returns
    /// * `Ok(Product)` - 調整後の商品
    /// * `Err(ApplicationError::NotFound)` - SKUが存在しない
    /// * `Err(ApplicationError::InsufficientStock)` - 在庫数が負になる（変更されない）
    pub async fn adjust_quantity(&self, sku: &str, delta: i64) -> Result<Product, ApplicationError> {
        let sku_value = Sku::new(sku).map_err(|e| ApplicationError::from_domain(sku, e))?;

        let mut product = self
            .product_repository
            .find_by_sku(&sku_value)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(sku_value.to_string()))?;
        product
            .adjust_quantity(delta)
            .map_err(|e| ApplicationError::from_domain(sku_value.as_str(), e))?;

        let updated = self
            .product_repository
            .apply_quantity_delta(&sku_value, delta)
            .await
            .map_err(|e| map_stock_conflict(e, delta.unsigned_abs()))?;

        tracing::info!(sku = %sku_value, delta, quantity = updated.quantity(), "quantity adjusted");
        self.publish(DomainEvent::QuantityAdjusted(QuantityAdjusted::new(
            sku_value,
            delta,
            updated.quantity(),
        )))
        .await;

        Ok(updated)
    }

    /// 商品を購入する
    /// 在庫の減算と購入記録の追記は1つのトランザクションで行われる
    ///
    /// # Returns
    /// * `Ok(PurchaseReceipt)` - 購入成功
    /// * `Err(ApplicationError::NotFound)` - SKUが存在しない
    /// * `Err(ApplicationError::InsufficientStock)` - 在庫不足（カタログも台帳も変更されない）
    /// * `Err(ApplicationError::InvalidInput)` - 数量が0
    pub async fn make_purchase(
        &self,
        sku: &str,
        quantity: u32,
    ) -> Result<PurchaseReceipt, ApplicationError> {
        let sku_value = Sku::new(sku).map_err(|e| ApplicationError::from_domain(sku, e))?;

        let mut product = self
            .product_repository
            .find_by_sku(&sku_value)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(sku_value.to_string()))?;
        product
            .sell(quantity)
            .map_err(|e| ApplicationError::from_domain(sku_value.as_str(), e))?;

        let purchase = self
            .ledger
            .record_purchase(sku_value.clone(), quantity, product.price())
            .map_err(|e| ApplicationError::from_domain(sku_value.as_str(), e))?;

        self.purchase_repository
            .commit_purchase(&purchase)
            .await
            .map_err(|e| match e {
                RepositoryError::DuplicateKey(key) => ApplicationError::StorageFailure(format!(
                    "transaction id already recorded: {}",
                    key
                )),
                other => map_stock_conflict(other, u64::from(quantity)),
            })?;

        tracing::info!(
            sku = %sku_value,
            transaction_id = %purchase.transaction_id(),
            quantity,
            total_price = %purchase.total_price(),
            "purchase committed"
        );

        let receipt = PurchaseReceipt {
            transaction_id: purchase.transaction_id().clone(),
            sku: sku_value,
            product_name: product.name().clone(),
            quantity,
            total_price: purchase.total_price(),
            remaining_quantity: product.quantity(),
            timestamp: purchase.timestamp(),
        };

        self.publish(DomainEvent::PurchaseCompleted(PurchaseCompleted::new(
            receipt.transaction_id.clone(),
            receipt.sku.clone(),
            receipt.product_name.clone(),
            receipt.quantity,
            receipt.total_price,
        )))
        .await;

        Ok(receipt)
    }

    /// 変更をイベントとして発行する
    /// 発行の失敗は変更を取り消さず、ログにだけ残す
    async fn publish(&self, event: DomainEvent) {
        let event_type = event.event_type();
        if let Err(e) = self.event_bus.publish(event).await {
            tracing::warn!(event_type, error = %e, "failed to publish event");
        }
    }
}

/// 書き込み時の在庫競合を在庫不足エラーに変換する
fn map_stock_conflict(err: RepositoryError, requested: u64) -> ApplicationError {
    match err {
        RepositoryError::StockConflict { sku, available } => ApplicationError::InsufficientStock {
            sku,
            requested,
            available,
        },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Purchase;
    use crate::domain::port::EventBusError;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // テスト用のモックリポジトリ
    // 購入リポジトリと同じ在庫テーブルを共有する
    #[derive(Default)]
    struct MockStore {
        products: Mutex<Vec<Product>>,
        purchases: Mutex<Vec<Purchase>>,
        fail_commit: bool,
    }

    #[async_trait]
    impl ProductRepository for MockStore {
        async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
            let mut products = self.products.lock().unwrap();
            if products.iter().any(|p| p.sku() == product.sku()) {
                return Err(RepositoryError::DuplicateKey(product.sku().to_string()));
            }
            products.push(product.clone());
            Ok(())
        }

        async fn find_by_sku(&self, sku: &Sku) -> Result<Option<Product>, RepositoryError> {
            let products = self.products.lock().unwrap();
            Ok(products.iter().find(|p| p.sku() == sku).cloned())
        }

        async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
            Ok(self.products.lock().unwrap().clone())
        }

        async fn apply_quantity_delta(
            &self,
            sku: &Sku,
            delta: i64,
        ) -> Result<Product, RepositoryError> {
            let mut products = self.products.lock().unwrap();
            let product = products
                .iter_mut()
                .find(|p| p.sku() == sku)
                .ok_or_else(|| RepositoryError::NotFound(sku.to_string()))?;
            let available = product.quantity();
            product
                .adjust_quantity(delta)
                .map_err(|_| RepositoryError::StockConflict {
                    sku: sku.to_string(),
                    available,
                })?;
            Ok(product.clone())
        }
    }

    #[async_trait]
    impl PurchaseRepository for MockStore {
        async fn commit_purchase(&self, purchase: &Purchase) -> Result<(), RepositoryError> {
            if self.fail_commit {
                return Err(RepositoryError::OperationFailed("disk full".to_string()));
            }
            let mut products = self.products.lock().unwrap();
            let product = products
                .iter_mut()
                .find(|p| p.sku() == purchase.sku())
                .ok_or_else(|| RepositoryError::NotFound(purchase.sku().to_string()))?;
            let available = product.quantity();
            product
                .sell(purchase.quantity())
                .map_err(|_| RepositoryError::StockConflict {
                    sku: purchase.sku().to_string(),
                    available,
                })?;
            self.purchases.lock().unwrap().push(purchase.clone());
            Ok(())
        }

        async fn find_all(&self) -> Result<Vec<Purchase>, RepositoryError> {
            Ok(self.purchases.lock().unwrap().clone())
        }

        async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>, RepositoryError> {
            Ok(self.purchases.lock().unwrap().last().map(|p| p.timestamp()))
        }
    }

    // 発行されたイベントを記録するイベントバス
    #[derive(Default)]
    struct RecordingEventBus {
        events: Mutex<Vec<DomainEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl EventBus for RecordingEventBus {
        async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
            if self.fail {
                return Err(EventBusError::PublishingFailed("bus down".to_string()));
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn service_with(
        store: Arc<MockStore>,
        bus: Arc<RecordingEventBus>,
    ) -> InventoryApplicationService {
        InventoryApplicationService::new(store.clone(), store, PurchaseLedger::default(), bus)
    }

    fn price(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn snapshot_messages(bus: &RecordingEventBus) -> Vec<String> {
        bus.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.snapshot_message())
            .collect()
    }

    #[tokio::test]
    async fn test_add_product_publishes_event() {
        let store = Arc::new(MockStore::default());
        let bus = Arc::new(RecordingEventBus::default());
        let service = service_with(store.clone(), bus.clone());

        let product = service
            .add_product("A1", "Widget", price("9.99"), 10)
            .await
            .unwrap();

        assert_eq!(product.quantity(), 10);
        assert_eq!(snapshot_messages(&bus), vec!["Added new product: Widget"]);
    }

    #[tokio::test]
    async fn test_add_duplicate_product() {
        let store = Arc::new(MockStore::default());
        let bus = Arc::new(RecordingEventBus::default());
        let service = service_with(store.clone(), bus.clone());
        service
            .add_product("A1", "Widget", price("9.99"), 10)
            .await
            .unwrap();

        let result = service.add_product("A1", "Other", price("1"), 1).await;

        assert_eq!(result.unwrap_err(), ApplicationError::DuplicateKey("A1".to_string()));
        assert_eq!(store.products.lock().unwrap().len(), 1);
        assert_eq!(bus.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_product_validation() {
        let service = service_with(
            Arc::new(MockStore::default()),
            Arc::new(RecordingEventBus::default()),
        );

        let cases = [
            ("", "Widget", price("1")),
            ("A1", " ", price("1")),
            ("A1", "Widget", price("-0.01")),
        ];
        for (sku, name, unit_price) in cases {
            let result = service.add_product(sku, name, unit_price, 1).await;
            assert!(matches!(result, Err(ApplicationError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_adjust_quantity() {
        let store = Arc::new(MockStore::default());
        let bus = Arc::new(RecordingEventBus::default());
        let service = service_with(store, bus.clone());
        service
            .add_product("A1", "Widget", price("9.99"), 10)
            .await
            .unwrap();

        let restocked = service.adjust_quantity("A1", 5).await.unwrap();
        assert_eq!(restocked.quantity(), 15);

        let consumed = service.adjust_quantity("A1", -3).await.unwrap();
        assert_eq!(consumed.quantity(), 12);

        assert_eq!(
            snapshot_messages(&bus)[1..].to_vec(),
            vec![
                "Updated quantity for product SKU: A1".to_string(),
                "Updated quantity for product SKU: A1".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_adjust_quantity_errors() {
        let store = Arc::new(MockStore::default());
        let service = service_with(store.clone(), Arc::new(RecordingEventBus::default()));
        service
            .add_product("A1", "Widget", price("9.99"), 2)
            .await
            .unwrap();

        assert_eq!(
            service.adjust_quantity("Z9", 1).await.unwrap_err(),
            ApplicationError::NotFound("Z9".to_string())
        );
        assert_eq!(
            service.adjust_quantity("A1", -3).await.unwrap_err(),
            ApplicationError::InsufficientStock {
                sku: "A1".to_string(),
                requested: 3,
                available: 2
            }
        );
        assert_eq!(store.products.lock().unwrap()[0].quantity(), 2);
    }

    #[tokio::test]
    async fn test_make_purchase() {
        let store = Arc::new(MockStore::default());
        let bus = Arc::new(RecordingEventBus::default());
        let service = service_with(store.clone(), bus.clone());
        service
            .add_product("A1", "Widget", price("9.99"), 10)
            .await
            .unwrap();

        let receipt = service.make_purchase("A1", 3).await.unwrap();

        assert_eq!(receipt.quantity, 3);
        assert_eq!(receipt.total_price, Price::parse("29.97").unwrap());
        assert_eq!(receipt.remaining_quantity, 7);
        assert_eq!(store.products.lock().unwrap()[0].quantity(), 7);
        let purchases = store.purchases.lock().unwrap();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].transaction_id(), &receipt.transaction_id);
        assert_eq!(snapshot_messages(&bus)[1], "Purchase: 3x Widget sold");
    }

    #[tokio::test]
    async fn test_make_purchase_insufficient_stock() {
        let store = Arc::new(MockStore::default());
        let bus = Arc::new(RecordingEventBus::default());
        let service = service_with(store.clone(), bus.clone());
        service
            .add_product("A1", "Widget", price("9.99"), 7)
            .await
            .unwrap();

        let result = service.make_purchase("A1", 100).await;

        assert_eq!(
            result.unwrap_err(),
            ApplicationError::InsufficientStock {
                sku: "A1".to_string(),
                requested: 100,
                available: 7
            }
        );
        assert_eq!(store.products.lock().unwrap()[0].quantity(), 7);
        assert!(store.purchases.lock().unwrap().is_empty());
        assert_eq!(bus.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_make_purchase_unknown_and_zero() {
        let store = Arc::new(MockStore::default());
        let service = service_with(store, Arc::new(RecordingEventBus::default()));
        service
            .add_product("A1", "Widget", price("9.99"), 7)
            .await
            .unwrap();

        assert_eq!(
            service.make_purchase("Z9", 1).await.unwrap_err(),
            ApplicationError::NotFound("Z9".to_string())
        );
        assert!(matches!(
            service.make_purchase("A1", 0).await,
            Err(ApplicationError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported_without_event() {
        let store = Arc::new(MockStore {
            fail_commit: true,
            ..MockStore::default()
        });
        let bus = Arc::new(RecordingEventBus::default());
        let service = service_with(store.clone(), bus.clone());
        service
            .add_product("A1", "Widget", price("9.99"), 7)
            .await
            .unwrap();

        let result = service.make_purchase("A1", 1).await;

        assert!(matches!(result, Err(ApplicationError::StorageFailure(_))));
        assert_eq!(bus.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_event_bus_failure_does_not_fail_mutation() {
        let store = Arc::new(MockStore::default());
        let bus = Arc::new(RecordingEventBus {
            fail: true,
            ..RecordingEventBus::default()
        });
        let service = service_with(store.clone(), bus);

        service
            .add_product("A1", "Widget", price("9.99"), 7)
            .await
            .unwrap();
        service.make_purchase("A1", 2).await.unwrap();

        assert_eq!(store.products.lock().unwrap()[0].quantity(), 5);
    }

    #[tokio::test]
    async fn test_bootstrap_continues_transaction_ids() {
        let store = Arc::new(MockStore::default());
        let bus = Arc::new(RecordingEventBus::default());
        let first = service_with(store.clone(), bus.clone());
        first
            .add_product("A1", "Widget", price("9.99"), 10)
            .await
            .unwrap();
        let earlier = first.make_purchase("A1", 1).await.unwrap();

        let second = InventoryApplicationService::bootstrap(store.clone(), store.clone(), bus)
            .await
            .unwrap();
        let later = second.make_purchase("A1", 1).await.unwrap();

        assert!(later.transaction_id > earlier.transaction_id);
        let ids: HashMap<_, _> = store
            .purchases
            .lock()
            .unwrap()
            .iter()
            .map(|p| (p.transaction_id().clone(), p.quantity()))
            .collect();
        assert_eq!(ids.len(), 2);
    }
}
