use crate::application::ApplicationError;
use crate::domain::model::{Product, Sku};
use crate::domain::port::ProductRepository;
use std::sync::Arc;

/// カタログクエリサービス
/// 読み取り専用の商品操作を提供する
pub struct CatalogQueryService {
    product_repository: Arc<dyn ProductRepository>,
}

impl CatalogQueryService {
    /// 新しいカタログクエリサービスを作成
    ///
    /// # Arguments
    /// * `product_repository` - 商品リポジトリ
    pub fn new(product_repository: Arc<dyn ProductRepository>) -> Self {
        Self { product_repository }
    }

    /// SKUで商品を取得
    ///
    /// # Returns
    /// * `Ok(Product)` - 商品が見つかった
    /// * `Err(ApplicationError::NotFound)` - 商品が見つからなかった
    pub async fn get_product(&self, sku: &str) -> Result<Product, ApplicationError> {
        let sku_value = Sku::new(sku).map_err(|e| ApplicationError::from_domain(sku, e))?;
        self.product_repository
            .find_by_sku(&sku_value)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(sku_value.to_string()))
    }

    /// すべての商品を登録順に取得
    /// 呼び出すたびに最新の状態を読み直す
    pub async fn list_products(&self) -> Result<Vec<Product>, ApplicationError> {
        self.product_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Price, ProductName};
    use crate::domain::port::RepositoryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // テスト用のモックリポジトリ
    struct MockProductRepository {
        products: Mutex<Vec<Product>>,
    }

    impl MockProductRepository {
        fn with(products: Vec<Product>) -> Self {
            Self {
                products: Mutex::new(products),
            }
        }
    }

    #[async_trait]
    impl ProductRepository for MockProductRepository {
        async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
            self.products.lock().unwrap().push(product.clone());
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
            _delta: i64,
        ) -> Result<Product, RepositoryError> {
            Err(RepositoryError::NotFound(sku.to_string()))
        }
    }

    fn product(sku: &str, name: &str, quantity: u32) -> Product {
        Product::new(
            Sku::new(sku).unwrap(),
            ProductName::new(name).unwrap(),
            Price::parse("9.99").unwrap(),
            quantity,
        )
    }

    #[tokio::test]
    async fn test_get_product() {
        let repository = Arc::new(MockProductRepository::with(vec![product("A1", "Widget", 10)]));
        let service = CatalogQueryService::new(repository);

        let found = service.get_product("A1").await.unwrap();
        assert_eq!(found.name().as_str(), "Widget");
        assert_eq!(found.quantity(), 10);
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let repository = Arc::new(MockProductRepository::with(vec![]));
        let service = CatalogQueryService::new(repository);

        let result = service.get_product("Z9").await;
        assert_eq!(result.unwrap_err(), ApplicationError::NotFound("Z9".to_string()));
    }

    #[tokio::test]
    async fn test_list_products_empty() {
        let repository = Arc::new(MockProductRepository::with(vec![]));
        let service = CatalogQueryService::new(repository);

        assert!(service.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_products_reflects_later_changes() {
        let repository = Arc::new(MockProductRepository::with(vec![product("A1", "Widget", 1)]));
        let service = CatalogQueryService::new(repository.clone());
        assert_eq!(service.list_products().await.unwrap().len(), 1);

        repository.insert(&product("B2", "Gadget", 2)).await.unwrap();

        let skus: Vec<String> = service
            .list_products()
            .await
            .unwrap()
            .iter()
            .map(|p| p.sku().to_string())
            .collect();
        assert_eq!(skus, vec!["A1", "B2"]);
    }
}
