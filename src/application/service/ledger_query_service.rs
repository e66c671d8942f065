use crate::application::ApplicationError;
use crate::domain::model::Purchase;
use crate::domain::port::PurchaseRepository;
use std::sync::Arc;

/// 台帳クエリサービス
pub struct LedgerQueryService {
    purchase_repository: Arc<dyn PurchaseRepository>,
}

impl LedgerQueryService {
    pub fn new(purchase_repository: Arc<dyn PurchaseRepository>) -> Self {
        Self {
            purchase_repository,
        }
    }

    /// すべての購入記録を追記順に取得
    pub async fn list_transactions(&self) -> Result<Vec<Purchase>, ApplicationError> {
        self.purchase_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}
