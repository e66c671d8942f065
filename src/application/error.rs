use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;

/// アプリケーション層のエラー型
/// 呼び出し側（コンソールなど）に返す、回復可能なエラーの種類
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplicationError {
    /// 既に存在するSKUで商品を追加しようとした
    #[error("Product with SKU {0} already exists")]
    DuplicateKey(String),
    /// 存在しないSKUを参照した
    #[error("Product with SKU {0} not found")]
    NotFound(String),
    /// 在庫不足
    #[error("Insufficient stock for product SKU {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: u64,
        available: u32,
    },
    /// 入力値がビジネスルールを満たさない
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// 永続化の失敗
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl ApplicationError {
    /// ドメインエラーを、対象のSKUを添えて変換する
    pub fn from_domain(sku: &str, err: DomainError) -> Self {
        match err {
            DomainError::InsufficientStock {
                requested,
                available,
            } => ApplicationError::InsufficientStock {
                sku: sku.to_string(),
                requested,
                available,
            },
            DomainError::InvalidQuantity => {
                ApplicationError::InvalidInput("quantity must be at least 1".to_string())
            }
            DomainError::InvalidValue(msg) => ApplicationError::InvalidInput(msg),
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateKey(key) => ApplicationError::DuplicateKey(key),
            RepositoryError::NotFound(sku) => ApplicationError::NotFound(sku),
            // 要求数量を知らない変換では在庫不足を組み立てない
            RepositoryError::StockConflict { sku, available } => ApplicationError::StorageFailure(
                format!("stock changed for {} (available {})", sku, available),
            ),
            RepositoryError::ConnectionFailed(msg)
            | RepositoryError::OperationFailed(msg)
            | RepositoryError::FetchFailed(msg) => ApplicationError::StorageFailure(msg),
        }
    }
}
