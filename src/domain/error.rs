/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 在庫不足（要求数量が在庫数を超えている）
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u32 },
    /// 無効な数量（例: 0個の購入）
    #[error("Invalid quantity")]
    InvalidQuantity,
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
