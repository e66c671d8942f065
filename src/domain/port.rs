// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::event::DomainEvent;
use crate::domain::model::{Product, Purchase, Sku};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    /// 一意キーの重複
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    /// 対象が存在しない
    #[error("Not found: {0}")]
    NotFound(String),
    /// 書き込み時点で在庫条件を満たさなかった
    #[error("Stock conflict for {sku}: available {available}")]
    StockConflict { sku: String, available: u32 },
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

/// 商品リポジトリトレイト
/// カタログ（商品集約）の永続化を抽象化する
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 商品を新規登録する
    ///
    /// # Returns
    /// * `Ok(())` - 登録成功
    /// * `Err(RepositoryError::DuplicateKey)` - 同じSKUが既に存在する（何も変更されない）
    async fn insert(&self, product: &Product) -> Result<(), RepositoryError>;

    /// SKUで商品を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Product))` - 商品が見つかった
    /// * `Ok(None)` - 商品が見つからなかった
    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<Product>, RepositoryError>;

    /// すべての商品を登録順に取得する
    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;

    /// 在庫数に増減量を加える
    /// 結果が0未満になる場合は変更せずに `StockConflict` を返す
    ///
    /// # Returns
    /// * `Ok(Product)` - 調整後の商品
    /// * `Err(RepositoryError::NotFound)` - 商品が存在しない
    /// * `Err(RepositoryError::StockConflict)` - 在庫が負になる
    async fn apply_quantity_delta(&self, sku: &Sku, delta: i64)
        -> Result<Product, RepositoryError>;
}

/// 購入リポジトリトレイト
/// 台帳（購入記録）の永続化と、購入時の在庫減算を抽象化する
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// 在庫の減算と購入記録の追記を1つのトランザクションで行う
    /// どちらか一方だけが反映されることはない
    ///
    /// # Returns
    /// * `Ok(())` - 両方が反映された
    /// * `Err(RepositoryError::NotFound)` - 商品が存在しない
    /// * `Err(RepositoryError::StockConflict)` - 書き込み時点で在庫が不足していた
    async fn commit_purchase(&self, purchase: &Purchase) -> Result<(), RepositoryError>;

    /// すべての購入記録を記録順に取得する
    async fn find_all(&self) -> Result<Vec<Purchase>, RepositoryError>;

    /// 最新の購入日時を取得する（トランザクションIDの採番再開用）
    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>, RepositoryError>;
}

/// イベントバスエラー
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event publishing failed: {0}")]
    PublishingFailed(String),
}

/// イベントバストレイト
/// イベントの発行と配信を管理するポート
#[async_trait]
pub trait EventBus: Send + Sync {
    /// イベントを発行し、登録されたハンドラーに配信
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError>;
}
