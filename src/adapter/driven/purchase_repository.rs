use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Price, Purchase, Sku, TransactionId};
use crate::domain::port::{PurchaseRepository, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};

/// SQLite購入リポジトリ
/// Purchasesテーブルへの追記と、Productsテーブルの在庫減算を
/// 1つのトランザクションとして扱う
#[derive(Clone)]
pub struct SqlitePurchaseRepository {
    pool: Pool<Sqlite>,
}

impl SqlitePurchaseRepository {
    /// 新しいSQLite購入リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - SQLiteコネクションプール
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// 購入記録を台帳に追記する
    /// 呼び出し側のトランザクション内で実行される
    async fn append(conn: &mut SqliteConnection, purchase: &Purchase) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO Purchases (transaction_id, sku, quantity, total_price, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(purchase.transaction_id().as_str())
        .bind(purchase.sku().as_str())
        .bind(i64::from(purchase.quantity()))
        .bind(purchase.total_price().to_string())
        .bind(format_timestamp(purchase.timestamp()))
        .execute(conn)
        .await
        .map_err(|e| DatabaseError::from_sqlx(purchase.transaction_id().as_str(), e))?;

        Ok(())
    }
}

/// 日時をISO-8601（RFC 3339、マイクロ秒精度）の文字列にする
pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FetchFailed(format!("購入日時の解析に失敗しました: {}", e)))
}

/// Purchasesテーブルの行から購入記録を再構築する
fn purchase_from_row(row: &SqliteRow) -> Result<Purchase, RepositoryError> {
    let fetch_failed = |e: sqlx::Error| {
        RepositoryError::FetchFailed(format!("購入記録の読み取りに失敗しました: {}", e))
    };

    let transaction_id =
        TransactionId::from_string(&row.try_get::<String, _>("transaction_id").map_err(fetch_failed)?)
            .map_err(|e| RepositoryError::FetchFailed(e.to_string()))?;
    let sku = Sku::new(row.try_get::<String, _>("sku").map_err(fetch_failed)?)
        .map_err(|e| RepositoryError::FetchFailed(e.to_string()))?;
    let quantity = row.try_get::<i64, _>("quantity").map_err(fetch_failed)?;
    let quantity = u32::try_from(quantity).map_err(|_| {
        RepositoryError::FetchFailed(format!("購入数量が範囲外です: {}", quantity))
    })?;
    let total_price = Price::parse(&row.try_get::<String, _>("total_price").map_err(fetch_failed)?)
        .map_err(|e| RepositoryError::FetchFailed(e.to_string()))?;
    let timestamp = parse_timestamp(&row.try_get::<String, _>("timestamp").map_err(fetch_failed)?)?;

    Purchase::reconstruct(transaction_id, sku, quantity, total_price, timestamp)
        .map_err(|e| RepositoryError::FetchFailed(format!("購入記録の再構築に失敗しました: {}", e)))
}

#[async_trait]
impl PurchaseRepository for SqlitePurchaseRepository {
    async fn commit_purchase(&self, purchase: &Purchase) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::from_sqlx("トランザクション開始に失敗しました", e))?;

        // 在庫チェックを書き込みと同時に行い、同時購入による売り越しを防ぐ
        let result = sqlx::query(
            r#"
            UPDATE Products
            SET quantity = quantity - ?
            WHERE sku = ? AND quantity >= ?
            "#,
        )
        .bind(i64::from(purchase.quantity()))
        .bind(purchase.sku().as_str())
        .bind(i64::from(purchase.quantity()))
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("在庫の減算に失敗しました", e))?;

        if result.rows_affected() != 1 {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT quantity FROM Products WHERE sku = ?")
                    .bind(purchase.sku().as_str())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| DatabaseError::from_sqlx("在庫の取得に失敗しました", e))?;
            tx.rollback()
                .await
                .map_err(|e| DatabaseError::from_sqlx("ロールバックに失敗しました", e))?;

            return Err(match available {
                Some(available) => RepositoryError::StockConflict {
                    sku: purchase.sku().to_string(),
                    available: u32::try_from(available).unwrap_or(0),
                },
                None => RepositoryError::NotFound(purchase.sku().to_string()),
            });
        }

        // 追記に失敗した場合はtxがドロップされ、在庫の減算もロールバックされる
        Self::append(&mut *tx, purchase).await?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx("コミットに失敗しました", e))?;

        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Purchase>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT transaction_id, sku, quantity, total_price, timestamp
            FROM Purchases
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("購入履歴の取得に失敗しました", e))?;

        rows.iter().map(purchase_from_row).collect()
    }

    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        // 固定長のUTC表記なので文字列順 = 時刻順
        let latest: Option<String> =
            sqlx::query_scalar("SELECT timestamp FROM Purchases ORDER BY timestamp DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DatabaseError::from_sqlx("最新の購入日時の取得に失敗しました", e))?;

        latest.as_deref().map(parse_timestamp).transpose()
    }
}
