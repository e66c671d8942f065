use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Price, Product, ProductName, Sku};
use crate::domain::port::{ProductRepository, RepositoryError};
use async_trait::async_trait;

use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

/// SQLite商品リポジトリ
/// SQLiteデータベースのProductsテーブルにカタログを永続化する
#[derive(Clone)]
pub struct SqliteProductRepository {
    pool: Pool<Sqlite>,
}

impl SqliteProductRepository {
    /// 新しいSQLite商品リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - SQLiteコネクションプール
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

/// Productsテーブルの行から商品を再構築する
pub(crate) fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let fetch_failed =
        |e: sqlx::Error| RepositoryError::FetchFailed(format!("商品行の読み取りに失敗しました: {}", e));

    let sku = Sku::new(row.try_get::<String, _>("sku").map_err(fetch_failed)?)
        .map_err(|e| RepositoryError::FetchFailed(format!("SKUの解析に失敗しました: {}", e)))?;
    let name = ProductName::new(row.try_get::<String, _>("name").map_err(fetch_failed)?)
        .map_err(|e| RepositoryError::FetchFailed(format!("商品名の解析に失敗しました: {}", e)))?;
    let price = Price::parse(&row.try_get::<String, _>("price").map_err(fetch_failed)?)
        .map_err(|e| RepositoryError::FetchFailed(format!("価格の解析に失敗しました: {}", e)))?;
    let quantity = row.try_get::<i64, _>("quantity").map_err(fetch_failed)?;
    let quantity = u32::try_from(quantity).map_err(|_| {
        RepositoryError::FetchFailed(format!("在庫数が範囲外です: {}", quantity))
    })?;

    Ok(Product::new(sku, name, price, quantity))
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        // 主キー制約違反はDuplicateKeyとして返る
        sqlx::query("INSERT INTO Products (sku, name, price, quantity) VALUES (?, ?, ?, ?)")
            .bind(product.sku().as_str())
            .bind(product.name().as_str())
            .bind(product.price().to_string())
            .bind(i64::from(product.quantity()))
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(product.sku().as_str(), e))?;

        Ok(())
    }

    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query("SELECT sku, name, price, quantity FROM Products WHERE sku = ?")
            .bind(sku.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("商品の取得に失敗しました", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        // 登録順（rowid順）で並べる
        let rows = sqlx::query("SELECT sku, name, price, quantity FROM Products ORDER BY rowid ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("商品一覧の取得に失敗しました", e))?;

        rows.iter().map(product_from_row).collect()
    }

    async fn apply_quantity_delta(
        &self,
        sku: &Sku,
        delta: i64,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::from_sqlx("トランザクション開始に失敗しました", e))?;

        // 条件付きUPDATEで在庫数が0未満・u32の上限超えにならないことを書き込み時に保証する
        let result = sqlx::query(
            r#"
            UPDATE Products
            SET quantity = quantity + ?
            WHERE sku = ? AND quantity + ? >= 0 AND quantity + ? <= ?
            "#,
        )
        .bind(delta)
        .bind(sku.as_str())
        .bind(delta)
        .bind(delta)
        .bind(i64::from(u32::MAX))
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("在庫数の更新に失敗しました", e))?;

        let row = sqlx::query("SELECT sku, name, price, quantity FROM Products WHERE sku = ?")
            .bind(sku.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("商品の取得に失敗しました", e))?;

        let product = match row {
            Some(row) => product_from_row(&row)?,
            None => return Err(RepositoryError::NotFound(sku.to_string())),
        };

        if result.rows_affected() != 1 {
            tx.rollback()
                .await
                .map_err(|e| DatabaseError::from_sqlx("ロールバックに失敗しました", e))?;
            return Err(RepositoryError::StockConflict {
                sku: sku.to_string(),
                available: product.quantity(),
            });
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx("コミットに失敗しました", e))?;

        Ok(product)
    }
}
