use crate::adapter::database_error::DatabaseError;
use sqlx::{Pool, Sqlite};

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<Sqlite>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        let migrations = [
            include_str!("../../migrations/001_create_products_table.sql"),
            include_str!("../../migrations/002_create_purchases_table.sql"),
        ];

        for (index, migration_sql) in migrations.iter().enumerate() {
            tracing::debug!(migration = index + 1, "running migration");
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DatabaseError::MigrationError(format!("Migration {} failed: {}", index + 1, e))
                })?;
        }

        tracing::info!(count = migrations.len(), "database migrations completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::config::connect_in_memory;

    #[tokio::test]
    async fn test_migration_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        let migration = DatabaseMigration::new(pool.clone());

        migration.run().await.unwrap();
        migration.run().await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('Products', 'Purchases') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(
            tables,
            vec![("Products".to_string(),), ("Purchases".to_string(),)]
        );
    }
}
