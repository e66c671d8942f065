use crate::adapter::database_error::DatabaseError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::env;
use std::path::PathBuf;

/// アプリケーション設定を管理する構造体
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryConfig {
    /// SQLiteデータベースファイル
    pub database_file: PathBuf,
    /// コネクションプールの最大接続数
    pub max_connections: u32,
    /// 変更ごとにgitへスナップショットを記録するか
    pub snapshot_enabled: bool,
    /// スナップショットを記録するgitリポジトリのディレクトリ
    pub repository_dir: PathBuf,
}

/// 設定エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            database_file: PathBuf::from("inventory.db"),
            max_connections: 1,
            snapshot_enabled: true,
            repository_dir: PathBuf::from("."),
        }
    }
}

impl InventoryConfig {
    /// 環境変数から設定を読み取る
    /// 環境変数が設定されていない場合はデフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_file = env::var("INVENTORY_DATABASE_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_file);

        let max_connections = match env::var("INVENTORY_MAX_CONNECTIONS") {
            Ok(value) => value.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid INVENTORY_MAX_CONNECTIONS: {}", e))
            })?,
            Err(_) => defaults.max_connections,
        };
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "INVENTORY_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        let snapshot_enabled = match env::var("INVENTORY_SNAPSHOT_ENABLED") {
            Ok(value) => parse_flag(&value).ok_or_else(|| {
                ConfigError::InvalidValue(format!("Invalid INVENTORY_SNAPSHOT_ENABLED: {}", value))
            })?,
            Err(_) => defaults.snapshot_enabled,
        };

        let repository_dir = env::var("INVENTORY_REPOSITORY_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.repository_dir);

        Ok(Self {
            database_file,
            max_connections,
            snapshot_enabled,
            repository_dir,
        })
    }

    /// SQLite接続オプションを生成
    /// スナップショット対象が単一ファイルで完結するようにロールバックジャーナルを使う
    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.database_file)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Delete)
    }

    /// コネクションプールを作成
    pub async fn connect(&self) -> Result<SqlitePool, DatabaseError> {
        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(self.connect_options())
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!(
                    "failed to open {}: {}",
                    self.database_file.display(),
                    e
                ))
            })
    }
}

/// インメモリのSQLiteに接続する（テスト用）
/// 接続ごとに別のデータベースになるため、接続は1本に固定して使い回す
#[cfg(test)]
pub(crate) async fn connect_in_memory() -> Result<SqlitePool, DatabaseError> {
    let options = <SqliteConnectOptions as std::str::FromStr>::from_str("sqlite::memory:")
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
