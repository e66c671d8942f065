use inventory_tracker::adapter::driven::{
    GitSnapshotRecorder, InMemoryEventBus, SqliteProductRepository, SqlitePurchaseRepository,
};
use inventory_tracker::adapter::driver::ConsoleShell;
use inventory_tracker::adapter::{DatabaseMigration, InventoryConfig};
use inventory_tracker::application::service::{
    CatalogQueryService, InventoryApplicationService, LedgerQueryService,
};

use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // 対話画面を汚さないよう、既定ではwarn以上のみ出力する
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = InventoryConfig::from_env()?;
    tracing::info!(
        database_file = %config.database_file.display(),
        snapshot_enabled = config.snapshot_enabled,
        "configuration loaded"
    );

    let pool = config.connect().await?;
    DatabaseMigration::new(pool.clone()).run().await?;

    let product_repository = Arc::new(SqliteProductRepository::new(pool.clone()));
    let purchase_repository = Arc::new(SqlitePurchaseRepository::new(pool.clone()));

    let event_bus = Arc::new(InMemoryEventBus::default());
    if config.snapshot_enabled {
        let database_file = std::fs::canonicalize(&config.database_file)
            .unwrap_or_else(|_| config.database_file.clone());
        let recorder = GitSnapshotRecorder::new(config.repository_dir.clone(), database_file);
        match recorder.ensure_repository().await {
            Ok(true) => println!("Initialized Git repository."),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "could not initialize git repository"),
        }
        event_bus.subscribe(Arc::new(recorder)).await;
    }

    let inventory_service = InventoryApplicationService::bootstrap(
        product_repository.clone(),
        purchase_repository.clone(),
        event_bus,
    )
    .await?;

    let mut shell = ConsoleShell::new(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        Arc::new(inventory_service),
        Arc::new(CatalogQueryService::new(product_repository)),
        Arc::new(LedgerQueryService::new(purchase_repository)),
    );
    shell.run().await?;

    pool.close().await;
    Ok(())
}
