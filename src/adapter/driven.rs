// 駆動される側アダプター（リポジトリ実装など）

mod event_bus;
mod git_snapshot;
mod product_repository;
mod purchase_repository;

pub use event_bus::{EventBusConfig, FailedEventProcessing, InMemoryEventBus};
pub use git_snapshot::{GitSnapshotRecorder, SnapshotError};
pub use product_repository::SqliteProductRepository;
pub use purchase_repository::SqlitePurchaseRepository;
