// ドメインモデル（エンティティと値オブジェクト）

mod value_objects;
mod product;
mod purchase;

pub use value_objects::{Price, ProductName, Sku, TransactionId};

pub use product::Product;
pub use purchase::Purchase;
