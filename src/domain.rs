// ドメイン層
// カタログ（商品）と台帳（購入記録）のビジネスルールを保持する

pub mod error;
pub mod event;
pub mod event_bus;
pub mod model;
pub mod port;
pub mod service;
