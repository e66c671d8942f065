// ドメインサービス
// 購入記録の生成（トランザクションIDの採番と合計金額の確定）を担当

use crate::domain::error::DomainError;
use crate::domain::model::{Price, Purchase, Sku, TransactionId};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::sync::Mutex;

/// トランザクションIDの採番器
/// 同じ秒・同じマイクロ秒に複数の購入があっても、狭義単調増加の時刻を払い出す
#[derive(Debug, Default)]
pub struct TransactionIdGenerator {
    last_issued: Mutex<Option<DateTime<Utc>>>,
}

impl TransactionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 永続化済みの最新の購入日時から採番を再開する
    pub fn seeded(last_issued: Option<DateTime<Utc>>) -> Self {
        Self {
            last_issued: Mutex::new(last_issued.map(|t| t.trunc_subsecs(6))),
        }
    }

    /// 現在時刻をもとに次の時刻とトランザクションIDを払い出す
    pub fn next(&self) -> (TransactionId, DateTime<Utc>) {
        self.next_at(Utc::now())
    }

    /// 指定された時刻をもとに次の時刻とトランザクションIDを払い出す
    /// 時計が進んでいない（または巻き戻った）場合は前回 + 1マイクロ秒を使う
    pub fn next_at(&self, now: DateTime<Utc>) -> (TransactionId, DateTime<Utc>) {
        let mut last_issued = self
            .last_issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let candidate = now.trunc_subsecs(6);
        let instant = match *last_issued {
            Some(last) if candidate <= last => last + Duration::microseconds(1),
            _ => candidate,
        };
        *last_issued = Some(instant);

        (TransactionId::from_instant(instant), instant)
    }
}

/// 購入台帳
/// 購入記録を作成する。記録の追記は在庫の減算と同じトランザクションで
/// `PurchaseRepository::commit_purchase` が行う
#[derive(Debug, Default)]
pub struct PurchaseLedger {
    id_generator: TransactionIdGenerator,
}

impl PurchaseLedger {
    pub fn new(id_generator: TransactionIdGenerator) -> Self {
        Self { id_generator }
    }

    /// 購入記録を作成する
    ///
    /// # Arguments
    /// * `sku` - 購入する商品のSKU
    /// * `quantity` - 購入数量
    /// * `unit_price` - 購入時点の単価
    ///
    /// # Returns
    /// * `Ok(Purchase)` - 採番済み・合計金額確定済みの購入記録
    /// * `Err(DomainError)` - 数量が0、または金額がオーバーフロー
    pub fn record_purchase(
        &self,
        sku: Sku,
        quantity: u32,
        unit_price: Price,
    ) -> Result<Purchase, DomainError> {
        let (transaction_id, timestamp) = self.id_generator.next();
        Purchase::record(transaction_id, sku, quantity, unit_price, timestamp)
    }
}
