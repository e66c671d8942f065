use crate::domain::event::DomainEvent;
use crate::domain::event_bus::{EventHandler, HandlerError};
use crate::domain::port::{EventBus, EventBusError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{Mutex, RwLock};

/// 失敗したイベント処理の情報
#[derive(Debug, Clone)]
pub struct FailedEventProcessing {
    pub event: DomainEvent,
    pub handler_name: String,
    pub error: HandlerError,
    pub attempt_count: u32,
    pub failed_at: SystemTime,
}

/// イベントバス設定
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// 最大試行回数（1ならリトライしない）
    pub max_retry_attempts: u32,
    /// リトライ間隔
    pub retry_delay: Duration,
    /// デッドレターキューの最大サイズ
    pub dead_letter_queue_max_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 1,
            retry_delay: Duration::from_millis(200),
            dead_letter_queue_max_size: 100,
        }
    }
}

/// インメモリイベントバス実装
/// 登録されたハンドラーに順番にイベントを配信する
/// ハンドラーの失敗は発行元に伝えず、ログとデッドレターキューに残す
pub struct InMemoryEventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
    dead_letter_queue: Mutex<VecDeque<FailedEventProcessing>>,
    config: EventBusConfig,
}

impl InMemoryEventBus {
    /// 設定を指定してインメモリイベントバスを作成
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            dead_letter_queue: Mutex::new(VecDeque::new()),
            config,
        }
    }

    /// ハンドラーを登録
    pub async fn subscribe(&self, handler: Arc<dyn EventHandler>) {
        tracing::debug!(handler = handler.handler_name(), "event handler subscribed");
        self.handlers.write().await.push(handler);
    }

    /// デッドレターキューの内容を取得
    pub async fn dead_letters(&self) -> Vec<FailedEventProcessing> {
        self.dead_letter_queue.lock().await.iter().cloned().collect()
    }

    /// ハンドラーの実行（TransientErrorのみリトライ）
    async fn execute_handler_with_retry(
        &self,
        handler: &dyn EventHandler,
        event: &DomainEvent,
    ) -> Result<(), (HandlerError, u32)> {
        let max_attempts = self.config.max_retry_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match handler.handle_event(event).await {
                Ok(()) => return Ok(()),
                Err(HandlerError::TransientError(msg)) if attempts < max_attempts => {
                    tracing::debug!(
                        handler = handler.handler_name(),
                        attempt = attempts,
                        error = %msg,
                        "retrying event handler"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => return Err((err, attempts)),
            }
        }
    }

    /// 失敗したイベントをデッドレターキューに追加
    async fn add_to_dead_letter_queue(&self, failed: FailedEventProcessing) {
        let mut dlq = self.dead_letter_queue.lock().await;

        if dlq.len() >= self.config.dead_letter_queue_max_size {
            dlq.pop_front(); // 古いエントリを削除
        }
        dlq.push_back(failed);
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        // 配信前にシリアライズできることを検証
        serde_json::to_string(&event).map_err(|e| {
            EventBusError::PublishingFailed(format!("Serialization error: {}", e))
        })?;

        let handlers: Vec<Arc<dyn EventHandler>> = self
            .handlers
            .read()
            .await
            .iter()
            .filter(|handler| handler.can_handle(&event))
            .cloned()
            .collect();

        tracing::debug!(
            event_type = event.event_type(),
            event_id = %event.metadata().event_id,
            handlers = handlers.len(),
            "publishing event"
        );

        for handler in handlers {
            if let Err((error, attempt_count)) =
                self.execute_handler_with_retry(handler.as_ref(), &event).await
            {
                tracing::warn!(
                    handler = handler.handler_name(),
                    event_type = event.event_type(),
                    error = %error,
                    "event handler failed"
                );
                self.add_to_dead_letter_queue(FailedEventProcessing {
                    event: event.clone(),
                    handler_name: handler.handler_name().to_string(),
                    error,
                    attempt_count,
                    failed_at: SystemTime::now(),
                })
                .await;
            }
        }

        Ok(())
    }
}
