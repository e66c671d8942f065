use crate::domain::event::DomainEvent;
use async_trait::async_trait;

/// イベントハンドラーエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Transient error (retryable): {0}")]
    TransientError(String),
}

/// イベントハンドラートレイト
/// イベントバスに登録され、ドメインイベントを受け取る購読者
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError>;

    /// このハンドラーが処理対象とするイベントか
    fn can_handle(&self, _event: &DomainEvent) -> bool {
        true
    }

    fn handler_name(&self) -> &str;
}
