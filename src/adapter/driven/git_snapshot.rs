use crate::domain::event::DomainEvent;
use crate::domain::event_bus::{EventHandler, HandlerError};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// スナップショットエラー
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("git {command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// gitによる履歴スナップショット
/// 変更のたびにデータベースファイルをgitにコミットする
pub struct GitSnapshotRecorder {
    repository_dir: PathBuf,
    database_file: PathBuf,
    git_binary: String,
}

impl GitSnapshotRecorder {
    /// # Arguments
    /// * `repository_dir` - gitリポジトリのディレクトリ
    /// * `database_file` - コミット対象のデータベースファイル
    pub fn new(repository_dir: impl Into<PathBuf>, database_file: impl Into<PathBuf>) -> Self {
        Self {
            repository_dir: repository_dir.into(),
            database_file: database_file.into(),
            git_binary: "git".to_string(),
        }
    }

    /// 使用するgitの実行ファイルを差し替える
    pub fn with_git_binary(mut self, git_binary: impl Into<String>) -> Self {
        self.git_binary = git_binary.into();
        self
    }

    /// gitリポジトリがなければ初期化する
    /// 初期化した場合はtrueを返す
    pub async fn ensure_repository(&self) -> Result<bool, SnapshotError> {
        if self.repository_dir.join(".git").exists() {
            return Ok(false);
        }
        self.run_git(&["init"]).await?;
        tracing::info!(dir = %self.repository_dir.display(), "initialized git repository");
        Ok(true)
    }

    /// データベースファイルをステージしてコミットする
    pub async fn commit(&self, message: &str) -> Result<(), SnapshotError> {
        let database_file = self.database_file.to_string_lossy();
        self.run_git(&["add", "--", database_file.as_ref()]).await?;
        self.run_git(&["commit", "-m", message, "--", database_file.as_ref()])
            .await?;
        tracing::debug!(message, "snapshot committed");
        Ok(())
    }

    async fn run_git(&self, args: &[&str]) -> Result<(), SnapshotError> {
        let command = args.first().copied().unwrap_or_default().to_string();
        let output = Command::new(&self.git_binary)
            .args(args)
            .current_dir(&self.repository_dir)
            .output()
            .await
            .map_err(|source| SnapshotError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SnapshotError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for GitSnapshotRecorder {
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        self.commit(&event.snapshot_message())
            .await
            .map_err(|e| HandlerError::ProcessingFailed(e.to_string()))
    }

    fn handler_name(&self) -> &str {
        "GitSnapshotRecorder"
    }
}
