//! Errors - エラー型と分類
//!
//! - ValidationError: ローカルで検出（リモートには届かない）
//! - SyncError: TaskSync の各操作が返す失敗（`error` スロットにも文字列で残る）

use thiserror::Error;

use super::ids::TaskId;
use crate::ports::StoreError;

/// 入力エラー（リモート呼び出しの前に弾く）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required")]
    TitleRequired,

    #[error("unknown status '{0}' (expected open, in_progress or done)")]
    UnknownStatus(String),
}

/// TaskSync の操作失敗
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// セッションがない（空の owner で書き込むことはしない）
    #[error("not signed in")]
    Unauthenticated,

    /// 現在のセッションの範囲で、この id の行がない
    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// ストアに一度も問い合わせていない失敗なら true
    pub fn is_local(&self) -> bool {
        matches!(self, SyncError::Validation(_) | SyncError::Unauthenticated)
    }
}
