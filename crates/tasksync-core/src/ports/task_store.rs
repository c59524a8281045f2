//! TaskStore port - リモートの行ストア（source of truth）
//!
//! TaskStore は以下を保証する外部サービスです：
//! - task ID の一意性と払い出し
//! - created_at / updated_at の払い出し
//! - owner によるスコープ（他ユーザーの行は見えない・触れない）
//!
//! # 実装
//! - `impls::InMemoryTaskStore`（開発・テスト用）
//! - `impls::RestTaskStore`（PostgREST 互換の行 API）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Task, TaskId, TaskInsert, TaskPatch, UserId};

/// リモートの失敗（TaskSync は UI 向けに 1 つのメッセージにまとめる）
#[derive(Debug, Error)]
pub enum StoreError {
    /// 通信エラー（ストアに届いていない可能性がある）
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// ストアがエラーを返した（認可、制約違反など）
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// レスポンスを task 行として解釈できない
    #[error("unexpected store response: {0}")]
    Decode(String),
}

/// TaskStore は task 行の CRUD を提供
///
/// # 設計原則
/// - すべての操作は owner でスコープされる
/// - select は created_at 降順（新しいものが先頭）
/// - update / delete は影響した行を返す（0 行なら None / 空）
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// `owner` の行（id 指定なら 1 件に絞る）、新しい順
    async fn select(&self, owner: &UserId, id: Option<&TaskId>) -> Result<Vec<Task>, StoreError>;

    /// 挿入し、ID とタイムスタンプが付いた行を返す
    async fn insert(&self, row: &TaskInsert) -> Result<Task, StoreError>;

    /// `(owner, id)` の行に `patch` を適用。該当なしなら `None`
    async fn update(
        &self,
        owner: &UserId,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError>;

    /// `(owner, id)` の行を削除し、削除した行を返す
    async fn delete(&self, owner: &UserId, id: &TaskId) -> Result<Vec<Task>, StoreError>;
}
