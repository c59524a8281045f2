//! InMemoryTaskStore - 開発用・テスト用の行ストア
//!
//! リモートストアの契約（ID 払い出し、タイムスタンプ、owner スコープ、
//! created_at 降順）をプロセス内で再現します。
//!
//! # テスト支援
//! - `calls()`: 受け付けた呼び出しの記録（どの owner で呼ばれたか）
//! - `fail_next()`: 次の呼び出しを指定のエラーで失敗させる
//! - `pause()` / `resume()`: 呼び出しを途中で止める（in-flight 状態の観測用）

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use crate::domain::{Task, TaskId, TaskInsert, TaskPatch, UserId};
use crate::ports::{Clock, IdGenerator, StoreError, SystemClock, TaskStore, UlidGenerator};

/// 記録された呼び出しの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
    Delete,
}

/// ストアが受けた 1 回の呼び出し
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub owner: UserId,
    pub id: Option<TaskId>,
}

struct InMemoryStoreState {
    /// 挿入順。select() はここから新しい順を作る
    rows: Vec<Task>,

    calls: Vec<StoreCall>,

    /// 呼び出しごとに先頭から 1 つ消費
    failures: VecDeque<StoreError>,
}

/// [`TaskStore`] の InMemory 実装
pub struct InMemoryTaskStore {
    state: Arc<Mutex<InMemoryStoreState>>,
    clock: Arc<dyn Clock>,
    ids: UlidGenerator<Arc<dyn Clock>>,
    /// `true` = 開。呼び出しは記録後ここで待つ
    gate: watch::Sender<bool>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Arc::new(Mutex::new(InMemoryStoreState {
                rows: Vec::new(),
                calls: Vec::new(),
                failures: VecDeque::new(),
            })),
            ids: UlidGenerator::new(Arc::clone(&clock)),
            clock,
            gate,
        }
    }

    /// 次の呼び出しを `error` で失敗させる（記録はされる）
    pub async fn fail_next(&self, error: StoreError) {
        self.state.lock().await.failures.push_back(error);
    }

    /// [`resume`](Self::resume) まで全呼び出しを止める
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    /// owner を問わず全行（挿入順）
    pub async fn rows(&self) -> Vec<Task> {
        self.state.lock().await.rows.clone()
    }

    /// 呼び出しを記録 → gate を待つ → 注入された失敗があれば返す
    async fn enter(&self, op: StoreOp, owner: &UserId, id: Option<&TaskId>) -> Result<(), StoreError> {
        self.state.lock().await.calls.push(StoreCall {
            op,
            owner: owner.clone(),
            id: id.cloned(),
        });

        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Unavailable(format!("store closed: {e}")))?;

        match self.state.lock().await.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn select(&self, owner: &UserId, id: Option<&TaskId>) -> Result<Vec<Task>, StoreError> {
        self.enter(StoreOp::Select, owner, id).await?;

        let state = self.state.lock().await;
        // 新しく入れたものを先に並べてから安定ソートする（created_at が同じでも挿入の新しい順）
        let mut rows: Vec<Task> = state
            .rows
            .iter()
            .rev()
            .filter(|row| &row.owner == owner)
            .filter(|row| id.is_none_or(|id| &row.id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, row: &TaskInsert) -> Result<Task, StoreError> {
        self.enter(StoreOp::Insert, &row.owner, None).await?;

        if row.owner.is_empty() {
            return Err(StoreError::Rejected {
                status: 401,
                message: "missing owner".to_string(),
            });
        }
        if row.title.trim().is_empty() {
            return Err(StoreError::Rejected {
                status: 400,
                message: "title must not be empty".to_string(),
            });
        }

        let now = self.clock.now();
        let task = Task {
            id: self.ids.generate_task_id(),
            owner: row.owner.clone(),
            title: row.title.clone(),
            description: row.description.clone(),
            status: row.status,
            deadline: row.deadline,
            created_at: now,
            updated_at: now,
        };

        self.state.lock().await.rows.push(task.clone());
        Ok(task)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        self.enter(StoreOp::Update, owner, Some(id)).await?;

        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(StoreError::Rejected {
                status: 400,
                message: "title must not be empty".to_string(),
            });
        }

        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let Some(row) = state
            .rows
            .iter_mut()
            .find(|row| &row.id == id && &row.owner == owner)
        else {
            return Ok(None);
        };

        patch.apply_to(row);
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn delete(&self, owner: &UserId, id: &TaskId) -> Result<Vec<Task>, StoreError> {
        self.enter(StoreOp::Delete, owner, Some(id)).await?;

        let mut state = self.state.lock().await;
        let (deleted, kept): (Vec<Task>, Vec<Task>) = std::mem::take(&mut state.rows)
            .into_iter()
            .partition(|row| &row.id == id && &row.owner == owner);
        state.rows = kept;
        Ok(deleted)
    }
}
