//! TaskSync - セッションのタスク一覧のクライアント側ミラー
//!
//! ローカルの `tasks` を変更するのは TaskSync だけです。
//! 変更は必ずリモートストアを先に通し、ストアが確定した後に、
//! ストアが返した内容でだけローカルを更新します。
//!
//! 表示側は [`TaskListState`] のスナップショットを読むか、購読します。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::status::StatusSummary;
use crate::domain::{
    NewTask, SyncError, Task, TaskFilter, TaskId, TaskInsert, TaskPatch, UserId,
};
use crate::ports::{SessionProvider, TaskStore};

/// 表示側が描画に使う状態一式
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskListState {
    tasks: Vec<Task>,
    error: Option<String>,
    filter: TaskFilter,

    /// 実行中のリモート呼び出し数（`loading` はここから導出）
    in_flight: usize,

    /// 最後に `tasks` へ反映した全件同期の世代
    applied_generation: u64,
}

impl TaskListState {
    /// 新しい順
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn filtered_view(&self) -> Vec<&Task> {
        self.filter.apply(&self.tasks)
    }

    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }
}

/// 生きている間 `loading` を立てる（どの経路で抜けても必ず下がる）
struct InFlight<'a> {
    state: &'a watch::Sender<TaskListState>,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a watch::Sender<TaskListState>, clear_error: bool) -> Self {
        state.send_modify(|s| {
            s.in_flight += 1;
            if clear_error {
                s.error = None;
            }
        });
        Self { state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state
            .send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

/// タスク同期コンポーネント
///
/// # 設計原則
/// - サーバーが正本：create は返った行を先頭に追加、update は返った行で置換、
///   delete はストアの確定後に取り除く
/// - 重なった呼び出しはキューしない。新しい全件同期が反映済みなら、
///   後から終わった古い同期は捨てる
pub struct TaskSync {
    store: Arc<dyn TaskStore>,
    session: Arc<dyn SessionProvider>,
    state: watch::Sender<TaskListState>,
    generation: AtomicU64,
    activated: AtomicBool,
}

impl TaskSync {
    pub fn new(store: Arc<dyn TaskStore>, session: Arc<dyn SessionProvider>) -> Self {
        Self::with_filter(store, session, TaskFilter::All)
    }

    pub fn with_filter(
        store: Arc<dyn TaskStore>,
        session: Arc<dyn SessionProvider>,
        filter: TaskFilter,
    ) -> Self {
        let (state, _) = watch::channel(TaskListState {
            filter,
            ..TaskListState::default()
        });
        Self {
            store,
            session,
            state,
            generation: AtomicU64::new(0),
            activated: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> TaskListState {
        self.state.borrow().clone()
    }

    /// 再描画用の変更通知
    pub fn subscribe(&self) -> watch::Receiver<TaskListState> {
        self.state.subscribe()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().tasks.clone()
    }

    pub fn filtered_view(&self) -> Vec<Task> {
        self.state
            .borrow()
            .filtered_view()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn filter(&self) -> TaskFilter {
        self.state.borrow().filter
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary::from_state(&self.state.borrow())
    }

    // ------------------------------------------------------------------
    // Local-only state
    // ------------------------------------------------------------------

    pub fn set_filter(&self, filter: TaskFilter) {
        self.state.send_if_modified(|s| {
            let changed = s.filter != filter;
            s.filter = filter;
            changed
        });
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// セッション確立後の初回だけ全件同期する
    ///
    /// [`reset`](Self::reset) するまで 2 回目以降は何もしない
    pub async fn activate(&self) -> Result<(), SyncError> {
        if self.activated.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.fetch_all().await
    }

    /// 前のセッションから見えていたものをすべて捨てる
    pub fn reset(&self) {
        self.activated.store(false, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.tasks.clear();
            s.error = None;
            s.filter = TaskFilter::All;
        });
        debug!("task list reset");
    }

    // ------------------------------------------------------------------
    // Remote operations
    // ------------------------------------------------------------------

    /// ローカルの一覧をストアの内容で置き換える
    pub async fn fetch_all(&self) -> Result<(), SyncError> {
        let owner = self.owner("fetch_all")?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight::begin(&self.state, true);
        debug!(%owner, generation, "fetching tasks");

        let tasks = match self.store.select(&owner, None).await {
            Ok(tasks) => tasks,
            Err(e) => return Err(self.fail_for("fetch_all", &owner, e.into())),
        };

        let count = tasks.len();
        let still_owner = self.session.current_user_id().as_ref() == Some(&owner);
        let applied = self.state.send_if_modified(|s| {
            if !still_owner || generation <= s.applied_generation {
                return false;
            }
            s.applied_generation = generation;
            s.tasks = dedup_by_id(tasks);
            true
        });

        if applied {
            info!(%owner, count, "tasks synced");
        } else {
            debug!(%owner, generation, "discarding stale resync");
        }
        Ok(())
    }

    /// 編集フォーム用に 1 件取得（ローカルの一覧は触らない）
    ///
    /// 「見つからない」も失敗も `None`。失敗時のみ `error` を立てる
    pub async fn get_one(&self, id: &TaskId) -> Option<Task> {
        let owner = self.owner("get_one").ok()?;
        let _in_flight = InFlight::begin(&self.state, false);
        debug!(%owner, task_id = %id, "fetching task");

        match self.store.select(&owner, Some(id)).await {
            Ok(rows) => rows.into_iter().find(|task| &task.id == id),
            Err(e) => {
                self.fail_for("get_one", &owner, e.into());
                None
            }
        }
    }

    pub async fn create(&self, input: NewTask) -> Result<Task, SyncError> {
        let row = self.prepare_insert(input).map_err(|e| self.fail("create", e))?;
        let _in_flight = InFlight::begin(&self.state, true);
        debug!(owner = %row.owner, title = %row.title, "creating task");

        let task = match self.store.insert(&row).await {
            Ok(task) => task,
            Err(e) => return Err(self.fail_for("create", &row.owner, e.into())),
        };

        if self.owned_by_session(&task) {
            self.state.send_modify(|s| {
                s.tasks.retain(|t| t.id != task.id);
                s.tasks.insert(0, task.clone());
            });
        }
        info!(task_id = %task.id, "task created");
        Ok(task)
    }

    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, SyncError> {
        let patch = patch.normalized().map_err(|e| self.fail("update", e.into()))?;
        let owner = self.owner("update")?;
        let _in_flight = InFlight::begin(&self.state, true);
        debug!(%owner, task_id = %id, "updating task");

        let task = match self.store.update(&owner, id, &patch).await {
            Ok(Some(task)) => task,
            Ok(None) => return Err(self.fail_for("update", &owner, SyncError::NotFound(id.clone()))),
            Err(e) => return Err(self.fail_for("update", &owner, e.into())),
        };

        if self.owned_by_session(&task) {
            // サーバーが返した行で丸ごと置き換える（ローカルでパッチしない）
            self.state.send_modify(|s| {
                if let Some(slot) = s.tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task.clone();
                }
            });
        }
        info!(task_id = %task.id, status = %task.status, "task updated");
        Ok(task)
    }

    /// ストアにもう無い id の削除も成功扱い（どちらにしても存在しない）
    pub async fn delete(&self, id: &TaskId) -> Result<(), SyncError> {
        let owner = self.owner("delete")?;
        let _in_flight = InFlight::begin(&self.state, true);
        debug!(%owner, task_id = %id, "deleting task");

        let deleted = match self.store.delete(&owner, id).await {
            Ok(deleted) => deleted,
            Err(e) => return Err(self.fail_for("delete", &owner, e.into())),
        };

        if deleted.is_empty() {
            debug!(task_id = %id, "no row deleted; treating as already absent");
        }
        self.state.send_if_modified(|s| {
            let before = s.tasks.len();
            s.tasks.retain(|t| &t.id != id);
            s.tasks.len() != before
        });
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn prepare_insert(&self, input: NewTask) -> Result<TaskInsert, SyncError> {
        let input = input.normalized()?;
        let owner = self.session.current_user_id().ok_or(SyncError::Unauthenticated)?;
        Ok(input.into_insert(owner))
    }

    fn owner(&self, op: &'static str) -> Result<UserId, SyncError> {
        self.session
            .current_user_id()
            .ok_or_else(|| self.fail(op, SyncError::Unauthenticated))
    }

    /// セッションが変わった後に返ってきた結果は、次のセッションの一覧に入れない
    fn owned_by_session(&self, task: &Task) -> bool {
        let owned = self.session.current_user_id().as_ref() == Some(&task.owner);
        if !owned {
            warn!(task_id = %task.id, "session changed during write; not mirroring result");
        }
        owned
    }

    /// `err` を error スロットに記録し、呼び出し元に返す
    fn fail(&self, op: &'static str, err: SyncError) -> SyncError {
        warn!(op, error = %err, "task operation failed");
        let message = err.to_string();
        self.state.send_modify(|s| s.error = Some(message));
        err
    }

    /// リモートの失敗用。呼び出し中にセッションが変わっていたら、次のセッションの error には残さない
    fn fail_for(&self, op: &'static str, owner: &UserId, err: SyncError) -> SyncError {
        if self.session.current_user_id().as_ref() != Some(owner) {
            warn!(op, %owner, error = %err, "session changed during call; not recording error");
            return err;
        }
        self.fail(op, err)
    }
}

/// 同じ id は最初の 1 件だけ残す
fn dedup_by_id(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = std::collections::HashSet::new();
    tasks
        .into_iter()
        .filter(|task| seen.insert(task.id.clone()))
        .collect()
}
