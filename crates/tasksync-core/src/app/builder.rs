//! TaskSyncBuilder - コンポーネントの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - store と session は必須。どちらかが欠けていれば build() が BuildError を返す
//! - グローバルなシングルトンは使わず、ここで渡したものだけが使われる

use std::sync::Arc;

use super::auth_gate::AuthGate;
use super::task_sync::TaskSync;
use crate::domain::TaskFilter;
use crate::ports::{SessionProvider, TaskStore};

/// 使用例
/// ```ignore
/// let app = TaskSyncBuilder::new()
///     .store(Arc::new(InMemoryTaskStore::new()))
///     .session(provider.clone())
///     .build()?;
/// let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
/// tokio::spawn(async move { app.gate.run(&mut shutdown_rx).await });
/// ```
#[derive(Default)]
pub struct TaskSyncBuilder {
    store: Option<Arc<dyn TaskStore>>,
    session: Option<Arc<dyn SessionProvider>>,
    filter: TaskFilter,
}

/// BuildError はワイヤリング時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no task store configured")]
    MissingStore,

    #[error("no session provider configured")]
    MissingSession,
}

impl TaskSyncBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn session(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    /// 一覧の初期フィルタ
    pub fn initial_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        let session = self.session.ok_or(BuildError::MissingSession)?;

        let tasks = Arc::new(TaskSync::with_filter(store, Arc::clone(&session), self.filter));
        let gate = Arc::new(AuthGate::new(session, Arc::clone(&tasks)));
        Ok(App { tasks, gate })
    }
}

/// 表示側に渡す、組み立て済みのコンポーネント
pub struct App {
    pub tasks: Arc<TaskSync>,
    pub gate: Arc<AuthGate>,
}
