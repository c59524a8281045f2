//! AuthGate - セッション状態から表示する画面スタックを決める
//!
//! セッションの遷移を購読し、
//! - established: TaskSync を activate（初回の全件同期）
//! - cleared: TaskSync を reset（前ユーザーのタスクを残さない）
//! を行います。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::task_sync::TaskSync;
use crate::domain::{SessionState, UserId};
use crate::ports::SessionProvider;

/// 表示する画面スタック
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenStack {
    /// サインイン・登録
    Auth,
    /// タスク一覧・詳細・プロフィール
    Main,
}

impl ScreenStack {
    pub fn for_state(state: &SessionState) -> Self {
        match state {
            SessionState::Established(_) => ScreenStack::Main,
            SessionState::Cleared => ScreenStack::Auth,
        }
    }
}

pub struct AuthGate {
    session: Arc<dyn SessionProvider>,
    tasks: Arc<TaskSync>,
    stack: watch::Sender<ScreenStack>,
}

impl AuthGate {
    pub fn new(session: Arc<dyn SessionProvider>, tasks: Arc<TaskSync>) -> Self {
        let initial = ScreenStack::for_state(&session.subscribe().borrow());
        let (stack, _) = watch::channel(initial);
        Self {
            session,
            tasks,
            stack,
        }
    }

    pub fn current_stack(&self) -> ScreenStack {
        *self.stack.borrow()
    }

    pub fn subscribe_stack(&self) -> watch::Receiver<ScreenStack> {
        self.stack.subscribe()
    }

    /// セッションの遷移を追いかける
    /// - `shutdown_rx` に true が来るか、送信側が drop されると止まる
    pub async fn run(&self, shutdown_rx: &mut watch::Receiver<bool>) {
        let mut rx = self.session.subscribe();
        let mut last: Option<UserId> = None;

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let state = rx.borrow_and_update().clone();
            self.apply(&state, &mut last).await;

            // セッションの変化と shutdown を競合させる
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("auth gate stopped");
    }

    async fn apply(&self, state: &SessionState, last: &mut Option<UserId>) {
        let current = state.session().map(|s| s.user.id.clone());

        // 別ユーザーへの直接切り替えも、一度 reset してから activate する
        if last.is_some() && *last != current {
            self.tasks.reset();
        }
        *last = current.clone();

        let stack = ScreenStack::for_state(state);
        self.stack.send_if_modified(|s| {
            let changed = *s != stack;
            *s = stack;
            changed
        });

        if let Some(user) = current {
            info!(%user, "session established; activating task list");
            if let Err(e) = self.tasks.activate().await {
                warn!(error = %e, "initial task sync failed");
            }
        }
    }
}
