//! tasksync-core
//!
//! リモートの行ストアに対する、クライアント側のタスク一覧同期
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, filter, session, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, SessionProvider, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（TaskSync, AuthGate, builder, status）
//! - **impls**: 実装（InMemoryTaskStore, InMemorySessionProvider, RestTaskStore）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{App, AuthGate, ScreenStack, TaskListState, TaskSync, TaskSyncBuilder};
pub use domain::{NewTask, SyncError, Task, TaskFilter, TaskId, TaskPatch, TaskStatus, UserId};
