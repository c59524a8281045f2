//! App - アプリケーション層
//!
//! ports を組み合わせてクライアント側のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **TaskSync**: タスク一覧の同期（CRUD・フィルタ・loading/error）
//! - **AuthGate**: セッション状態による画面スタックの切り替え
//! - **TaskSyncBuilder**: 構築とワイヤリング
//! - **Status**: ステータス別の件数

pub mod auth_gate;
pub mod builder;
pub mod status;
pub mod task_sync;

pub use self::auth_gate::{AuthGate, ScreenStack};
pub use self::builder::{App, BuildError, TaskSyncBuilder};
pub use self::status::{StatusCounts, StatusSummary};
pub use self::task_sync::{TaskListState, TaskSync};
