//! Domain - ドメインモデル（ids, task, filter, session, errors）

pub mod errors;
pub mod filter;
pub mod ids;
pub mod session;
pub mod task;

pub use self::errors::{SyncError, ValidationError};
pub use self::filter::TaskFilter;
pub use self::ids::{TaskId, UserId};
pub use self::session::{Session, SessionState, User};
pub use self::task::{NewTask, Task, TaskInsert, TaskPatch, TaskStatus};
