//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（行ストア、認証サービス）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - リモートストアが正本（server-authoritative）
//! - クライアントはその鏡像を持つだけで、先回りして状態を進めない

pub mod clock;
pub mod id_generator;
pub mod session;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SteppingClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::session::SessionProvider;
pub use self::task_store::{StoreError, TaskStore};
