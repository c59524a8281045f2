//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: 開発用・テスト用の行ストア
//! - **InMemorySessionProvider**: 開発用・テスト用のセッション
//! - **RestTaskStore**: PostgREST 互換の行 API クライアント

pub mod inmem_session;
pub mod inmem_store;
pub mod rest_store;

pub use self::inmem_session::InMemorySessionProvider;
pub use self::inmem_store::{InMemoryTaskStore, StoreCall, StoreOp};
pub use self::rest_store::{RestConfig, RestTaskStore};
