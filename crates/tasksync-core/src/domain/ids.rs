//! Ids - 型付きのドメイン ID
//!
//! ID の値そのものはリモートストアが払い出す不透明な文字列です
//! （REST バックエンドなら UUID、InMemory ストアなら ULID）。
//! クライアント側では中身を解釈せず、比較とクエリへの埋め込みにのみ使います。
//!
//! ## Phantom Type パターン
//! `Id<T>` というジェネリック型で共通実装を提供しつつ、
//! `T` はマーカー型としてコンパイル時の型安全性だけを提供します。
//! TaskId と UserId は同じ文字列表現でも混同できません。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
///
/// Debug 出力で使うラベル（"task", "user"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn label() -> &'static str;
}

/// ジェネリック ID 型
///
/// # 例
/// ```ignore
/// let task_id = TaskId::new("01HZX...");
/// let user_id = UserId::new("9b2f...");
/// // task_id と user_id は異なる型なので、混同できない
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// 空の ID はストアが払い出すことはない（セッション未確立の owner など）
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T: IdMarker> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::label(), self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn label() -> &'static str {
        "task"
    }
}

/// User（セッション主体）のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum User {}

impl IdMarker for User {
    fn label() -> &'static str {
        "user"
    }
}

/// task 行の ID（リモートストアが払い出す）
pub type TaskId = Id<Task>;

/// 認証済みユーザーの ID（セッションプロバイダが渡す）
pub type UserId = Id<User>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let task_id = TaskId::new("0b6f1c1e-0000-4000-8000-000000000001");

        let serialized = serde_json::to_string(&task_id).unwrap();
        assert_eq!(serialized, "\"0b6f1c1e-0000-4000-8000-000000000001\"");

        let deserialized: TaskId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(task_id, deserialized);
    }

    #[test]
    fn display_is_raw_value_and_debug_is_labelled() {
        let user_id = UserId::new("alice");

        // Display はクエリに埋め込むため生の値
        assert_eq!(user_id.to_string(), "alice");
        assert_eq!(format!("{user_id:?}"), "user(alice)");
        assert_eq!(format!("{:?}", TaskId::new("t1")), "task(t1)");
    }

    #[test]
    fn blank_ids_are_empty() {
        assert!(UserId::new("").is_empty());
        assert!(UserId::new("   ").is_empty());
        assert!(!UserId::new("u1").is_empty());
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<TaskId>(), size_of::<String>());
        assert_eq!(size_of::<UserId>(), size_of::<String>());
    }
}
