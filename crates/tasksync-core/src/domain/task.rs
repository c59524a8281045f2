//! Task - タスク行と、入力から作る書き込みペイロード

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;
use super::ids::{TaskId, UserId};

/// タスクの進捗
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Open, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(TaskStatus::Open),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// リモートストアが返すタスク行
///
/// # 設計原則
/// - `id`, `created_at`, `updated_at` はストアが払い出す（クライアントは作らない）
/// - `owner` は作成時のセッションのユーザー（カラム名は `user_id`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    #[serde(rename = "user_id")]
    pub owner: UserId,

    pub title: String,

    /// `None` と `Some("")` は別の状態。正規化で後者は作らない
    pub description: Option<String>,

    pub status: TaskStatus,

    /// 日付のみ（`YYYY-MM-DD`）
    pub deadline: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 作成時の入力（owner は含めない）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// 文字列を trim し、空のタイトルを弾く
    pub fn normalized(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            description: self.description.as_deref().and_then(normalize_description),
            status: self.status,
            deadline: self.deadline,
        })
    }

    /// owner を付ける。status 未指定なら `open`
    pub fn into_insert(self, owner: UserId) -> TaskInsert {
        TaskInsert {
            owner,
            title: self.title,
            description: self.description,
            status: self.status.unwrap_or_default(),
            deadline: self.deadline,
        }
    }
}

/// ストアに送る insert ペイロード
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInsert {
    #[serde(rename = "user_id")]
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
}

/// 部分更新（指定しなかったフィールドはストア側で変わらない）
///
/// nullable なカラムは `Option<Option<_>>`：
/// `None` はそのまま、`Some(None)` はクリア
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn deadline(mut self, deadline: Option<NaiveDate>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.deadline.is_none()
    }

    /// 指定されたフィールドに [`NewTask::normalized`] と同じ規則を適用
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let title = match self.title {
            Some(title) => Some(normalize_title(&title)?),
            None => None,
        };
        let description = self
            .description
            .map(|d| d.as_deref().and_then(normalize_description));

        Ok(Self {
            title,
            description,
            status: self.status,
            deadline: self.deadline,
        })
    }

    /// ストア側での適用（`updated_at` は触らない）
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
    }
}

fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    Ok(title.to_string())
}

fn normalize_description(description: &str) -> Option<String> {
    let description = description.trim();
    (!description.is_empty()).then(|| description.to_string())
}
