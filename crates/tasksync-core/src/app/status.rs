//! Status - 一覧のステータス集計
//!
//! フィルタタブに件数を出すための読み取り専用ビューです。

use serde::{Deserialize, Serialize};

use super::task_sync::TaskListState;
use crate::domain::{Task, TaskStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut counts = StatusCounts {
            total: tasks.len(),
            ..StatusCounts::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Open => counts.open += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Done => counts.done += 1,
            }
        }
        counts
    }

    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Open => self.open,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Done => self.done,
        }
    }
}

/// 件数 + loading / error をまとめたシリアライズ可能な値
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub counts: StatusCounts,
    pub loading: bool,
    pub error: Option<String>,
}

impl StatusSummary {
    pub fn from_state(state: &TaskListState) -> Self {
        Self {
            counts: StatusCounts::from_tasks(state.tasks()),
            loading: state.loading(),
            error: state.error().map(str::to_string),
        }
    }
}
