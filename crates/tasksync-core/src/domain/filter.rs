//! TaskFilter - ステータスタブの表示条件

use std::fmt;
use std::str::FromStr;

use super::errors::ValidationError;
use super::task::{Task, TaskStatus};

/// 一時的な表示パラメータ
///
/// 永続化せず、ストアにも送りません。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskFilter {
    #[default]
    All,
    Status(TaskStatus),
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 4] = [
        TaskFilter::All,
        TaskFilter::Status(TaskStatus::Open),
        TaskFilter::Status(TaskStatus::InProgress),
        TaskFilter::Status(TaskStatus::Done),
    ];

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Status(status) => task.status == *status,
        }
    }

    /// `tasks` のうち条件に合うものを、順序を保って返す
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}

impl From<TaskStatus> for TaskFilter {
    fn from(status: TaskStatus) -> Self {
        TaskFilter::Status(status)
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFilter::All => f.write_str("all"),
            TaskFilter::Status(status) => status.fmt(f),
        }
    }
}

impl FromStr for TaskFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(TaskFilter::All),
            other => other.parse::<TaskStatus>().map(TaskFilter::Status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskId, UserId};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn task(id: &str, status: TaskStatus) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Task {
            id: TaskId::new(id),
            owner: UserId::new("u1"),
            title: id.to_string(),
            description: None,
            status,
            deadline: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn mixed() -> Vec<Task> {
        vec![
            task("a", TaskStatus::Done),
            task("b", TaskStatus::Open),
            task("c", TaskStatus::InProgress),
            task("d", TaskStatus::Open),
            task("e", TaskStatus::Done),
        ]
    }

    #[test]
    fn all_returns_every_task_in_order() {
        let tasks = mixed();
        let ids: Vec<_> = TaskFilter::All.apply(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[rstest]
    #[case(TaskStatus::Open, vec!["b", "d"])]
    #[case(TaskStatus::InProgress, vec!["c"])]
    #[case(TaskStatus::Done, vec!["a", "e"])]
    fn status_filter_keeps_matching_subset_in_order(
        #[case] status: TaskStatus,
        #[case] expected: Vec<&str>,
    ) {
        let tasks = mixed();
        let view = TaskFilter::from(status).apply(&tasks);
        let ids: Vec<_> = view.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, expected);
        assert!(view.iter().all(|t| t.status == status));
    }

    #[test]
    fn filter_round_trips_through_its_name() {
        for filter in TaskFilter::ALL {
            assert_eq!(filter.to_string().parse::<TaskFilter>().unwrap(), filter);
        }
        assert!("everything".parse::<TaskFilter>().is_err());
    }
}
