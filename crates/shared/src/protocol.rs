use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::domain::{Category, Priority, ProblemRecord, Role, SessionId, Status};

/// Conjunction of optional exact-match predicates. An unset field matches
/// every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl ProblemFilter {
    pub fn matches(&self, record: &ProblemRecord) -> bool {
        self.status.is_none_or(|status| record.status == status)
            && self.category.is_none_or(|category| record.category == category)
            && self.priority.is_none_or(|priority| record.priority == priority)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    ReportedAt,
    UpvoteCount,
    /// Compares by lifecycle position: pending before in_progress before
    /// resolved.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemQuery {
    #[serde(default)]
    pub filter: ProblemFilter,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    /// Case-insensitive substring match against title or location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ProblemQuery {
    /// Newest reports first, matching the dashboard's initial table view.
    fn default() -> Self {
        Self {
            filter: ProblemFilter::default(),
            sort_key: SortKey::ReportedAt,
            direction: SortDirection::Descending,
            search: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Headline figures rendered by the dashboard overview page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    /// Share of records resolved, rounded to whole percent; zero when the
    /// registry is empty.
    pub resolution_rate_percent: u32,
    pub by_category: Vec<CategoryCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_upvoted: Option<ProblemRecord>,
}

impl DashboardSummary {
    pub fn from_records(records: &[ProblemRecord]) -> Self {
        let total = records.len();
        let count_status =
            |status: Status| records.iter().filter(|r| r.status == status).count();
        let pending = count_status(Status::Pending);
        let in_progress = count_status(Status::InProgress);
        let resolved = count_status(Status::Resolved);

        let resolution_rate_percent = if total == 0 {
            0
        } else {
            ((resolved * 100) as f64 / total as f64).round() as u32
        };

        let by_category = Category::ALL
            .iter()
            .map(|&category| CategoryCount {
                category,
                count: records.iter().filter(|r| r.category == category).count(),
            })
            .collect();

        // Ties on upvotes go to the earliest report.
        let most_upvoted = records
            .iter()
            .max_by_key(|r| (r.upvote_count, Reverse(r.reported_at)))
            .cloned();

        Self {
            total,
            pending,
            in_progress,
            resolved,
            resolution_rate_percent,
            by_category,
            most_upvoted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub session_id: SessionId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub organization: String,
}
