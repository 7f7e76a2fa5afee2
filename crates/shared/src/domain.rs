use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);
    };
}

id_newtype!(ProblemId);
id_newtype!(CommentId);
id_newtype!(SessionId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Pothole,
    Streetlight,
    Garbage,
    Water,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Pothole,
        Category::Streetlight,
        Category::Garbage,
        Category::Water,
        Category::Other,
    ];
}

/// Ord follows lifecycle position (pending < in_progress < resolved),
/// not the lexicographic order of the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Municipal,
    Ngo,
}

/// Latitude/longitude pair carried for the map view; the registry never
/// computes with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: CommentId,
    pub author: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

/// A single citizen-reported problem and its lifecycle state.
///
/// `resolved_at` is present exactly while `status` is `Resolved`; the
/// registry maintains that invariant on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub problem_id: ProblemId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub coordinates: Coordinates,
    pub category: Category,
    pub status: Status,
    pub priority: Priority,
    pub upvote_count: u32,
    pub reported_by: String,
    pub reported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub comments: Vec<Comment>,
}
