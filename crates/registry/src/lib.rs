use std::{
    cmp::Reverse,
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use shared::{
    domain::{Category, Comment, CommentId, Coordinates, Priority, ProblemId, ProblemRecord, Status},
    error::RegistryError,
    protocol::{ProblemFilter, ProblemQuery, SortDirection, SortKey},
};
use uuid::Uuid;

pub mod seed;

/// Time source injected into the registry so lifecycle timestamps stay
/// deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Id source injected into the registry; production uses random v4 UUIDs.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> Uuid;
}

#[derive(Debug, Default)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Arguments for registering a new problem report.
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub title: String,
    pub description: String,
    pub location: String,
    pub coordinates: Coordinates,
    pub category: Category,
    pub priority: Priority,
    pub reported_by: String,
}

/// In-memory store and rule-enforcer for citizen-reported problems.
///
/// Clones share one underlying collection. Mutating operations take the
/// collection lock for their whole duration, so each call is indivisible;
/// queries copy the matching records out under the same lock and hand back a
/// detached snapshot.
#[derive(Clone)]
pub struct ProblemRegistry {
    records: Arc<Mutex<Vec<ProblemRecord>>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl Default for ProblemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemRegistry {
    pub fn new() -> Self {
        Self::with_dependencies(Arc::new(SystemClock), Arc::new(RandomIdSource))
    }

    pub fn with_dependencies(clock: Arc<dyn Clock>, ids: Arc<dyn IdSource>) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            clock,
            ids,
        }
    }

    /// Rebuilds a registry from a previously exported snapshot, re-checking
    /// the invariants the registry normally maintains itself.
    pub fn restore(records: Vec<ProblemRecord>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.problem_id) {
                return Err(RegistryError::invalid_argument(
                    "records",
                    format!("duplicate problem id {}", record.problem_id.0),
                ));
            }
            match record.resolved_at {
                Some(resolved_at) if record.status != Status::Resolved => {
                    return Err(RegistryError::invalid_argument(
                        "records",
                        format!(
                            "problem {} has resolved_at {resolved_at} but status {:?}",
                            record.problem_id.0, record.status
                        ),
                    ));
                }
                Some(resolved_at) if resolved_at < record.reported_at => {
                    return Err(RegistryError::invalid_argument(
                        "records",
                        format!(
                            "problem {} was resolved before it was reported",
                            record.problem_id.0
                        ),
                    ));
                }
                None if record.status == Status::Resolved => {
                    return Err(RegistryError::invalid_argument(
                        "records",
                        format!("resolved problem {} lacks resolved_at", record.problem_id.0),
                    ));
                }
                _ => {}
            }
        }

        let registry = Self::new();
        *registry.lock() = records;
        Ok(registry)
    }

    /// Registers a new report. The record starts pending with zero upvotes
    /// and no comments.
    pub fn create(&self, new_problem: NewProblem) -> Result<ProblemRecord, RegistryError> {
        if new_problem.title.trim().is_empty() {
            return Err(RegistryError::invalid_argument(
                "title",
                "must not be blank",
            ));
        }
        if new_problem.location.trim().is_empty() {
            return Err(RegistryError::invalid_argument(
                "location",
                "must not be blank",
            ));
        }

        let record = ProblemRecord {
            problem_id: ProblemId(self.ids.next_id()),
            title: new_problem.title,
            description: new_problem.description,
            location: new_problem.location,
            coordinates: new_problem.coordinates,
            category: new_problem.category,
            status: Status::Pending,
            priority: new_problem.priority,
            upvote_count: 0,
            reported_by: new_problem.reported_by,
            reported_at: self.clock.now(),
            resolved_at: None,
            comments: Vec::new(),
        };

        self.lock().push(record.clone());
        Ok(record)
    }

    /// Moves a record along the three-edge status machine:
    /// pending -> in_progress -> resolved -> pending (reopen).
    ///
    /// Entering resolved stamps `resolved_at`; leaving it clears the stamp.
    pub fn transition_status(
        &self,
        problem_id: ProblemId,
        target: Status,
    ) -> Result<ProblemRecord, RegistryError> {
        let mut records = self.lock();
        let record = find_mut(&mut records, problem_id)?;

        if !transition_allowed(record.status, target) {
            return Err(RegistryError::InvalidTransition {
                from: record.status,
                to: target,
            });
        }

        record.status = target;
        record.resolved_at = match target {
            Status::Resolved => Some(self.clock.now()),
            Status::Pending | Status::InProgress => None,
        };
        Ok(record.clone())
    }

    pub fn add_comment(
        &self,
        problem_id: ProblemId,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<ProblemRecord, RegistryError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(RegistryError::invalid_argument("text", "must not be blank"));
        }

        let mut records = self.lock();
        let record = find_mut(&mut records, problem_id)?;
        record.comments.push(Comment {
            comment_id: CommentId(self.ids.next_id()),
            author: author.into(),
            text,
            posted_at: self.clock.now(),
        });
        Ok(record.clone())
    }

    pub fn upvote(&self, problem_id: ProblemId) -> Result<ProblemRecord, RegistryError> {
        let mut records = self.lock();
        let record = find_mut(&mut records, problem_id)?;
        record.upvote_count = record.upvote_count.saturating_add(1);
        Ok(record.clone())
    }

    /// Filters, searches, and sorts without touching registry state. The
    /// returned records are detached clones; ties keep insertion order.
    pub fn query(&self, query: &ProblemQuery) -> Vec<ProblemRecord> {
        let records = self.lock();
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<ProblemRecord> = records
            .iter()
            .filter(|record| query.filter.matches(record))
            .filter(|record| match &needle {
                Some(needle) => {
                    record.title.to_lowercase().contains(needle)
                        || record.location.to_lowercase().contains(needle)
                }
                None => true,
            })
            .cloned()
            .collect();
        drop(records);

        matched.sort_by(|a, b| {
            let ordering = match query.sort_key {
                SortKey::ReportedAt => a.reported_at.cmp(&b.reported_at),
                SortKey::UpvoteCount => a.upvote_count.cmp(&b.upvote_count),
                SortKey::Status => a.status.cmp(&b.status),
            };
            match query.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        matched
    }

    /// The most upvoted record among those matching `filter`; ties go to the
    /// earliest report. `None` when nothing matches.
    pub fn most_upvoted(&self, filter: Option<&ProblemFilter>) -> Option<ProblemRecord> {
        self.lock()
            .iter()
            .filter(|record| filter.is_none_or(|f| f.matches(record)))
            .max_by_key(|record| (record.upvote_count, Reverse(record.reported_at)))
            .cloned()
    }

    /// Every record in insertion order, cloned, for external serialization.
    pub fn snapshot(&self) -> Vec<ProblemRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProblemRecord>> {
        // Mutations validate before touching the record, so the collection
        // stays consistent even if a previous lock holder panicked.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_mut(
    records: &mut [ProblemRecord],
    problem_id: ProblemId,
) -> Result<&mut ProblemRecord, RegistryError> {
    records
        .iter_mut()
        .find(|record| record.problem_id == problem_id)
        .ok_or(RegistryError::NotFound(problem_id))
}

fn transition_allowed(from: Status, to: Status) -> bool {
    matches!(
        (from, to),
        (Status::Pending, Status::InProgress)
            | (Status::InProgress, Status::Resolved)
            | (Status::Resolved, Status::Pending)
    )
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
