//! Boundary between the problem registry and the dashboard UI. The UI layer
//! calls these functions and renders the returned payloads; everything here
//! sits behind the mock login gate.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use registry::{IdSource, NewProblem, ProblemRegistry, RandomIdSource};
use shared::{
    domain::{ProblemId, ProblemRecord, Role, SessionId, Status},
    error::{ApiError, ErrorCode},
    protocol::{DashboardSummary, ProblemFilter, ProblemQuery, SessionUser},
};
use tracing::info;

/// Mock session holder. Accepts any non-blank email/password pair; real
/// credential checking is explicitly out of scope.
#[derive(Clone)]
pub struct SessionGate {
    current: Arc<Mutex<Option<SessionUser>>>,
    ids: Arc<dyn IdSource>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new(Arc::new(RandomIdSource))
    }
}

impl SessionGate {
    pub fn new(ids: Arc<dyn IdSource>) -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            ids,
        }
    }

    pub fn login(&self, email: &str, password: &str, role: Role) -> Result<SessionUser, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return Err(ApiError::new(ErrorCode::Unauthorized, "invalid credentials"));
        }

        let display_name = email.split('@').next().unwrap_or(email).to_string();
        let organization = match role {
            Role::Municipal => "Municipal Office",
            Role::Ngo => "Sample NGO",
        };
        let user = SessionUser {
            session_id: SessionId(self.ids.next_id()),
            email: email.to_string(),
            display_name,
            role,
            organization: organization.to_string(),
        };
        *self.slot() = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&self) {
        *self.slot() = None;
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.slot().clone()
    }

    fn slot(&self) -> MutexGuard<'_, Option<SessionUser>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub registry: ProblemRegistry,
    pub sessions: SessionGate,
}

impl ApiContext {
    pub fn new(registry: ProblemRegistry) -> Self {
        Self {
            registry,
            sessions: SessionGate::default(),
        }
    }
}

pub fn login(
    ctx: &ApiContext,
    email: &str,
    password: &str,
    role: Role,
) -> Result<SessionUser, ApiError> {
    let user = ctx.sessions.login(email, password, role)?;
    info!(email = %user.email, role = ?user.role, "operator signed in");
    Ok(user)
}

pub fn logout(ctx: &ApiContext) {
    if let Some(user) = ctx.sessions.current_user() {
        info!(email = %user.email, "operator signed out");
    }
    ctx.sessions.logout();
}

pub fn list_problems(
    ctx: &ApiContext,
    query: &ProblemQuery,
) -> Result<Vec<ProblemRecord>, ApiError> {
    ensure_signed_in(ctx)?;
    Ok(ctx.registry.query(query))
}

pub fn report_problem(ctx: &ApiContext, report: NewProblem) -> Result<ProblemRecord, ApiError> {
    ensure_signed_in(ctx)?;
    let record = ctx.registry.create(report)?;
    info!(problem = %record.problem_id.0, title = %record.title, "problem reported");
    Ok(record)
}

pub fn update_status(
    ctx: &ApiContext,
    problem_id: ProblemId,
    target: Status,
) -> Result<ProblemRecord, ApiError> {
    ensure_signed_in(ctx)?;
    let record = ctx.registry.transition_status(problem_id, target)?;
    info!(problem = %record.problem_id.0, status = ?record.status, "status updated");
    Ok(record)
}

pub fn comment_on_problem(
    ctx: &ApiContext,
    problem_id: ProblemId,
    author: &str,
    text: &str,
) -> Result<ProblemRecord, ApiError> {
    ensure_signed_in(ctx)?;
    Ok(ctx.registry.add_comment(problem_id, author, text)?)
}

pub fn upvote_problem(ctx: &ApiContext, problem_id: ProblemId) -> Result<ProblemRecord, ApiError> {
    ensure_signed_in(ctx)?;
    Ok(ctx.registry.upvote(problem_id)?)
}

pub fn most_upvoted(
    ctx: &ApiContext,
    filter: Option<&ProblemFilter>,
) -> Result<Option<ProblemRecord>, ApiError> {
    ensure_signed_in(ctx)?;
    Ok(ctx.registry.most_upvoted(filter))
}

pub fn dashboard_summary(ctx: &ApiContext) -> Result<DashboardSummary, ApiError> {
    ensure_signed_in(ctx)?;
    Ok(DashboardSummary::from_records(&ctx.registry.snapshot()))
}

fn ensure_signed_in(ctx: &ApiContext) -> Result<SessionUser, ApiError> {
    ctx.sessions
        .current_user()
        .ok_or_else(|| ApiError::new(ErrorCode::Unauthorized, "no active session"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry::seed::seed_demo_problems;

    fn setup() -> ApiContext {
        ApiContext::new(ProblemRegistry::new())
    }

    fn signed_in() -> ApiContext {
        let ctx = setup();
        login(&ctx, "clerk@city.gov", "hunter2", Role::Municipal).expect("login");
        ctx
    }

    #[test]
    fn login_rejects_blank_credentials() {
        let ctx = setup();
        let err = login(&ctx, "  ", "hunter2", Role::Municipal).expect_err("blank email");
        assert!(matches!(err.code, ErrorCode::Unauthorized));
        let err = login(&ctx, "clerk@city.gov", "", Role::Ngo).expect_err("blank password");
        assert!(matches!(err.code, ErrorCode::Unauthorized));
        assert!(ctx.sessions.current_user().is_none());
    }

    #[test]
    fn login_derives_display_name_and_organization() {
        let ctx = setup();
        let user = login(&ctx, "clerk@city.gov", "hunter2", Role::Municipal).expect("login");
        assert_eq!(user.display_name, "clerk");
        assert_eq!(user.organization, "Municipal Office");

        let user = login(&ctx, "volunteer@ngo.org", "pw", Role::Ngo).expect("login");
        assert_eq!(user.organization, "Sample NGO");
    }

    #[test]
    fn operations_require_an_active_session() {
        let ctx = setup();
        seed_demo_problems(&ctx.registry).expect("seed");

        let err = list_problems(&ctx, &ProblemQuery::default()).expect_err("no session");
        assert!(matches!(err.code, ErrorCode::Unauthorized));
        let err = dashboard_summary(&ctx).expect_err("no session");
        assert!(matches!(err.code, ErrorCode::Unauthorized));
    }

    #[test]
    fn logout_closes_the_gate_again() {
        let ctx = signed_in();
        assert!(list_problems(&ctx, &ProblemQuery::default()).is_ok());

        logout(&ctx);
        let err = list_problems(&ctx, &ProblemQuery::default()).expect_err("gate closed");
        assert!(matches!(err.code, ErrorCode::Unauthorized));
    }

    #[test]
    fn status_updates_flow_through_the_gate() {
        let ctx = signed_in();
        let ids = seed_demo_problems(&ctx.registry).expect("seed");

        let record = update_status(&ctx, ids[0], Status::InProgress).expect("update");
        assert_eq!(record.status, Status::InProgress);

        let err = update_status(&ctx, ids[3], Status::Resolved).expect_err("bad edge");
        assert!(matches!(err.code, ErrorCode::InvalidTransition));
    }

    #[test]
    fn registry_errors_map_to_boundary_codes() {
        let ctx = signed_in();
        let ids = seed_demo_problems(&ctx.registry).expect("seed");

        let err = comment_on_problem(&ctx, ids[0], "clerk", "   ").expect_err("blank text");
        assert!(matches!(err.code, ErrorCode::Validation));

        let ghost = ProblemId(uuid::Uuid::nil());
        let err = upvote_problem(&ctx, ghost).expect_err("unknown id");
        assert!(matches!(err.code, ErrorCode::NotFound));
    }

    #[test]
    fn dashboard_summary_reflects_the_seeded_board() {
        let ctx = signed_in();
        seed_demo_problems(&ctx.registry).expect("seed");

        let summary = dashboard_summary(&ctx).expect("summary");
        assert_eq!(summary.total, 4);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.resolution_rate_percent, 25);
        assert_eq!(
            summary.most_upvoted.expect("seeded").title,
            "Large pothole on Main Street"
        );
        let potholes = summary
            .by_category
            .iter()
            .find(|c| c.category == shared::domain::Category::Pothole)
            .expect("pothole bucket");
        assert_eq!(potholes.count, 1);
    }
}
