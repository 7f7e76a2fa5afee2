use registry::{seed::seed_demo_problems, NewProblem, ProblemRegistry};
use shared::{
    domain::{Category, Coordinates, Priority, Status},
    protocol::{ProblemQuery, SortDirection, SortKey},
};

fn report(title: &str, location: &str, priority: Priority) -> NewProblem {
    NewProblem {
        title: title.into(),
        description: String::new(),
        location: location.into(),
        coordinates: Coordinates { lat: 0.0, lng: 0.0 },
        category: Category::Other,
        priority,
        reported_by: "acceptance@example.com".into(),
    }
}

#[test]
fn upvote_ranking_acceptance() {
    let registry = ProblemRegistry::new();
    let a = registry
        .create(report("Pothole on Main St", "Main St", Priority::High))
        .expect("create a")
        .problem_id;
    let b = registry
        .create(report("Streetlight out", "Oak Ave", Priority::Low))
        .expect("create b")
        .problem_id;

    registry.upvote(a).expect("upvote a");
    registry.upvote(a).expect("upvote a");
    registry.upvote(b).expect("upvote b");

    let ranked = registry.query(&ProblemQuery {
        sort_key: SortKey::UpvoteCount,
        direction: SortDirection::Descending,
        ..ProblemQuery::default()
    });

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].problem_id, a);
    assert_eq!(ranked[0].upvote_count, 2);
    assert_eq!(ranked[1].problem_id, b);
    assert_eq!(ranked[1].upvote_count, 1);
}

#[test]
fn resolution_timestamp_acceptance() {
    let registry = ProblemRegistry::new();
    let id = registry
        .create(report("Pothole on Main St", "Main St", Priority::High))
        .expect("create")
        .problem_id;

    registry
        .transition_status(id, Status::InProgress)
        .expect("start work");
    let resolved = registry
        .transition_status(id, Status::Resolved)
        .expect("resolve");
    let stamp = resolved.resolved_at.expect("resolved_at set");
    assert!(stamp >= resolved.reported_at);

    let reopened = registry
        .transition_status(id, Status::Pending)
        .expect("reopen");
    assert_eq!(reopened.resolved_at, None);
    assert_eq!(reopened.status, Status::Pending);
}

#[test]
fn seeded_registry_answers_the_dashboard_queries() {
    let registry = ProblemRegistry::new();
    seed_demo_problems(&registry).expect("seed");

    // Table default: newest report first.
    let newest_first = registry.query(&ProblemQuery::default());
    assert_eq!(newest_first.len(), 4);
    for pair in newest_first.windows(2) {
        assert!(pair[0].reported_at >= pair[1].reported_at);
    }

    // Status column sort, descending.
    let by_status = registry.query(&ProblemQuery {
        sort_key: SortKey::Status,
        direction: SortDirection::Descending,
        ..ProblemQuery::default()
    });
    let statuses: Vec<_> = by_status.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            Status::Resolved,
            Status::InProgress,
            Status::Pending,
            Status::Pending,
        ]
    );

    // Search box feeds both title and location.
    let hits = registry.query(&ProblemQuery {
        search: Some("street".into()),
        ..ProblemQuery::default()
    });
    assert_eq!(hits.len(), 3);
}
