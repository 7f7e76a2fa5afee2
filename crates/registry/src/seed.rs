//! Demo dataset matching the problems shown on the reference dashboard.
//! Everything goes through the public registry operations, so the seeded
//! records obey the same lifecycle rules as live reports.

use shared::{
    domain::{Category, Coordinates, Priority, ProblemId, Status},
    error::RegistryError,
};

use crate::{NewProblem, ProblemRegistry};

pub fn seed_demo_problems(registry: &ProblemRegistry) -> Result<Vec<ProblemId>, RegistryError> {
    let pothole = registry.create(NewProblem {
        title: "Large pothole on Main Street".into(),
        description: "Deep pothole causing damage to vehicles. Located near the intersection \
                      with 5th Avenue."
            .into(),
        location: "Main St & 5th Ave".into(),
        coordinates: Coordinates {
            lat: 40.7128,
            lng: -74.006,
        },
        category: Category::Pothole,
        priority: Priority::High,
        reported_by: "citizen@email.com".into(),
    })?;
    upvote_times(registry, pothole.problem_id, 23)?;
    registry.add_comment(
        pothole.problem_id,
        "John D.",
        "This is getting worse every day!",
    )?;
    registry.add_comment(pothole.problem_id, "Sarah M.", "My car tire was damaged here")?;

    let streetlight = registry.create(NewProblem {
        title: "Broken streetlight".into(),
        description: "Streetlight has been out for over a week, creating safety concerns for \
                      pedestrians."
            .into(),
        location: "Oak Avenue near Park".into(),
        coordinates: Coordinates {
            lat: 40.7589,
            lng: -73.9851,
        },
        category: Category::Streetlight,
        priority: Priority::Medium,
        reported_by: "resident@email.com".into(),
    })?;
    upvote_times(registry, streetlight.problem_id, 15)?;
    registry.add_comment(
        streetlight.problem_id,
        "Mike R.",
        "Very dark at night, needs urgent attention",
    )?;
    registry.transition_status(streetlight.problem_id, Status::InProgress)?;

    let garbage = registry.create(NewProblem {
        title: "Overflowing garbage bin".into(),
        description: "Public garbage bin is overflowing and attracting pests.".into(),
        location: "Central Park District".into(),
        coordinates: Coordinates {
            lat: 40.7831,
            lng: -73.9712,
        },
        category: Category::Garbage,
        priority: Priority::Low,
        reported_by: "walker@email.com".into(),
    })?;
    upvote_times(registry, garbage.problem_id, 8)?;
    registry.transition_status(garbage.problem_id, Status::InProgress)?;
    registry.transition_status(garbage.problem_id, Status::Resolved)?;

    let water = registry.create(NewProblem {
        title: "Water leak on residential street".into(),
        description: "Water main leak causing flooding on the sidewalk and road.".into(),
        location: "Elm Street".into(),
        coordinates: Coordinates {
            lat: 40.7505,
            lng: -73.9934,
        },
        category: Category::Water,
        priority: Priority::High,
        reported_by: "neighbor@email.com".into(),
    })?;
    upvote_times(registry, water.problem_id, 19)?;
    registry.add_comment(
        water.problem_id,
        "Lisa K.",
        "Water is getting worse, please fix soon",
    )?;

    Ok(vec![
        pothole.problem_id,
        streetlight.problem_id,
        garbage.problem_id,
        water.problem_id,
    ])
}

fn upvote_times(
    registry: &ProblemRegistry,
    problem_id: ProblemId,
    count: u32,
) -> Result<(), RegistryError> {
    for _ in 0..count {
        registry.upvote(problem_id)?;
    }
    Ok(())
}
