use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use registry::{seed::seed_demo_problems, NewProblem, ProblemRegistry};
use shared::{
    domain::{Category, Coordinates, Priority, ProblemId, ProblemRecord, Status},
    protocol::{DashboardSummary, ProblemFilter, ProblemQuery, SortDirection, SortKey},
};
use tracing::info;
use uuid::Uuid;

mod config;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "board-tools", about = "Operator console for the civic problem board")]
struct Cli {
    /// JSON snapshot to load and write back; overrides board.toml.
    #[arg(long)]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install the demo problems from the dashboard fixture.
    Seed,
    /// Print problems, filtered and sorted like the dashboard table.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "reported-at")]
        sort: String,
        #[arg(long)]
        ascending: bool,
        #[arg(long)]
        json: bool,
    },
    /// Register a new problem report.
    Report {
        title: String,
        location: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "other")]
        category: String,
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long, default_value_t = 0.0)]
        lat: f64,
        #[arg(long, default_value_t = 0.0)]
        lng: f64,
        #[arg(long)]
        reported_by: Option<String>,
    },
    /// Move a problem along its lifecycle.
    Transition { id: Uuid, status: String },
    /// Append a citizen comment.
    Comment {
        id: Uuid,
        text: String,
        #[arg(long)]
        author: Option<String>,
    },
    Upvote {
        id: Uuid,
    },
    /// Overview figures for the board.
    Summary {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let settings = load_settings();
    let data_path = cli.data.clone().or_else(|| settings.data_path.clone());

    let registry = match &data_path {
        Some(path) if path.exists() => load_snapshot(path)?,
        _ => ProblemRegistry::new(),
    };

    let mutated = run_command(&registry, &settings, cli.command)?;
    if mutated {
        if let Some(path) = &data_path {
            persist_snapshot(&registry, path)?;
            info!(path = %path.display(), records = registry.len(), "snapshot written");
        }
    }

    Ok(())
}

fn run_command(registry: &ProblemRegistry, settings: &Settings, command: Command) -> Result<bool> {
    match command {
        Command::Seed => {
            let ids = seed_demo_problems(registry)?;
            println!("seeded {} demo problems", ids.len());
            Ok(true)
        }
        Command::List {
            status,
            category,
            priority,
            search,
            sort,
            ascending,
            json,
        } => {
            let query = ProblemQuery {
                filter: ProblemFilter {
                    status: status.as_deref().map(parse_status).transpose()?,
                    category: category.as_deref().map(parse_category).transpose()?,
                    priority: priority.as_deref().map(parse_priority).transpose()?,
                },
                sort_key: parse_sort_key(&sort)?,
                direction: if ascending {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                },
                search,
            };
            let records = registry.query(&query);
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    print_row(record);
                }
                println!("{} problem(s)", records.len());
            }
            Ok(false)
        }
        Command::Report {
            title,
            location,
            description,
            category,
            priority,
            lat,
            lng,
            reported_by,
        } => {
            let record = registry.create(NewProblem {
                title,
                description,
                location,
                coordinates: Coordinates { lat, lng },
                category: parse_category(&category)?,
                priority: parse_priority(&priority)?,
                reported_by: reported_by.unwrap_or_else(|| settings.operator.clone()),
            })?;
            println!("registered problem {}", record.problem_id.0);
            Ok(true)
        }
        Command::Transition { id, status } => {
            let record = registry.transition_status(ProblemId(id), parse_status(&status)?)?;
            println!("problem {} is now {}", record.problem_id.0, status_label(record.status));
            Ok(true)
        }
        Command::Comment { id, text, author } => {
            let author = author.unwrap_or_else(|| settings.operator.clone());
            let record = registry.add_comment(ProblemId(id), author, text)?;
            println!(
                "problem {} has {} comment(s)",
                record.problem_id.0,
                record.comments.len()
            );
            Ok(true)
        }
        Command::Upvote { id } => {
            let record = registry.upvote(ProblemId(id))?;
            println!("problem {} has {} upvote(s)", record.problem_id.0, record.upvote_count);
            Ok(true)
        }
        Command::Summary { json } => {
            let summary = DashboardSummary::from_records(&registry.snapshot());
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "total {} | pending {} | in progress {} | resolved {} ({}%)",
                    summary.total,
                    summary.pending,
                    summary.in_progress,
                    summary.resolved,
                    summary.resolution_rate_percent
                );
                for bucket in &summary.by_category {
                    println!("  {:12} {}", format!("{:?}", bucket.category).to_lowercase(), bucket.count);
                }
                if let Some(top) = &summary.most_upvoted {
                    println!("most upvoted: {} ({} votes)", top.title, top.upvote_count);
                }
            }
            Ok(false)
        }
    }
}

fn print_row(record: &ProblemRecord) {
    println!(
        "{}  {:11} {:6} {:>4}  {} ({})",
        record.problem_id.0,
        status_label(record.status),
        priority_label(record.priority),
        record.upvote_count,
        record.title,
        record.location,
    );
}

fn load_snapshot(path: &Path) -> Result<ProblemRegistry> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot '{}'", path.display()))?;
    let records: Vec<ProblemRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("snapshot '{}' is not valid board JSON", path.display()))?;
    Ok(ProblemRegistry::restore(records)?)
}

fn persist_snapshot(registry: &ProblemRegistry, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create snapshot directory '{}'", parent.display())
            })?;
        }
    }
    let raw = serde_json::to_string_pretty(&registry.snapshot())?;
    fs::write(path, raw)
        .with_context(|| format!("failed to write snapshot '{}'", path.display()))?;
    Ok(())
}

fn parse_status(raw: &str) -> Result<Status> {
    if raw.eq_ignore_ascii_case("pending") {
        Ok(Status::Pending)
    } else if raw.eq_ignore_ascii_case("in-progress") || raw.eq_ignore_ascii_case("in_progress") {
        Ok(Status::InProgress)
    } else if raw.eq_ignore_ascii_case("resolved") {
        Ok(Status::Resolved)
    } else {
        bail!("unknown status '{raw}' (expected pending, in-progress, or resolved)")
    }
}

fn parse_category(raw: &str) -> Result<Category> {
    if raw.eq_ignore_ascii_case("pothole") {
        Ok(Category::Pothole)
    } else if raw.eq_ignore_ascii_case("streetlight") {
        Ok(Category::Streetlight)
    } else if raw.eq_ignore_ascii_case("garbage") {
        Ok(Category::Garbage)
    } else if raw.eq_ignore_ascii_case("water") {
        Ok(Category::Water)
    } else if raw.eq_ignore_ascii_case("other") {
        Ok(Category::Other)
    } else {
        bail!("unknown category '{raw}'")
    }
}

fn parse_priority(raw: &str) -> Result<Priority> {
    if raw.eq_ignore_ascii_case("low") {
        Ok(Priority::Low)
    } else if raw.eq_ignore_ascii_case("medium") {
        Ok(Priority::Medium)
    } else if raw.eq_ignore_ascii_case("high") {
        Ok(Priority::High)
    } else {
        bail!("unknown priority '{raw}'")
    }
}

fn parse_sort_key(raw: &str) -> Result<SortKey> {
    if raw.eq_ignore_ascii_case("reported-at") || raw.eq_ignore_ascii_case("date") {
        Ok(SortKey::ReportedAt)
    } else if raw.eq_ignore_ascii_case("upvotes") {
        Ok(SortKey::UpvoteCount)
    } else if raw.eq_ignore_ascii_case("status") {
        Ok(SortKey::Status)
    } else {
        bail!("unknown sort key '{raw}' (expected reported-at, upvotes, or status)")
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Pending => "pending",
        Status::InProgress => "in-progress",
        Status::Resolved => "resolved",
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    }
}
