//! Demo-data seeder: one course and three students with staggered
//! presence, enough to exercise the feed end to end. Idempotent; safe
//! to re-run against an existing database.

use chrono::{Duration, Utc};
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

use pm_common::db::{
    CourseRecord, ProfileUpdate, create_pool_from_url_checked, create_user, record_heartbeat,
    run_migrations, upsert_course, upsert_profile,
};
use pm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use pm_common::run_id;

const DEMO_COURSE: &str = "CS471";

#[derive(Debug, Clone, Parser)]
#[command(name = "pm-seed", about = "Seed podmatch with a demo course and users")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

struct DemoUser {
    user_id: &'static str,
    display_name: &'static str,
    role_prefs: &'static [&'static str],
    skills: &'static [&'static str],
    availability: &'static [&'static str],
    last_seen_hours_ago: i64,
}

// Fixed ids keep re-runs updating the same rows.
const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        user_id: "demo-ava",
        display_name: "Ava",
        role_prefs: &["Backend", "Platform"],
        skills: &["Python", "FastAPI", "Docker"],
        availability: &["Mon evening", "Wed evening", "Sat afternoon"],
        last_seen_hours_ago: 1,
    },
    DemoUser {
        user_id: "demo-noah",
        display_name: "Noah",
        role_prefs: &["Matching"],
        skills: &["Python", "ML", "Data"],
        availability: &["Tue evening", "Wed evening", "Sun morning"],
        last_seen_hours_ago: 50,
    },
    DemoUser {
        user_id: "demo-mia",
        display_name: "Mia",
        role_prefs: &["Platform", "Backend"],
        skills: &["Docker", "AWS", "Testing"],
        availability: &["Mon evening", "Thu night"],
        last_seen_hours_ago: 200,
    },
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let pool = create_pool_from_url_checked(&cli.database_url).await?;
    run_migrations(&pool).await?;

    info!(run_id = run_id::get(), "seeding demo data");

    upsert_course(
        &pool,
        &CourseRecord {
            course_code: DEMO_COURSE.into(),
            title: "Software Engineering Studio".into(),
            description: "Teams of up to four build and ship a product across the term. \
                          Grading is based on milestone demos, peer feedback, and a final \
                          presentation. No exams."
                .into(),
        },
    )
    .await?;

    let now = Utc::now();
    for demo in DEMO_USERS {
        create_user(&pool, demo.user_id, demo.display_name).await?;
        upsert_profile(
            &pool,
            demo.user_id,
            &ProfileUpdate {
                display_name: None,
                role_prefs: Some(strings(demo.role_prefs)),
                skills: Some(strings(demo.skills)),
                availability: Some(strings(demo.availability)),
                course_code: Some(DEMO_COURSE.into()),
            },
        )
        .await?;
        record_heartbeat(
            &pool,
            demo.user_id,
            DEMO_COURSE,
            now - Duration::hours(demo.last_seen_hours_ago),
        )
        .await?;

        info!(user_id = demo.user_id, "seeded demo user");
    }

    info!(course = DEMO_COURSE, users = DEMO_USERS.len(), "seed complete");
    Ok(())
}
