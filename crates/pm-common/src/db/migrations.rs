use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::{DbPoolError, PgPool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to build pool: {0}")]
    PoolBuild(#[from] DbPoolError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    id: 1,
    description: "podmatch base schema: courses, users, swipes, pods, presence, explanations",
    sql: r#"
CREATE TABLE IF NOT EXISTS pm.courses (
    course_code TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS pm.users (
    user_id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    role_prefs TEXT[] NOT NULL DEFAULT '{}',
    skills TEXT[] NOT NULL DEFAULT '{}',
    availability TEXT[] NOT NULL DEFAULT '{}',
    course_codes TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_users_course_codes
    ON pm.users USING GIN (course_codes);

CREATE TABLE IF NOT EXISTS pm.swipes (
    from_user TEXT NOT NULL,
    to_user TEXT NOT NULL,
    course_code TEXT NOT NULL,
    decision TEXT NOT NULL CHECK (decision IN ('accept', 'pass')),
    decided_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (from_user, to_user, course_code)
);

CREATE INDEX IF NOT EXISTS idx_swipes_mutual_lookup
    ON pm.swipes (to_user, course_code) WHERE decision = 'accept';

CREATE TABLE IF NOT EXISTS pm.pods (
    pod_id TEXT PRIMARY KEY,
    course_code TEXT NOT NULL,
    leader_id TEXT NOT NULL,
    member_ids TEXT[] NOT NULL,
    hub_link TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT chk_pod_capacity CHECK (cardinality(member_ids) BETWEEN 1 AND 4)
);

CREATE INDEX IF NOT EXISTS idx_pods_members
    ON pm.pods USING GIN (member_ids);

CREATE TABLE IF NOT EXISTS pm.presence (
    user_id TEXT NOT NULL,
    course_code TEXT NOT NULL,
    last_seen_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (user_id, course_code)
);

CREATE TABLE IF NOT EXISTS pm.explanations (
    cache_key TEXT PRIMARY KEY,
    viewer_id TEXT NOT NULL,
    candidate_id TEXT NOT NULL,
    mode TEXT NOT NULL,
    prompt_version TEXT NOT NULL,
    body JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#,
}];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS pm;
             CREATE TABLE IF NOT EXISTS pm.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM pm.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO pm.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
