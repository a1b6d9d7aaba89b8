use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum CourseStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseRecord {
    pub course_code: String,
    pub title: String,
    pub description: String,
}

#[instrument(skip(pool))]
pub async fn get_course(
    pool: &PgPool,
    course_code: &str,
) -> Result<Option<CourseRecord>, CourseStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "SELECT course_code, title, description FROM pm.courses WHERE course_code = $1",
        )
        .await?;

    let row = client.query_opt(&stmt, &[&course_code]).await?;

    Ok(row.map(|row| CourseRecord {
        course_code: row.get("course_code"),
        title: row.get("title"),
        description: row.get("description"),
    }))
}

#[instrument(skip(pool, course))]
pub async fn upsert_course(pool: &PgPool, course: &CourseRecord) -> Result<(), CourseStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "INSERT INTO pm.courses (course_code, title, description)\
             VALUES ($1, $2, $3)\
             ON CONFLICT (course_code) DO UPDATE\
             SET title = EXCLUDED.title,\
                 description = EXCLUDED.description",
        )
        .await?;

    client
        .execute(
            &stmt,
            &[&course.course_code, &course.title, &course.description],
        )
        .await?;

    Ok(())
}
