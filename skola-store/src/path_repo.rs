use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use skola_core::repository::{ApplyOutcome, CoursePathRepository};
use skola_path::{CoursePath, CoursePathDraft, CoursePathPatch, PathStep, ENTITY};
use skola_shared::{event_type, EventAction};

use crate::database::record_event;

pub struct StoreCoursePathRepository {
    pool: PgPool,
}

impl StoreCoursePathRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct PathRow {
    id: i64,
    title: String,
    description: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
struct StepRow {
    course_id: i64,
    position: i32,
    mandatory: bool,
}

const SELECT_PATH: &str = "SELECT id, title, description, created_at, updated_at FROM course_paths";

impl StoreCoursePathRepository {
    async fn load_steps(&self, path_id: i64) -> Result<Vec<PathStep>, sqlx::Error> {
        let rows = sqlx::query_as::<_, StepRow>(
            "SELECT course_id, position, mandatory FROM course_path_steps WHERE course_path_id = $1 ORDER BY position",
        )
        .bind(path_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|s| PathStep {
                course_id: s.course_id,
                position: s.position,
                mandatory: s.mandatory,
            })
            .collect())
    }

    /// Replaces the step sequence. A step naming a nonexistent course fails
    /// the foreign key and rolls the whole event back.
    async fn replace_steps(
        tx: &mut Transaction<'_, Postgres>,
        path_id: i64,
        steps: &[PathStep],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM course_path_steps WHERE course_path_id = $1")
            .bind(path_id)
            .execute(&mut **tx)
            .await?;

        for step in steps {
            sqlx::query(
                r#"
                INSERT INTO course_path_steps (course_path_id, course_id, position, mandatory)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (course_path_id, course_id) DO NOTHING
                "#,
            )
            .bind(path_id)
            .bind(step.course_id)
            .bind(step.position)
            .bind(step.mandatory)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl CoursePathRepository for StoreCoursePathRepository {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &CoursePathDraft,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(&mut tx, event_id, &event_type(ENTITY, EventAction::Created)).await? {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO course_paths (title, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_steps(&mut tx, id, &draft.steps).await?;

        tx.commit().await?;

        Ok(ApplyOutcome::Applied { id })
    }

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &CoursePathPatch,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(&mut tx, event_id, &event_type(ENTITY, EventAction::Updated)).await? {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        let result = sqlx::query(
            r#"
            UPDATE course_paths SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                updated_at = now()
            WHERE id = $3
            "#,
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.commit().await?;
            return Ok(ApplyOutcome::Missing);
        }

        if let Some(steps) = &patch.steps {
            Self::replace_steps(&mut tx, id, steps).await?;
        }

        tx.commit().await?;

        Ok(ApplyOutcome::Applied { id })
    }

    async fn delete(
        &self,
        event_id: Uuid,
        id: i64,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(&mut tx, event_id, &event_type(ENTITY, EventAction::Deleted)).await? {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        // Steps cascade with the path.
        let result = sqlx::query("DELETE FROM course_paths WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Ok(ApplyOutcome::Missing);
        }
        Ok(ApplyOutcome::Applied { id })
    }

    async fn list(&self) -> Result<Vec<CoursePath>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, PathRow>(&format!("{} ORDER BY id", SELECT_PATH))
            .fetch_all(&self.pool)
            .await?;

        let mut paths = Vec::new();
        for row in rows {
            let steps = self.load_steps(row.id).await?;
            paths.push(CoursePath {
                id: row.id,
                title: row.title,
                description: row.description,
                steps,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }
        Ok(paths)
    }

    async fn get(
        &self,
        id: i64,
    ) -> Result<Option<CoursePath>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, PathRow>(&format!("{} WHERE id = $1", SELECT_PATH))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let steps = self.load_steps(row.id).await?;
        Ok(Some(CoursePath {
            id: row.id,
            title: row.title,
            description: row.description,
            steps,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}
