use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use skola_course::{Instructor, InstructorDraft, InstructorPatch, INSTRUCTOR_ENTITY};
use skola_core::repository::{ApplyOutcome, InstructorRepository};
use skola_shared::{event_type, EventAction};

use crate::database::record_event;

pub struct StoreInstructorRepository {
    pool: PgPool,
}

impl StoreInstructorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct InstructorRow {
    id: i64,
    name: String,
    email: String,
    biography: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<InstructorRow> for Instructor {
    fn from(row: InstructorRow) -> Self {
        Instructor {
            id: row.id,
            name: row.name,
            email: row.email,
            biography: row.biography,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_INSTRUCTOR: &str =
    "SELECT id, name, email, biography, created_at, updated_at FROM instructors";

#[async_trait]
impl InstructorRepository for StoreInstructorRepository {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &InstructorDraft,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(
            &mut tx,
            event_id,
            &event_type(INSTRUCTOR_ENTITY, EventAction::Created),
        )
        .await?
        {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        // The unique email constraint surfaces here as an apply failure.
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO instructors (name, email, biography) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.biography)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ApplyOutcome::Applied { id })
    }

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &InstructorPatch,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(
            &mut tx,
            event_id,
            &event_type(INSTRUCTOR_ENTITY, EventAction::Updated),
        )
        .await?
        {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        let result = sqlx::query(
            r#"
            UPDATE instructors SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                biography = COALESCE($3, biography),
                updated_at = now()
            WHERE id = $4
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(&patch.biography)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Ok(ApplyOutcome::Missing);
        }
        Ok(ApplyOutcome::Applied { id })
    }

    async fn delete(
        &self,
        event_id: Uuid,
        id: i64,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(
            &mut tx,
            event_id,
            &event_type(INSTRUCTOR_ENTITY, EventAction::Deleted),
        )
        .await?
        {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        let result = sqlx::query("DELETE FROM instructors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Ok(ApplyOutcome::Missing);
        }
        Ok(ApplyOutcome::Applied { id })
    }

    async fn list(&self) -> Result<Vec<Instructor>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, InstructorRow>(&format!("{} ORDER BY id", SELECT_INSTRUCTOR))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Instructor::from).collect())
    }

    async fn get(
        &self,
        id: i64,
    ) -> Result<Option<Instructor>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, InstructorRow>(&format!("{} WHERE id = $1", SELECT_INSTRUCTOR))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Instructor::from))
    }
}
