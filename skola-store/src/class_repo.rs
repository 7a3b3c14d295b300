use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use skola_class::{Class, ClassDraft, ClassPatch, ENTITY};
use skola_core::repository::{ApplyOutcome, ClassRepository};
use skola_shared::{event_type, EventAction};

use crate::database::record_event;

pub struct StoreClassRepository {
    pool: PgPool,
}

impl StoreClassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ClassRow {
    id: i64,
    title: String,
    description: String,
    company_id: i64,
    course_id: i64,
    instructor_id: i64,
    class_type_id: Option<i64>,
    scheduled_at: chrono::DateTime<chrono::Utc>,
    duration_minutes: i32,
    max_participants: i32,
    current_enrolled: i32,
    waitlist_enabled: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ClassRow> for Class {
    fn from(row: ClassRow) -> Self {
        Class {
            id: row.id,
            title: row.title,
            description: row.description,
            company_id: row.company_id,
            course_id: row.course_id,
            instructor_id: row.instructor_id,
            class_type_id: row.class_type_id,
            scheduled_at: row.scheduled_at,
            duration_minutes: row.duration_minutes,
            max_participants: row.max_participants,
            current_enrolled: row.current_enrolled,
            waitlist_enabled: row.waitlist_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_CLASS: &str = "SELECT id, title, description, company_id, course_id, instructor_id, class_type_id, scheduled_at, duration_minutes, max_participants, current_enrolled, waitlist_enabled, created_at, updated_at FROM classes";

#[async_trait]
impl ClassRepository for StoreClassRepository {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &ClassDraft,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(&mut tx, event_id, &event_type(ENTITY, EventAction::Created)).await? {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO classes (title, description, company_id, course_id, instructor_id, class_type_id, scheduled_at, duration_minutes, max_participants, current_enrolled, waitlist_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.company_id)
        .bind(draft.course_id)
        .bind(draft.instructor_id)
        .bind(draft.class_type_id)
        .bind(draft.scheduled_at)
        .bind(draft.duration_minutes)
        .bind(draft.max_participants)
        .bind(draft.current_enrolled)
        .bind(draft.waitlist_enabled)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ApplyOutcome::Applied { id })
    }

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &ClassPatch,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(&mut tx, event_id, &event_type(ENTITY, EventAction::Updated)).await? {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        // Field mask: NULL binds fall through to the current column value.
        let result = sqlx::query(
            r#"
            UPDATE classes SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                company_id = COALESCE($3, company_id),
                course_id = COALESCE($4, course_id),
                instructor_id = COALESCE($5, instructor_id),
                class_type_id = COALESCE($6, class_type_id),
                scheduled_at = COALESCE($7, scheduled_at),
                duration_minutes = COALESCE($8, duration_minutes),
                max_participants = COALESCE($9, max_participants),
                current_enrolled = COALESCE($10, current_enrolled),
                waitlist_enabled = COALESCE($11, waitlist_enabled),
                updated_at = now()
            WHERE id = $12
            "#,
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.company_id)
        .bind(patch.course_id)
        .bind(patch.instructor_id)
        .bind(patch.class_type_id)
        .bind(patch.scheduled_at)
        .bind(patch.duration_minutes)
        .bind(patch.max_participants)
        .bind(patch.current_enrolled)
        .bind(patch.waitlist_enabled)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // The event id stays recorded even when the target is gone, so a
        // redelivery does not retry a row that will never exist.
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

        if !record_event(&mut tx, event_id, &event_type(ENTITY, EventAction::Deleted)).await? {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Ok(ApplyOutcome::Missing);
        }
        Ok(ApplyOutcome::Applied { id })
    }

    async fn list(&self) -> Result<Vec<Class>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, ClassRow>(&format!("{} ORDER BY id", SELECT_CLASS))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Class::from).collect())
    }

    async fn get(
        &self,
        id: i64,
    ) -> Result<Option<Class>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, ClassRow>(&format!("{} WHERE id = $1", SELECT_CLASS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Class::from))
    }
}
