use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use skola_course::{Course, CourseDraft, CoursePatch, Instructor, Tag, COURSE_ENTITY};
use skola_core::repository::{ApplyOutcome, CourseRepository};
use skola_shared::{event_type, EventAction};

use crate::database::record_event;

pub struct StoreCourseRepository {
    pool: PgPool,
}

impl StoreCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct CourseRow {
    id: i64,
    title: String,
    description: String,
    category: String,
    enrollment_limit: i32,
    parent_course_id: Option<i64>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
struct InstructorRow {
    id: i64,
    name: String,
    email: String,
    biography: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            enrollment_limit: row.enrollment_limit,
            parent_course_id: row.parent_course_id,
            instructors: Vec::new(),
            tags: Vec::new(),
            sub_courses: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COURSE: &str = "SELECT id, title, description, category, enrollment_limit, parent_course_id, created_at, updated_at FROM courses";

impl StoreCourseRepository {
    /// Resolves instructors, tags and (for root courses) one level of
    /// sub-courses. Sub-courses come back as bare rows.
    async fn hydrate(&self, row: CourseRow, with_children: bool) -> Result<Course, sqlx::Error> {
        let mut course = Course::from(row);

        let instructors = sqlx::query_as::<_, InstructorRow>(
            r#"
            SELECT i.id, i.name, i.email, i.biography, i.created_at, i.updated_at
            FROM instructors i
            JOIN course_instructors ci ON ci.instructor_id = i.id
            WHERE ci.course_id = $1
            ORDER BY i.id
            "#,
        )
        .bind(course.id)
        .fetch_all(&self.pool)
        .await?;

        course.instructors = instructors
            .into_iter()
            .map(|i| Instructor {
                id: i.id,
                name: i.name,
                email: i.email,
                biography: i.biography,
                created_at: i.created_at,
                updated_at: i.updated_at,
            })
            .collect();

        let tags = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT t.id, t.name, t.created_at, t.updated_at
            FROM tags t
            JOIN course_tags ct ON ct.tag_id = t.id
            WHERE ct.course_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(course.id)
        .fetch_all(&self.pool)
        .await?;

        course.tags = tags
            .into_iter()
            .map(|t| Tag {
                id: t.id,
                name: t.name,
                created_at: t.created_at,
                updated_at: t.updated_at,
            })
            .collect();

        if with_children {
            let children = sqlx::query_as::<_, CourseRow>(&format!(
                "{} WHERE parent_course_id = $1 ORDER BY id",
                SELECT_COURSE
            ))
            .bind(course.id)
            .fetch_all(&self.pool)
            .await?;

            course.sub_courses = children.into_iter().map(Course::from).collect();
        }

        Ok(course)
    }

    /// Replaces the instructor links of a course with the given set.
    async fn replace_instructors(
        tx: &mut Transaction<'_, Postgres>,
        course_id: i64,
        instructor_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM course_instructors WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut **tx)
            .await?;

        for instructor_id in instructor_ids {
            sqlx::query(
                "INSERT INTO course_instructors (course_id, instructor_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(course_id)
            .bind(instructor_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Replaces the tag links of a course. Tags are keyed by name and created
    /// on first use.
    async fn replace_tags(
        tx: &mut Transaction<'_, Postgres>,
        course_id: i64,
        names: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM course_tags WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut **tx)
            .await?;

        for name in names {
            let tag_id: i64 = sqlx::query_scalar(
                "INSERT INTO tags (name) VALUES ($1) ON CONFLICT (name) DO UPDATE SET updated_at = now() RETURNING id",
            )
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;

            sqlx::query(
                "INSERT INTO course_tags (course_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(course_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl CourseRepository for StoreCourseRepository {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &CourseDraft,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(&mut tx, event_id, &event_type(COURSE_ENTITY, EventAction::Created))
            .await?
        {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO courses (title, description, category, enrollment_limit, parent_course_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(draft.enrollment_limit)
        .bind(draft.parent_course_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_instructors(&mut tx, id, &draft.instructor_ids).await?;
        Self::replace_tags(&mut tx, id, &draft.tags).await?;

        tx.commit().await?;

        Ok(ApplyOutcome::Applied { id })
    }

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &CoursePatch,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        if !record_event(&mut tx, event_id, &event_type(COURSE_ENTITY, EventAction::Updated))
            .await?
        {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        let result = sqlx::query(
            r#"
            UPDATE courses SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                category = COALESCE($3, category),
                enrollment_limit = COALESCE($4, enrollment_limit),
                parent_course_id = COALESCE($5, parent_course_id),
                updated_at = now()
            WHERE id = $6
            "#,
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.category)
        .bind(patch.enrollment_limit)
        .bind(patch.parent_course_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.commit().await?;
            return Ok(ApplyOutcome::Missing);
        }

        // Join-set fields replace the whole set when present.
        if let Some(instructor_ids) = &patch.instructor_ids {
            Self::replace_instructors(&mut tx, id, instructor_ids).await?;
        }
        if let Some(tags) = &patch.tags {
            Self::replace_tags(&mut tx, id, tags).await?;
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

        if !record_event(&mut tx, event_id, &event_type(COURSE_ENTITY, EventAction::Deleted))
            .await?
        {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        // Join rows cascade; sub-courses fall back to roots.
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Ok(ApplyOutcome::Missing);
        }
        Ok(ApplyOutcome::Applied { id })
    }

    async fn list(&self) -> Result<Vec<Course>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, CourseRow>(&format!(
            "{} WHERE parent_course_id IS NULL ORDER BY id",
            SELECT_COURSE
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut courses = Vec::new();
        for row in rows {
            courses.push(self.hydrate(row, true).await?);
        }
        Ok(courses)
    }

    async fn get(
        &self,
        id: i64,
    ) -> Result<Option<Course>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, CourseRow>(&format!("{} WHERE id = $1", SELECT_COURSE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row, true).await?)),
            None => Ok(None),
        }
    }
}
