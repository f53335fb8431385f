//! `PostgreSQL` store.
//!
//! Queries are built at runtime with `query_as` and `QueryBuilder` and decoded
//! into row structs, which are then validated into domain types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use campus_core::{CourseCode, CourseId, Email, EnrollmentId, Role, UserId};

use super::query::like_pattern;
use super::{CourseQuery, EnrollmentQuery, RepositoryError, Store, UserQuery};
use crate::models::{
    Course, CourseSummary, CourseUpdate, Enrollment, EnrollmentDetail, NewCourse, NewEnrollment,
    NewUser, StudentSummary, TeacherSummary, User, UserUpdate,
};

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";
const COURSE_COLUMNS: &str =
    "id, name, description, teacher_id, date, code, created_at, updated_at";
const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: parse_email(&row.email)?,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: CourseId,
    name: String,
    description: String,
    teacher_id: UserId,
    date: DateTime<Utc>,
    code: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CourseRow> for Course {
    type Error = RepositoryError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            teacher_id: row.teacher_id,
            date: row.date,
            code: parse_code(row.code)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    id: EnrollmentId,
    student_id: UserId,
    course_id: CourseId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EnrollmentRow> for Enrollment {
    fn from(row: EnrollmentRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            course_id: row.course_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// One enrollment joined with its student, course and the course's teacher.
/// Joined columns are null when the referenced row is gone.
#[derive(sqlx::FromRow)]
struct EnrollmentDetailRow {
    id: EnrollmentId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    student_id: Option<UserId>,
    student_name: Option<String>,
    student_email: Option<String>,
    student_role: Option<Role>,
    course_id: Option<CourseId>,
    course_name: Option<String>,
    course_code: Option<i16>,
    course_date: Option<DateTime<Utc>>,
    teacher_id: Option<UserId>,
    teacher_name: Option<String>,
    teacher_email: Option<String>,
}

impl TryFrom<EnrollmentDetailRow> for EnrollmentDetail {
    type Error = RepositoryError;

    fn try_from(row: EnrollmentDetailRow) -> Result<Self, Self::Error> {
        let student = match (row.student_id, row.student_name, row.student_email, row.student_role)
        {
            (Some(id), Some(name), Some(email), Some(role)) => Some(StudentSummary {
                id,
                name,
                email: parse_email(&email)?,
                role,
            }),
            _ => None,
        };

        let teacher = match (row.teacher_id, row.teacher_name, row.teacher_email) {
            (Some(id), Some(name), Some(email)) => Some(TeacherSummary {
                id,
                name,
                email: parse_email(&email)?,
            }),
            _ => None,
        };

        let course = match (row.course_id, row.course_name, row.course_code, row.course_date) {
            (Some(id), Some(name), Some(code), Some(date)) => Some(CourseSummary {
                id,
                name,
                code: parse_code(code)?,
                date,
                teacher,
            }),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            student,
            course,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

fn parse_code(raw: i16) -> Result<CourseCode, RepositoryError> {
    CourseCode::new(i64::from(raw))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid course code in database: {e}")))
}

/// Map a unique violation to `Conflict`, everything else to `Database`.
fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &UserQuery) {
    builder.push(" WHERE TRUE");
    if let Some(id) = query.id {
        builder.push(" AND id = ").push_bind(id);
    }
    if let Some(email) = &query.email {
        builder.push(" AND email = ").push_bind(email.as_str().to_owned());
    }
    if let Some(fragment) = &query.name_contains {
        builder
            .push(" AND name ILIKE ")
            .push_bind(like_pattern(fragment));
    }
    if let Some(role) = query.role {
        builder.push(" AND role = ").push_bind(role);
    }
}

fn push_course_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &CourseQuery) {
    builder.push(" WHERE TRUE");
    if let Some(id) = query.id {
        builder.push(" AND id = ").push_bind(id);
    }
    if let Some(code) = query.code {
        builder.push(" AND code = ").push_bind(code.get());
    }
    if let Some(name) = &query.name_eq {
        builder
            .push(" AND lower(name) = lower(")
            .push_bind(name.clone())
            .push(")");
    }
    if let Some(teacher) = query.teacher {
        builder.push(" AND teacher_id = ").push_bind(teacher);
    }
}

fn push_enrollment_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &EnrollmentQuery,
    alias: &str,
) {
    builder.push(" WHERE TRUE");
    if let Some(student) = query.student {
        builder
            .push(format_args!(" AND {alias}.student_id = "))
            .push_bind(student);
    }
    if let Some(course) = query.course {
        builder
            .push(format_args!(" AND {alias}.course_id = "))
            .push_bind(course);
    }
    if let Some(set) = &query.course_in {
        builder
            .push(format_args!(" AND {alias}.course_id = ANY("))
            .push_bind(set.clone())
            .push(")");
    }
}

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, shared with the session store.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.find_user(&UserQuery {
            id: Some(id),
            ..UserQuery::default()
        })
        .await
    }

    async fn find_user(&self, query: &UserQuery) -> Result<Option<User>, RepositoryError> {
        let mut builder = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM campus.users"));
        push_user_filters(&mut builder, query);
        builder.push(" ORDER BY created_at, id LIMIT 1");

        let row = builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_users(&self, query: &UserQuery) -> Result<Vec<User>, RepositoryError> {
        let mut builder = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM campus.users"));
        push_user_filters(&mut builder, query);
        builder.push(" ORDER BY created_at, id");

        let rows = builder
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn credentials(&self, email: &Email) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM campus.users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO campus.users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(UserId::generate())
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        User::try_from(row)
    }

    async fn update_user(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE campus.users SET updated_at = now()");
        if let Some(name) = update.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(email) = update.email {
            builder.push(", email = ").push_bind(email.into_inner());
        }
        if let Some(hash) = update.password_hash {
            builder.push(", password_hash = ").push_bind(hash);
        }
        if let Some(role) = update.role {
            builder.push(", role = ").push_bind(role);
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format_args!(" RETURNING {USER_COLUMNS}"));

        let row = builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "email already exists"))?;
        row.map(User::try_from).transpose()
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM campus.users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn course_by_id(&self, id: CourseId) -> Result<Option<Course>, RepositoryError> {
        self.find_course(&CourseQuery {
            id: Some(id),
            ..CourseQuery::default()
        })
        .await
    }

    async fn find_course(&self, query: &CourseQuery) -> Result<Option<Course>, RepositoryError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM campus.courses"));
        push_course_filters(&mut builder, query);
        builder.push(" ORDER BY created_at, id LIMIT 1");

        let row = builder
            .build_query_as::<CourseRow>()
            .fetch_optional(&self.pool)
            .await?;
        row.map(Course::try_from).transpose()
    }

    async fn find_courses(&self, query: &CourseQuery) -> Result<Vec<Course>, RepositoryError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM campus.courses"));
        push_course_filters(&mut builder, query);
        builder.push(" ORDER BY created_at, id");

        let rows = builder
            .build_query_as::<CourseRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Course::try_from).collect()
    }

    async fn insert_course(&self, course: NewCourse) -> Result<Course, RepositoryError> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            r"
            INSERT INTO campus.courses (id, name, description, teacher_id, date, code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COURSE_COLUMNS}
            "
        ))
        .bind(CourseId::generate())
        .bind(&course.name)
        .bind(&course.description)
        .bind(course.teacher_id)
        .bind(course.date)
        .bind(course.code.get())
        .fetch_one(&self.pool)
        .await?;

        Course::try_from(row)
    }

    async fn update_course(
        &self,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Option<Course>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE campus.courses SET updated_at = now()");
        if let Some(name) = update.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(description) = update.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(teacher_id) = update.teacher_id {
            builder.push(", teacher_id = ").push_bind(teacher_id);
        }
        if let Some(date) = update.date {
            builder.push(", date = ").push_bind(date);
        }
        if let Some(code) = update.code {
            builder.push(", code = ").push_bind(code.get());
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format_args!(" RETURNING {COURSE_COLUMNS}"));

        let row = builder
            .build_query_as::<CourseRow>()
            .fetch_optional(&self.pool)
            .await?;
        row.map(Course::try_from).transpose()
    }

    async fn delete_course(&self, id: CourseId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM campus.courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_enrollment(
        &self,
        student: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM campus.enrollments
             WHERE student_id = $1 AND course_id = $2"
        ))
        .bind(student)
        .bind(course)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Enrollment::from))
    }

    async fn enrollment_details(
        &self,
        query: &EnrollmentQuery,
    ) -> Result<Vec<EnrollmentDetail>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            r"
            SELECT e.id, e.created_at, e.updated_at,
                   s.id AS student_id, s.name AS student_name,
                   s.email AS student_email, s.role AS student_role,
                   c.id AS course_id, c.name AS course_name,
                   c.code AS course_code, c.date AS course_date,
                   t.id AS teacher_id, t.name AS teacher_name, t.email AS teacher_email
            FROM campus.enrollments e
            LEFT JOIN campus.users s ON s.id = e.student_id
            LEFT JOIN campus.courses c ON c.id = e.course_id
            LEFT JOIN campus.users t ON t.id = c.teacher_id
            ",
        );
        push_enrollment_filters(&mut builder, query, "e");
        builder.push(" ORDER BY e.created_at, e.id");

        let rows = builder
            .build_query_as::<EnrollmentDetailRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(EnrollmentDetail::try_from).collect()
    }

    async fn count_enrollments(&self, query: &EnrollmentQuery) -> Result<u64, RepositoryError> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT count(*) FROM campus.enrollments e");
        push_enrollment_filters(&mut builder, query, "e");

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(count)
            .map_err(|e| RepositoryError::DataCorruption(format!("negative count: {e}")))
    }

    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollment,
    ) -> Result<Enrollment, RepositoryError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            r"
            INSERT INTO campus.enrollments (id, student_id, course_id)
            VALUES ($1, $2, $3)
            RETURNING {ENROLLMENT_COLUMNS}
            "
        ))
        .bind(EnrollmentId::generate())
        .bind(enrollment.student_id)
        .bind(enrollment.course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, "enrollment (student_id, course_id) already exists")
        })?;

        Ok(Enrollment::from(row))
    }

    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM campus.enrollments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
