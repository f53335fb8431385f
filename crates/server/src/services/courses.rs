//! Course management.

use chrono::{DateTime, Utc};
use tracing::info;

use campus_core::{CourseCode, CourseId, Role, UserId};

use super::error::{ServiceError, ServiceResult};
use crate::db::{CourseQuery, EnrollmentQuery, Store};
use crate::models::{Course, CourseDetail, CourseStudent, CourseUpdate, NewCourse};

/// Course fields as received from a client. Creation requires all of them;
/// updates apply the ones present.
#[derive(Debug, Clone, Default)]
pub struct CourseInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub teacher: Option<String>,
    pub date: Option<String>,
    pub code: Option<i64>,
}

pub struct CourseService<'a> {
    store: &'a dyn Store,
}

impl<'a> CourseService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Courses with their teacher expanded, optionally only those taught by
    /// `teacher`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if `teacher` is not an identifier.
    pub async fn list(&self, teacher: Option<&str>) -> ServiceResult<Vec<CourseDetail>> {
        let query = match teacher {
            Some(raw) => CourseQuery::by_teacher(
                UserId::parse(raw)
                    .ok_or_else(|| ServiceError::Validation("invalid teacher id".to_owned()))?,
            ),
            None => CourseQuery::default(),
        };

        let courses = self.store.find_courses(&query).await?;
        let mut details = Vec::with_capacity(courses.len());
        for course in courses {
            details.push(self.detail(course).await?);
        }
        Ok(details)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed id and
    /// `ServiceError::NotFound` when the course does not exist.
    pub async fn get(&self, id: &str) -> ServiceResult<CourseDetail> {
        let course = self.existing(id).await?;
        self.detail(course).await
    }

    /// Students enrolled in a course, in enrollment order. Enrollments whose
    /// student was deleted are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed id and
    /// `ServiceError::NotFound` when the course does not exist.
    pub async fn students(&self, id: &str) -> ServiceResult<Vec<CourseStudent>> {
        let course = self.existing(id).await?;
        let enrollments = self
            .store
            .enrollment_details(&EnrollmentQuery::for_course(course.id))
            .await?;

        Ok(enrollments
            .into_iter()
            .filter_map(|e| {
                e.student.map(|student| CourseStudent {
                    enrollment_id: e.id,
                    enrolled_at: e.created_at,
                    student,
                })
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Validation` when a field is missing or invalid,
    /// or `teacher` is not a teacher's identifier.
    pub async fn create(&self, input: CourseInput) -> ServiceResult<Course> {
        let name = required_text(input.name, "name")?;
        let description = required_text(input.description, "description")?;
        let teacher_id = self
            .teacher(input.teacher.as_deref().ok_or_else(|| missing("teacher"))?)
            .await?;
        let date = parse_date(input.date.as_deref().ok_or_else(|| missing("date"))?)?;
        let code = parse_code(input.code.ok_or_else(|| missing("code"))?)?;

        let course = self
            .store
            .insert_course(NewCourse {
                name,
                description,
                teacher_id,
                date,
                code,
            })
            .await?;

        info!(course_id = %course.id, code = %course.code, "Course created");
        Ok(course)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed id or field and
    /// `ServiceError::NotFound` when the course does not exist.
    pub async fn update(&self, id: &str, input: CourseInput) -> ServiceResult<Course> {
        let id = parse_course_id(id)?;

        let mut update = CourseUpdate::default();
        if let Some(name) = input.name {
            update.name = Some(required_text(Some(name), "name")?);
        }
        if let Some(description) = input.description {
            update.description = Some(required_text(Some(description), "description")?);
        }
        if let Some(teacher) = input.teacher {
            update.teacher_id = Some(self.teacher(&teacher).await?);
        }
        if let Some(date) = input.date {
            update.date = Some(parse_date(&date)?);
        }
        if let Some(code) = input.code {
            update.code = Some(parse_code(code)?);
        }

        let course = self
            .store
            .update_course(id, update)
            .await?
            .ok_or_else(course_not_found)?;

        info!(course_id = %course.id, "Course updated");
        Ok(course)
    }

    /// Delete a course. Its enrollments are kept.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed id and
    /// `ServiceError::NotFound` when the course does not exist.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let id = parse_course_id(id)?;
        if !self.store.delete_course(id).await? {
            return Err(course_not_found());
        }

        info!(course_id = %id, "Course deleted");
        Ok(())
    }

    async fn existing(&self, id: &str) -> ServiceResult<Course> {
        let id = parse_course_id(id)?;
        self.store
            .course_by_id(id)
            .await?
            .ok_or_else(course_not_found)
    }

    async fn detail(&self, course: Course) -> ServiceResult<CourseDetail> {
        let teacher = self.store.user_by_id(course.teacher_id).await?;
        let enrolled = self
            .store
            .count_enrollments(&EnrollmentQuery::for_course(course.id))
            .await?;
        Ok(CourseDetail::new(course, teacher.as_ref(), enrolled))
    }

    /// The id of an existing teacher-role user.
    async fn teacher(&self, raw: &str) -> ServiceResult<UserId> {
        let id = UserId::parse(raw)
            .ok_or_else(|| ServiceError::Validation("invalid teacher id".to_owned()))?;
        match self.store.user_by_id(id).await? {
            Some(user) if user.role == Role::Teacher => Ok(user.id),
            _ => Err(ServiceError::Validation("teacher not found".to_owned())),
        }
    }
}

fn missing(field: &str) -> ServiceError {
    ServiceError::Validation(format!("{field} is required"))
}

fn course_not_found() -> ServiceError {
    ServiceError::NotFound("course not found".to_owned())
}

fn required_text(value: Option<String>, field: &str) -> ServiceResult<String> {
    let value = value.ok_or_else(|| missing(field))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(missing(field));
    }
    Ok(trimmed.to_owned())
}

fn parse_course_id(raw: &str) -> ServiceResult<CourseId> {
    CourseId::parse(raw).ok_or_else(|| ServiceError::Validation("invalid id".to_owned()))
}

fn parse_date(raw: &str) -> ServiceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| ServiceError::Validation("date must be an RFC 3339 timestamp".to_owned()))
}

fn parse_code(raw: i64) -> ServiceResult<CourseCode> {
    CourseCode::new(raw).map_err(|e| ServiceError::Validation(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewEnrollment;
    use crate::testing::{seed_course, seed_user};

    fn input(teacher: UserId, code: i64) -> CourseInput {
        CourseInput {
            name: Some("Algebra".to_owned()),
            description: Some("Linear algebra".to_owned()),
            teacher: Some(teacher.to_string()),
            date: Some("2026-03-02T09:00:00Z".to_owned()),
            code: Some(code),
        }
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let store = MemoryStore::new();
        let teacher = seed_user(&store, "Marta Ruiz", "marta@x.com", Role::Teacher).await;
        let student = seed_user(&store, "Ana Gomez", "ana@x.com", Role::Student).await;
        let service = CourseService::new(&store);

        let course = service.create(input(teacher.id, 7)).await.unwrap();
        assert_eq!(course.code.get(), 7);
        assert_eq!(course.teacher_id, teacher.id);

        for code in [0, 16, -1] {
            assert!(matches!(
                service.create(input(teacher.id, code)).await,
                Err(ServiceError::Validation(_))
            ));
        }

        let not_teacher = service.create(input(student.id, 7)).await;
        assert!(matches!(not_teacher, Err(ServiceError::Validation(m)) if m == "teacher not found"));

        let mut bad_date = input(teacher.id, 7);
        bad_date.date = Some("next tuesday".to_owned());
        assert!(service.create(bad_date).await.is_err());

        let mut blank_name = input(teacher.id, 7);
        blank_name.name = Some("   ".to_owned());
        assert!(matches!(
            service.create(blank_name).await,
            Err(ServiceError::Validation(m)) if m == "name is required"
        ));
    }

    #[tokio::test]
    async fn test_list_and_get_expand_teacher() {
        let store = MemoryStore::new();
        let marta = seed_user(&store, "Marta Ruiz", "marta@x.com", Role::Teacher).await;
        let pablo = seed_user(&store, "Pablo Diaz", "pablo@x.com", Role::Teacher).await;
        let algebra = seed_course(&store, "Algebra", 7, marta.id).await;
        seed_course(&store, "History", 3, pablo.id).await;
        let service = CourseService::new(&store);

        assert_eq!(service.list(None).await.unwrap().len(), 2);

        let marta_courses = service
            .list(Some(&marta.id.to_string()))
            .await
            .unwrap();
        assert_eq!(marta_courses.len(), 1);
        assert_eq!(marta_courses[0].id, algebra.id);
        assert_eq!(marta_courses[0].teacher.as_ref().unwrap().name, "Marta Ruiz");

        assert!(matches!(
            service.list(Some("Marta")).await,
            Err(ServiceError::Validation(_))
        ));

        let detail = service.get(&algebra.id.to_string()).await.unwrap();
        assert_eq!(detail.enrolled, 0);
    }

    #[tokio::test]
    async fn test_students_skip_deleted_users() {
        let store = MemoryStore::new();
        let marta = seed_user(&store, "Marta Ruiz", "marta@x.com", Role::Teacher).await;
        let ana = seed_user(&store, "Ana Gomez", "ana@x.com", Role::Student).await;
        let luis = seed_user(&store, "Luis Perez", "luis@x.com", Role::Student).await;
        let algebra = seed_course(&store, "Algebra", 7, marta.id).await;
        for student in [ana.id, luis.id] {
            store
                .insert_enrollment(NewEnrollment {
                    student_id: student,
                    course_id: algebra.id,
                })
                .await
                .unwrap();
        }
        store.delete_user(luis.id).await.unwrap();
        let service = CourseService::new(&store);

        let students = service.students(&algebra.id.to_string()).await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].student.id, ana.id);

        let detail = service.get(&algebra.id.to_string()).await.unwrap();
        assert_eq!(detail.enrolled, 2);

        assert!(matches!(
            service.students(&CourseId::generate().to_string()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let marta = seed_user(&store, "Marta Ruiz", "marta@x.com", Role::Teacher).await;
        let algebra = seed_course(&store, "Algebra", 7, marta.id).await;
        let service = CourseService::new(&store);
        let id = algebra.id.to_string();

        let updated = service
            .update(
                &id,
                CourseInput {
                    code: Some(9),
                    ..CourseInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.code.get(), 9);
        assert_eq!(updated.name, "Algebra");

        assert!(matches!(
            service
                .update(
                    &id,
                    CourseInput {
                        code: Some(20),
                        ..CourseInput::default()
                    }
                )
                .await,
            Err(ServiceError::Validation(_))
        ));

        service.delete(&id).await.unwrap();
        assert!(matches!(
            service.delete(&id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.update(&id, CourseInput::default()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
