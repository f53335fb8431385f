//! Enrollment service: create, list and delete enrollments.

use campus_core::{EnrollmentId, Reference, Role};
use tracing::{info, instrument, warn};

use super::error::{ServiceError, ServiceResult};
use super::resolver::Resolver;
use crate::db::{CourseQuery, EnrollmentQuery, RepositoryError, Store};
use crate::models::{CurrentUser, Enrollment, EnrollmentDetail, NewEnrollment};

/// Filters accepted by [`EnrollmentService::list`]. Each is optional and they
/// combine with AND.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilters {
    pub student: Option<String>,
    pub course: Option<String>,
    pub teacher: Option<String>,
}

/// Enrollment operations on top of a store.
pub struct EnrollmentService<'a> {
    store: &'a dyn Store,
}

impl<'a> EnrollmentService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    const fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.store)
    }

    /// Enroll a student in a course.
    ///
    /// Students may only enroll themselves. A pair that already exists is
    /// rejected whether it is seen by the pre-check or reported by the store
    /// when a concurrent request inserts first.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` when a reference is malformed or does not resolve
    /// - `ServiceError::Authorization` when a student enrolls someone else
    /// - `ServiceError::AlreadyEnrolled` when the pair exists
    #[instrument(skip_all, fields(actor = %actor.id))]
    pub async fn create(
        &self,
        actor: &CurrentUser,
        student_ref: &Reference,
        course_ref: &Reference,
    ) -> ServiceResult<Enrollment> {
        let resolver = self.resolver();

        let student = resolver
            .student(student_ref)
            .await?
            .ok_or_else(|| ServiceError::Validation("student not found".to_owned()))?;

        if actor.role == Role::Student && actor.id != student.id {
            warn!(student = %student.id, "Student tried to enroll someone else");
            return Err(ServiceError::Authorization(
                "students may only enroll themselves".to_owned(),
            ));
        }

        let course = resolver
            .course(course_ref)
            .await?
            .ok_or_else(|| ServiceError::Validation("course not found".to_owned()))?;

        if self
            .store
            .find_enrollment(student.id, course.id)
            .await?
            .is_some()
        {
            return Err(ServiceError::AlreadyEnrolled);
        }

        let enrollment = self
            .store
            .insert_enrollment(NewEnrollment {
                student_id: student.id,
                course_id: course.id,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    warn!(student = %student.id, course = %course.id, "Lost enrollment insert race");
                    ServiceError::AlreadyEnrolled
                }
                other => ServiceError::Repository(other),
            })?;

        info!(
            enrollment = %enrollment.id,
            student = %student.id,
            course = %course.id,
            "Enrollment created"
        );
        Ok(enrollment)
    }

    /// List enrollments with student and course expanded.
    ///
    /// Empty filters are ignored. A whitespace-only teacher is rejected.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` when a filter is blank
    /// - `ServiceError::NotFound` when a filter does not resolve, or the
    ///   matching teachers have no courses
    pub async fn list(&self, filters: &EnrollmentFilters) -> ServiceResult<Vec<EnrollmentDetail>> {
        let resolver = self.resolver();
        let mut query = EnrollmentQuery::default();

        if let Some(raw) = present(filters.student.as_deref()) {
            let reference = Reference::classify(raw, "student")?;
            let student = resolver
                .student(&reference)
                .await?
                .ok_or_else(|| ServiceError::NotFound("student not found".to_owned()))?;
            query.student = Some(student.id);
        }

        if let Some(raw) = present(filters.course.as_deref()) {
            let reference = Reference::classify(raw, "course")?;
            let course = resolver
                .course(&reference)
                .await?
                .ok_or_else(|| ServiceError::NotFound("course not found".to_owned()))?;
            query.course = Some(course.id);
        }

        if let Some(raw) = present(filters.teacher.as_deref()) {
            let fragment = raw.trim();
            if fragment.is_empty() {
                return Err(ServiceError::Validation("teacher is required".to_owned()));
            }

            let teachers = resolver.teachers_named(fragment).await?;
            if teachers.is_empty() {
                return Err(ServiceError::NotFound("teacher not found".to_owned()));
            }

            let mut courses = Vec::new();
            for teacher in teachers {
                let taught = self.store.find_courses(&CourseQuery::by_teacher(teacher)).await?;
                courses.extend(taught.into_iter().map(|c| c.id));
            }
            if courses.is_empty() {
                return Err(ServiceError::NotFound(
                    "no courses found for this teacher".to_owned(),
                ));
            }
            query.course_in = Some(courses);
        }

        Ok(self.store.enrollment_details(&query).await?)
    }

    /// Delete an enrollment by id.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` when `id` is not an identifier
    /// - `ServiceError::NotFound` when no enrollment has that id
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let id = EnrollmentId::parse(id)
            .ok_or_else(|| ServiceError::Validation("invalid id".to_owned()))?;

        if !self.store.delete_enrollment(id).await? {
            return Err(ServiceError::NotFound("enrollment not found".to_owned()));
        }

        info!(enrollment = %id, "Enrollment deleted");
        Ok(())
    }
}

/// A filter value, or `None` when it is absent or empty.
fn present(filter: Option<&str>) -> Option<&str> {
    filter.filter(|s| !s.is_empty())
}
