//! In-memory store.
//!
//! Rows live in insertion-ordered vectors behind a single `RwLock`, so
//! "oldest first" falls out of iteration order. Uniqueness checks run under
//! the write lock, which makes them atomic with the insert.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use campus_core::{CourseId, Email, EnrollmentId, UserId};

use super::query::contains_ignore_case;
use super::{CourseQuery, EnrollmentQuery, RepositoryError, Store, UserQuery};
use crate::models::{
    Course, CourseSummary, CourseUpdate, Enrollment, EnrollmentDetail, NewCourse, NewEnrollment,
    NewUser, StudentSummary, TeacherSummary, User, UserUpdate,
};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserRecord>,
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
}

impl Tables {
    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().map(|r| &r.user).find(|u| u.id == id)
    }

    fn course(&self, id: CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .iter()
            .any(|r| &r.user.email == email && Some(r.user.id) != except)
    }

    fn detail(&self, enrollment: &Enrollment) -> EnrollmentDetail {
        let student = self.user(enrollment.student_id).map(StudentSummary::from);
        let course = self.course(enrollment.course_id).map(|c| CourseSummary {
            id: c.id,
            name: c.name.clone(),
            code: c.code,
            date: c.date,
            teacher: self.user(c.teacher_id).map(TeacherSummary::from),
        });

        EnrollmentDetail {
            id: enrollment.id,
            student,
            course,
            created_at: enrollment.created_at,
            updated_at: enrollment.updated_at,
        }
    }
}

fn user_matches(user: &User, query: &UserQuery) -> bool {
    query.id.is_none_or(|id| user.id == id)
        && query.email.as_ref().is_none_or(|e| &user.email == e)
        && query
            .name_contains
            .as_deref()
            .is_none_or(|n| contains_ignore_case(&user.name, n))
        && query.role.is_none_or(|r| user.role == r)
}

fn course_matches(course: &Course, query: &CourseQuery) -> bool {
    query.id.is_none_or(|id| course.id == id)
        && query.code.is_none_or(|c| course.code == c)
        && query
            .name_eq
            .as_deref()
            .is_none_or(|n| course.name.to_lowercase() == n.to_lowercase())
        && query.teacher.is_none_or(|t| course.teacher_id == t)
}

fn enrollment_matches(enrollment: &Enrollment, query: &EnrollmentQuery) -> bool {
    query.student.is_none_or(|s| enrollment.student_id == s)
        && query.course.is_none_or(|c| enrollment.course_id == c)
        && query
            .course_in
            .as_ref()
            .is_none_or(|set| set.contains(&enrollment.course_id))
}

/// Store backed by process memory. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_user(&self, query: &UserQuery) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .map(|r| &r.user)
            .find(|u| user_matches(u, query))
            .cloned())
    }

    async fn find_users(&self, query: &UserQuery) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .map(|r| &r.user)
            .filter(|u| user_matches(u, query))
            .cloned()
            .collect())
    }

    async fn credentials(&self, email: &Email) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|r| &r.user.email == email)
            .map(|r| (r.user.clone(), r.password_hash.clone())))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let created = User {
            id: UserId::generate(),
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(UserRecord {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }

    async fn update_user(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &update.email
            && tables.email_taken(email, Some(id))
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let Some(record) = tables.users.iter_mut().find(|r| r.user.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            record.user.name = name;
        }
        if let Some(email) = update.email {
            record.user.email = email;
        }
        if let Some(role) = update.role {
            record.user.role = role;
        }
        if let Some(hash) = update.password_hash {
            record.password_hash = hash;
        }
        record.user.updated_at = Utc::now();
        Ok(Some(record.user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|r| r.user.id != id);
        Ok(tables.users.len() != before)
    }

    async fn course_by_id(&self, id: CourseId) -> Result<Option<Course>, RepositoryError> {
        Ok(self.tables.read().await.course(id).cloned())
    }

    async fn find_course(&self, query: &CourseQuery) -> Result<Option<Course>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .iter()
            .find(|c| course_matches(c, query))
            .cloned())
    }

    async fn find_courses(&self, query: &CourseQuery) -> Result<Vec<Course>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .iter()
            .filter(|c| course_matches(c, query))
            .cloned()
            .collect())
    }

    async fn insert_course(&self, course: NewCourse) -> Result<Course, RepositoryError> {
        let now = Utc::now();
        let created = Course {
            id: CourseId::generate(),
            name: course.name,
            description: course.description,
            teacher_id: course.teacher_id,
            date: course.date,
            code: course.code,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.courses.push(created.clone());
        Ok(created)
    }

    async fn update_course(
        &self,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Option<Course>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(course) = tables.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            course.name = name;
        }
        if let Some(description) = update.description {
            course.description = description;
        }
        if let Some(teacher_id) = update.teacher_id {
            course.teacher_id = teacher_id;
        }
        if let Some(date) = update.date {
            course.date = date;
        }
        if let Some(code) = update.code {
            course.code = code;
        }
        course.updated_at = Utc::now();
        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: CourseId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.courses.len();
        tables.courses.retain(|c| c.id != id);
        Ok(tables.courses.len() != before)
    }

    async fn find_enrollment(
        &self,
        student: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .find(|e| e.student_id == student && e.course_id == course)
            .cloned())
    }

    async fn enrollment_details(
        &self,
        query: &EnrollmentQuery,
    ) -> Result<Vec<EnrollmentDetail>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .filter(|e| enrollment_matches(e, query))
            .map(|e| tables.detail(e))
            .collect())
    }

    async fn count_enrollments(&self, query: &EnrollmentQuery) -> Result<u64, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables
            .enrollments
            .iter()
            .filter(|e| enrollment_matches(e, query))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollment,
    ) -> Result<Enrollment, RepositoryError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .enrollments
            .iter()
            .any(|e| e.student_id == enrollment.student_id && e.course_id == enrollment.course_id);
        if duplicate {
            return Err(RepositoryError::Conflict(
                "enrollment (student_id, course_id) already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let created = Enrollment {
            id: EnrollmentId::generate(),
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            created_at: now,
            updated_at: now,
        };
        tables.enrollments.push(created.clone());
        Ok(created)
    }

    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.enrollments.len();
        tables.enrollments.retain(|e| e.id != id);
        Ok(tables.enrollments.len() != before)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use campus_core::{CourseCode, Role};

    use super::*;

    fn new_user(name: &str, email: &str, role: Role) -> NewUser {
        NewUser {
            name: name.to_owned(),
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_owned(),
            role,
        }
    }

    #[tokio::test]
    async fn test_insert_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store
            .insert_user(new_user("Ana", "ana@x.com", Role::Student))
            .await
            .unwrap();

        let result = store
            .insert_user(new_user("Other Ana", "ANA@x.com", Role::Teacher))
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(store.find_users(&UserQuery::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_user_by_name_is_oldest_first() {
        let store = MemoryStore::new();
        let first = store
            .insert_user(new_user("Ana Gomez", "ana@x.com", Role::Student))
            .await
            .unwrap();
        store
            .insert_user(new_user("Ana Perez", "perez@x.com", Role::Student))
            .await
            .unwrap();

        let found = store
            .find_user(&UserQuery::by_name("ANA").with_role(Role::Student))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn test_update_user_email_conflict() {
        let store = MemoryStore::new();
        store
            .insert_user(new_user("Ana", "ana@x.com", Role::Student))
            .await
            .unwrap();
        let bob = store
            .insert_user(new_user("Bob", "bob@x.com", Role::Student))
            .await
            .unwrap();

        let update = UserUpdate {
            email: Some(Email::parse("ana@x.com").unwrap()),
            ..UserUpdate::default()
        };
        let result = store.update_user(bob.id, update).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        let missing = store
            .update_user(UserId::generate(), UserUpdate::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_enrollment_pair_is_unique() {
        let store = MemoryStore::new();
        let pair = NewEnrollment {
            student_id: UserId::generate(),
            course_id: CourseId::generate(),
        };

        store.insert_enrollment(pair).await.unwrap();
        let second = store.insert_enrollment(pair).await;
        assert!(matches!(second, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_details_expand_dangling_references_to_none() {
        let store = MemoryStore::new();
        let teacher = store
            .insert_user(new_user("Marta Ruiz", "marta@x.com", Role::Teacher))
            .await
            .unwrap();
        let course = store
            .insert_course(NewCourse {
                name: "Algebra".to_owned(),
                description: "Linear algebra".to_owned(),
                teacher_id: teacher.id,
                date: Utc::now(),
                code: CourseCode::new(7).unwrap(),
            })
            .await
            .unwrap();
        let enrollment = store
            .insert_enrollment(NewEnrollment {
                student_id: UserId::generate(),
                course_id: course.id,
            })
            .await
            .unwrap();

        let details = store
            .enrollment_details(&EnrollmentQuery::for_course(course.id))
            .await
            .unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, enrollment.id);
        assert!(details[0].student.is_none());
        let summary = details[0].course.as_ref().unwrap();
        assert_eq!(summary.teacher.as_ref().unwrap().name, "Marta Ruiz");

        assert!(store.delete_course(course.id).await.unwrap());
        let details = store
            .enrollment_details(&EnrollmentQuery::default())
            .await
            .unwrap();
        assert!(details[0].course.is_none());
    }

    #[tokio::test]
    async fn test_course_in_empty_set_matches_nothing() {
        let store = MemoryStore::new();
        store
            .insert_enrollment(NewEnrollment {
                student_id: UserId::generate(),
                course_id: CourseId::generate(),
            })
            .await
            .unwrap();

        let query = EnrollmentQuery {
            course_in: Some(Vec::new()),
            ..EnrollmentQuery::default()
        };
        assert_eq!(store.count_enrollments(&query).await.unwrap(), 0);
        assert_eq!(
            store
                .count_enrollments(&EnrollmentQuery::default())
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_delete_enrollment_reports_absence() {
        let store = MemoryStore::new();
        let created = store
            .insert_enrollment(NewEnrollment {
                student_id: UserId::generate(),
                course_id: CourseId::generate(),
            })
            .await
            .unwrap();

        assert!(store.delete_enrollment(created.id).await.unwrap());
        assert!(!store.delete_enrollment(created.id).await.unwrap());
    }
}
