//! Enrollment routes.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use campus_core::{Reference, Role};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Enrollment, EnrollmentDetail};
use crate::services::ServiceError;
use crate::services::enrollments::{EnrollmentFilters, EnrollmentService};
use crate::state::AppState;

/// Body of an enrollment request. Both references are kept as raw JSON so a
/// non-string value is reported as a format error rather than a parse error.
#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentRequest {
    #[serde(default)]
    pub student: Option<Value>,
    #[serde(default)]
    pub course: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ListEnrollmentsQuery {
    pub student: Option<String>,
    pub course: Option<String>,
    pub teacher: Option<String>,
}

/// Enroll a student in a course.
///
/// POST /api/enrollments
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    payload: std::result::Result<Json<CreateEnrollmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Enrollment>)> {
    current.require_role(&[Role::Admin, Role::Student])?;
    let Json(body) = payload?;

    let student = Reference::from_json(body.student.as_ref(), "student")
        .map_err(ServiceError::from)?;
    let course = Reference::from_json(body.course.as_ref(), "course")
        .map_err(ServiceError::from)?;

    let enrollment = EnrollmentService::new(state.store())
        .create(&current, &student, &course)
        .await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// GET /api/enrollments?student=&course=&teacher=
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    query: std::result::Result<Query<ListEnrollmentsQuery>, QueryRejection>,
) -> Result<Json<Vec<EnrollmentDetail>>> {
    let Query(query) = query?;

    let enrollments = EnrollmentService::new(state.store())
        .list(&EnrollmentFilters {
            student: query.student.filter(|s| !s.is_empty()),
            course: query.course.filter(|s| !s.is_empty()),
            teacher: query.teacher.filter(|s| !s.is_empty()),
        })
        .await?;
    Ok(Json(enrollments))
}

/// DELETE /api/enrollments/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    current.require_role(&[Role::Admin, Role::Teacher])?;
    EnrollmentService::new(state.store()).delete(&id).await?;
    Ok(Json(json!({ "message": "enrollment deleted" })))
}
