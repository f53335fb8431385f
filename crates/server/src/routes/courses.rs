//! Course routes.

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

use campus_core::Role;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Course, CourseDetail, CourseStudent};
use crate::services::courses::{CourseInput, CourseService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CourseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub teacher: Option<String>,
    pub date: Option<String>,
    pub code: Option<i64>,
}

impl From<CourseRequest> for CourseInput {
    fn from(body: CourseRequest) -> Self {
        Self {
            name: body.name,
            description: body.description,
            teacher: body.teacher,
            date: body.date,
            code: body.code,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListCoursesQuery {
    pub teacher: Option<String>,
}

/// GET /api/courses?teacher=
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    query: std::result::Result<Query<ListCoursesQuery>, QueryRejection>,
) -> Result<Json<Vec<CourseDetail>>> {
    let Query(query) = query?;
    let courses = CourseService::new(state.store())
        .list(query.teacher.as_deref())
        .await?;
    Ok(Json(courses))
}

/// GET /api/courses/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<CourseDetail>> {
    Ok(Json(CourseService::new(state.store()).get(&id).await?))
}

/// GET /api/courses/{id}/students
pub async fn students(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Vec<CourseStudent>>> {
    Ok(Json(CourseService::new(state.store()).students(&id).await?))
}

/// POST /api/courses
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    payload: std::result::Result<Json<CourseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Course>)> {
    current.require_role(&[Role::Admin])?;
    let Json(body) = payload?;

    let course = CourseService::new(state.store()).create(body.into()).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// PUT /api/courses/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CourseRequest>, JsonRejection>,
) -> Result<Json<Course>> {
    current.require_role(&[Role::Admin])?;
    let Json(body) = payload?;

    let course = CourseService::new(state.store())
        .update(&id, body.into())
        .await?;
    Ok(Json(course))
}

/// DELETE /api/courses/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    current.require_role(&[Role::Admin])?;
    CourseService::new(state.store()).delete(&id).await?;
    Ok(Json(json!({ "message": "course deleted" })))
}
