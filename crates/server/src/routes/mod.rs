//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (store ping)
//! GET    /api/health                - API heartbeat
//!
//! # Users
//! POST   /api/users                 - Register (admins may create any role)
//! POST   /api/users/auth            - Log in, sets the session cookie
//! POST   /api/users/logout          - Log out
//! GET    /api/users/me              - Current user
//! GET    /api/users?role=           - List users
//! GET    /api/users/{id}            - Show user
//! PUT    /api/users/{id}            - Update user (self or admin)
//! DELETE /api/users/{id}            - Delete user (admin)
//!
//! # Courses
//! GET    /api/courses?teacher=      - List courses
//! GET    /api/courses/{id}          - Show course
//! GET    /api/courses/{id}/students - Students enrolled in the course
//! POST   /api/courses               - Create course (admin)
//! PUT    /api/courses/{id}          - Update course (admin)
//! DELETE /api/courses/{id}          - Delete course (admin)
//!
//! # Enrollments
//! POST   /api/enrollments           - Enroll (admin, student)
//! GET    /api/enrollments?student=&course=&teacher= - List
//! DELETE /api/enrollments/{id}      - Remove (admin, teacher)
//! ```

pub mod courses;
pub mod enrollments;
pub mod health;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list).post(users::register))
        .route("/auth", post(users::login))
        .route("/logout", post(users::logout))
        .route("/me", get(users::me))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
}

/// Create the course routes router.
pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(courses::list).post(courses::create))
        .route(
            "/{id}",
            get(courses::show)
                .put(courses::update)
                .delete(courses::delete),
        )
        .route("/{id}/students", get(courses::students))
}

/// Create the enrollment routes router.
pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(enrollments::list).post(enrollments::create))
        .route("/{id}", axum::routing::delete(enrollments::delete))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/health", get(health::api_health))
        .nest("/api/users", user_routes())
        .nest("/api/courses", course_routes())
        .nest("/api/enrollments", enrollment_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use campus_core::{Email, Role, UserId};

    use crate::config::ServerConfig;
    use crate::db::{MemoryStore, Store};
    use crate::models::NewUser;
    use crate::services::auth::hash_password;
    use crate::state::AppState;
    use crate::testing::seed_course;

    const PASSWORD: &str = "secret1";

    struct TestApp {
        router: Router,
        store: Arc<MemoryStore>,
    }

    impl TestApp {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let state = AppState::new(ServerConfig::in_memory(), store.clone());
            let router = crate::build_app(state, tower_sessions::MemoryStore::default());
            Self { router, store }
        }

        async fn seed(&self, name: &str, email: &str, role: Role) -> String {
            let user = self
                .store
                .insert_user(NewUser {
                    name: name.to_owned(),
                    email: Email::parse(email).unwrap(),
                    password_hash: hash_password(PASSWORD).unwrap(),
                    role,
                })
                .await
                .unwrap();
            user.id.to_string()
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            cookie: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Option<String>, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(cookie) = cookie {
                builder = builder.header(header::COOKIE, cookie);
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let set_cookie = response
                .headers()
                .get(header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(';').next())
                .map(str::to_owned);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, set_cookie, json)
        }

        async fn login(&self, email: &str) -> String {
            let (status, cookie, _) = self
                .send(
                    Method::POST,
                    "/api/users/auth",
                    None,
                    Some(json!({ "email": email, "password": PASSWORD })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            cookie.unwrap()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();

        let (status, _, _) = app.send(Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = app.send(Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_enrollment_scenario() {
        let app = TestApp::new();
        app.seed("Admin", "admin@x.com", Role::Admin).await;
        let teacher = app.seed("Marta Ruiz", "marta@x.com", Role::Teacher).await;
        let admin = app.login("admin@x.com").await;

        let (status, _, student) = app
            .send(
                Method::POST,
                "/api/users",
                None,
                Some(json!({ "name": "Ana Gomez", "email": "ana@x.com", "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(student["role"], "student");
        assert!(student.get("password_hash").is_none());

        let (status, _, course) = app
            .send(
                Method::POST,
                "/api/courses",
                Some(&admin),
                Some(json!({
                    "name": "Algebra",
                    "description": "Linear algebra",
                    "teacher": teacher,
                    "date": "2026-03-02T09:00:00Z",
                    "code": 7
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let enroll = json!({ "student": "ana@x.com", "course": "7" });
        let (status, _, enrollment) = app
            .send(Method::POST, "/api/enrollments", Some(&admin), Some(enroll.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(enrollment["student"], student["id"]);
        assert_eq!(enrollment["course"], course["id"]);

        let (status, _, body) = app
            .send(Method::POST, "/api/enrollments", Some(&admin), Some(enroll))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "student is already enrolled in this course");

        let uri = format!("/api/enrollments/{}", enrollment["id"].as_str().unwrap());
        let (status, _, body) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "enrollment deleted");

        let (status, _, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_enrollment_role_gates() {
        let app = TestApp::new();
        let teacher = app.seed("Marta Ruiz", "marta@x.com", Role::Teacher).await;
        app.seed("Ana Gomez", "ana@x.com", Role::Student).await;
        app.seed("Luis Perez", "luis@x.com", Role::Student).await;
        let teacher = UserId::parse(&teacher).unwrap();
        let course = seed_course(app.store.as_ref(), "Algebra", 7, teacher).await;

        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/enrollments",
                None,
                Some(json!({ "student": "ana@x.com", "course": "7" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let marta = app.login("marta@x.com").await;
        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/enrollments",
                Some(&marta),
                Some(json!({ "student": "ana@x.com", "course": "7" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let ana = app.login("ana@x.com").await;
        let (status, _, body) = app
            .send(
                Method::POST,
                "/api/enrollments",
                Some(&ana),
                Some(json!({ "student": "luis@x.com", "course": "7" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "students may only enroll themselves");

        let (status, _, enrollment) = app
            .send(
                Method::POST,
                "/api/enrollments",
                Some(&ana),
                Some(json!({ "student": "Ana", "course": course.id.to_string() })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/api/enrollments/{}", enrollment["id"].as_str().unwrap());
        let (status, _, _) = app.send(Method::DELETE, &uri, Some(&ana), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Any teacher may remove an enrollment.
        let (status, _, _) = app.send(Method::DELETE, &uri, Some(&marta), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_enrollment_body_validation() {
        let app = TestApp::new();
        app.seed("Admin", "admin@x.com", Role::Admin).await;
        let admin = app.login("admin@x.com").await;

        let cases = [
            (json!({ "course": "7" }), "student is required"),
            (json!({ "student": "  ", "course": "7" }), "student is required"),
            (json!({ "student": 42, "course": "7" }), "invalid student format"),
            (json!({ "student": "ana@x.com", "course": "7" }), "student not found"),
        ];
        for (body, message) in cases {
            let (status, _, response) = app
                .send(Method::POST, "/api/enrollments", Some(&admin), Some(body))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["message"], message);
        }

        let (status, _, _) = app
            .send(Method::DELETE, "/api/enrollments/not-an-id", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_enrollment_listing_filters() {
        let app = TestApp::new();
        app.seed("Admin", "admin@x.com", Role::Admin).await;
        app.seed("Ana Gomez", "ana@x.com", Role::Student).await;
        let teacher = app.seed("Marta Ruiz", "marta@x.com", Role::Teacher).await;
        let admin = app.login("admin@x.com").await;

        app.send(
            Method::POST,
            "/api/courses",
            Some(&admin),
            Some(json!({
                "name": "Algebra",
                "description": "Linear algebra",
                "teacher": teacher,
                "date": "2026-03-02T09:00:00Z",
                "code": 7
            })),
        )
        .await;
        app.send(
            Method::POST,
            "/api/enrollments",
            Some(&admin),
            Some(json!({ "student": "Ana", "course": "Algebra" })),
        )
        .await;

        let (status, _, body) = app
            .send(Method::GET, "/api/enrollments?teacher=ruiz", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["student"]["name"], "Ana Gomez");
        assert_eq!(body[0]["course"]["teacher"]["email"], "marta@x.com");

        let (status, _, body) = app
            .send(Method::GET, "/api/enrollments?teacher=Nobody", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "teacher not found");

        let (status, _, body) = app
            .send(
                Method::GET,
                "/api/enrollments?student=&course=&teacher=",
                Some(&admin),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _, body) = app
            .send(Method::GET, "/api/enrollments?teacher=%20%20", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "teacher is required");

        let (status, _, _) = app
            .send(Method::GET, "/api/enrollments", None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_auth_flow() {
        let app = TestApp::new();
        let register = json!({ "name": "Ana Gomez", "email": "ana@x.com", "password": PASSWORD });

        let (status, _, _) = app
            .send(Method::POST, "/api/users", None, Some(register.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _, _) = app
            .send(Method::POST, "/api/users", None, Some(register))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/users",
                None,
                Some(json!({ "name": "Eve", "email": "eve@x.com", "password": PASSWORD, "role": "admin" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/users/auth",
                None,
                Some(json!({ "email": "ana@x.com", "password": "wrong-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let ana = app.login("ana@x.com").await;
        let (status, _, me) = app.send(Method::GET, "/api/users/me", Some(&ana), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "ana@x.com");

        let (status, _, _) = app
            .send(Method::POST, "/api/users/logout", Some(&ana), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, _) = app.send(Method::GET, "/api/users/me", Some(&ana), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_course_admin_gate() {
        let app = TestApp::new();
        let teacher = app.seed("Marta Ruiz", "marta@x.com", Role::Teacher).await;
        let marta = app.login("marta@x.com").await;

        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/courses",
                Some(&marta),
                Some(json!({
                    "name": "Algebra",
                    "description": "Linear algebra",
                    "teacher": teacher,
                    "date": "2026-03-02T09:00:00Z",
                    "code": 7
                })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/api/courses?teacher={teacher}");
        let (status, _, body) = app.send(Method::GET, &uri, Some(&marta), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }
}
