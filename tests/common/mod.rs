#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use studentdb::router::init_router;
use studentdb::state::AppState;
use studentdb::tasks::TaskQueue;
use studentdb_auth::TokenService;
use studentdb_cache::{CacheConfig, QueryCache};
use studentdb_config::{CorsConfig, FeatureConfig, JwtConfig};
use studentdb_core::StoreError;
use studentdb_db::{
    CredentialStore, MemoryCredentialStore, MemoryStudentRepository, StudentRepository,
};
use studentdb_models::students::{CreateStudentDto, StudentRecord, UpdateStudentDto};

pub const TEST_JWT_SECRET: &str = "test-secret-key-at-least-32-characters-long";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        access_token_expiry: 1800,
    }
}

/// Builds an [`AppState`] on the in-memory stores.
pub struct TestApp {
    pub students: Arc<dyn StudentRepository>,
    pub credentials: Arc<dyn CredentialStore>,
    pub features: FeatureConfig,
    pub cache_config: CacheConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            students: Arc::new(MemoryStudentRepository::new()),
            credentials: Arc::new(MemoryCredentialStore::new()),
            features: FeatureConfig::default(),
            cache_config: CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
        }
    }

    pub fn with_students(mut self, students: Arc<dyn StudentRepository>) -> Self {
        self.students = students;
        self
    }

    pub fn with_cache(mut self, ttl_seconds: u64, invalidate_on_write: bool) -> Self {
        self.cache_config = CacheConfig {
            enabled: true,
            default_ttl_seconds: ttl_seconds,
            invalidate_on_write,
            ..CacheConfig::default()
        };
        self
    }

    pub fn auth_enabled(mut self, enabled: bool) -> Self {
        self.features.auth_enabled = enabled;
        self
    }

    pub fn enforce_read_only(mut self, enforce: bool) -> Self {
        self.features.enforce_read_only = enforce;
        self
    }

    pub fn state(self) -> AppState {
        let cache = self
            .cache_config
            .enabled
            .then(|| QueryCache::memory(&self.cache_config));

        AppState {
            students: self.students,
            credentials: self.credentials,
            tokens: TokenService::new(&test_jwt_config()),
            cache,
            cache_config: self.cache_config,
            features: self.features,
            cors_config: CorsConfig::default(),
            tasks: TaskQueue::start(),
        }
    }
}

pub fn router(state: &AppState) -> Router {
    init_router(state.clone(), None)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn token_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password={}", username, password)))
        .unwrap()
}

pub fn register_body(username: &str, password: &str) -> Value {
    serde_json::json!({ "username": username, "password": password })
}

/// Registers `username` and returns a fresh access token.
pub async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        json_request("POST", "/auth/register", None, &register_body(username, password)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(app, token_request(username, password)).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

pub fn student_body(last: &str, first: &str, faculty: &str, course: &str, score: i32) -> Value {
    serde_json::json!({
        "last_name": last,
        "first_name": first,
        "faculty": faculty,
        "course": course,
        "score": score,
    })
}

/// Repository wrapper that counts read calls.
#[derive(Debug, Default)]
pub struct CountingRepository {
    inner: MemoryStudentRepository,
    reads: AtomicUsize,
}

impl CountingRepository {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StudentRepository for CountingRepository {
    async fn insert(&self, student: CreateStudentDto) -> Result<StudentRecord, StoreError> {
        self.inner.insert(student).await
    }

    async fn insert_many(&self, students: Vec<CreateStudentDto>) -> Result<u64, StoreError> {
        self.inner.insert_many(students).await
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        self.count();
        self.inner.list_all().await
    }

    async fn list_by_faculty(&self, faculty: &str) -> Result<Vec<StudentRecord>, StoreError> {
        self.count();
        self.inner.list_by_faculty(faculty).await
    }

    async fn list_unique_courses(&self) -> Result<Vec<String>, StoreError> {
        self.count();
        self.inner.list_unique_courses().await
    }

    async fn average_score_by_faculty(&self, faculty: &str) -> Result<f64, StoreError> {
        self.count();
        self.inner.average_score_by_faculty(faculty).await
    }

    async fn list_by_course_below_score(
        &self,
        course: &str,
        threshold: i32,
    ) -> Result<Vec<StudentRecord>, StoreError> {
        self.count();
        self.inner.list_by_course_below_score(course, threshold).await
    }

    async fn update(
        &self,
        id: i64,
        patch: UpdateStudentDto,
    ) -> Result<Option<StudentRecord>, StoreError> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64, StoreError> {
        self.inner.delete_many(ids).await
    }
}
