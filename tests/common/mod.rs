#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use classbook::router::init_router;
use classbook::state::AppState;
use classbook_auth::create_access_token;
use classbook_authz::{FixedClock, MemoryStore, Mutation, Plan, Store};
use classbook_models::{Class, ClassId, NationalId, Role, School, SchoolId, User, UserId};

static SERIAL: AtomicU64 = AtomicU64::new(1);

pub fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_750_000_000, 0).unwrap()
}

/// One school run by `manager`, with one class taught by `teacher` and
/// attended by `student`. `outsider` is a student in no class.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub manager: User,
    pub teacher: User,
    pub student: User,
    pub outsider: User,
    pub school: School,
    pub class: Class,
}

pub async fn seed_user(store: &MemoryStore, username: &str, role: Role) -> User {
    let serial = SERIAL.fetch_add(1, Ordering::Relaxed);
    store
        .insert_user(User {
            id: UserId::new(),
            username: format!("{}{}", username, serial),
            first_name: username.to_string(),
            last_name: "Test".to_string(),
            email: format!("{}{}@example.com", username, serial),
            national_id: NationalId::new(format!("{:010}", 5_000_000_000 + serial)).unwrap(),
            role,
            bio: None,
            is_active: true,
            created_at: start(),
        })
        .await
        .unwrap()
}

impl TestApp {
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let clock = Arc::new(FixedClock::new(start()));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));

        let manager = seed_user(&store, "manager", Role::Manager).await;
        let teacher = seed_user(&store, "teacher", Role::Teacher).await;
        let student = seed_user(&store, "student", Role::Student).await;
        let outsider = seed_user(&store, "outsider", Role::Student).await;

        let school = store
            .insert_school(School {
                id: SchoolId::new(),
                name: "Riverside".to_string(),
                manager_id: Some(manager.id),
                created_at: start(),
            })
            .await
            .unwrap();

        let class_id = ClassId::new();
        let staff = |mutation| Plan::staff(mutation, start());
        store
            .commit(staff(Mutation::CreateClass(Class {
                id: class_id,
                name: "9C".to_string(),
                school_id: school.id,
                teacher_id: Some(teacher.id),
                student_ids: Vec::new(),
                lesson_ids: Vec::new(),
                created_at: start(),
            })))
            .await
            .unwrap();
        let class = store
            .commit(staff(Mutation::AddStudent {
                class_id,
                student_id: student.id,
            }))
            .await
            .unwrap()
            .into_class()
            .unwrap();

        let state = AppState::new(store.clone(), clock.clone());

        Self {
            state,
            store,
            clock,
            manager,
            teacher,
            student,
            outsider,
            school,
            class,
        }
    }

    pub fn router(&self) -> Router {
        init_router(self.state.clone())
    }

    pub fn token(&self, user: &User) -> String {
        create_access_token(user.id, user.role, &self.state.jwt_config).unwrap()
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Sends one request through a fresh router and returns the status and
    /// the parsed JSON body (`Null` when empty).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("authorization", format!("Bearer {}", self.token(user)));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        self.send("GET", uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(user), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(user), None).await
    }
}
