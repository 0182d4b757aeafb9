//! Recording service mocks and request helpers shared by the handler tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use time::macros::datetime;
use tower::ServiceExt;

use crate::{
    auth::{claims::Claims, jwt::JwtKeys, repo::AuthenticationService},
    boxes::{
        repo::BoxService,
        repo_types::{CloseEvent, OpenEvent, PillBox},
    },
    pills::{
        repo::PillService,
        repo_types::{Pill, TimeOfDay},
    },
    state::AppState,
    users::{repo::UserService, repo_types::User},
};

pub type MockFn<A, R> = Option<Box<dyn Fn(A) -> anyhow::Result<R> + Send + Sync>>;

fn call<A, R>(f: &MockFn<A, R>, invoked: &AtomicBool, name: &str, arg: A) -> anyhow::Result<R> {
    invoked.store(true, Ordering::SeqCst);
    match f {
        Some(f) => f(arg),
        None => Err(anyhow!("{name} not implemented")),
    }
}

#[derive(Default)]
pub struct MockUserService {
    pub user_by_id_fn: MockFn<i64, Option<User>>,
    pub user_by_id_invoked: AtomicBool,
    pub user_by_email_fn: MockFn<String, Option<User>>,
    pub user_by_email_invoked: AtomicBool,
    pub users_fn: MockFn<(), Vec<User>>,
    pub users_invoked: AtomicBool,
    pub insert_user_fn: MockFn<User, User>,
    pub insert_user_invoked: AtomicBool,
    pub update_user_fn: MockFn<(i64, User), ()>,
    pub update_user_invoked: AtomicBool,
}

#[async_trait]
impl UserService for MockUserService {
    async fn user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        call(&self.user_by_id_fn, &self.user_by_id_invoked, "user_by_id", id)
    }

    async fn user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        call(
            &self.user_by_email_fn,
            &self.user_by_email_invoked,
            "user_by_email",
            email.to_string(),
        )
    }

    async fn users(&self) -> anyhow::Result<Vec<User>> {
        call(&self.users_fn, &self.users_invoked, "users", ())
    }

    async fn insert_user(&self, user: User) -> anyhow::Result<User> {
        call(&self.insert_user_fn, &self.insert_user_invoked, "insert_user", user)
    }

    async fn update_user(&self, id: i64, user: User) -> anyhow::Result<()> {
        call(&self.update_user_fn, &self.update_user_invoked, "update_user", (id, user))
    }
}

#[derive(Default)]
pub struct MockPillService {
    pub pill_fn: MockFn<i64, Option<Pill>>,
    pub pill_invoked: AtomicBool,
    pub pills_fn: MockFn<i64, Vec<Pill>>,
    pub pills_invoked: AtomicBool,
    pub create_pill_fn: MockFn<Pill, Pill>,
    pub create_pill_invoked: AtomicBool,
    pub update_pill_fn: MockFn<(i64, Pill), ()>,
    pub update_pill_invoked: AtomicBool,
}

#[async_trait]
impl PillService for MockPillService {
    async fn pill(&self, id: i64) -> anyhow::Result<Option<Pill>> {
        call(&self.pill_fn, &self.pill_invoked, "pill", id)
    }

    async fn pills(&self, user_id: i64) -> anyhow::Result<Vec<Pill>> {
        call(&self.pills_fn, &self.pills_invoked, "pills", user_id)
    }

    async fn create_pill(&self, pill: Pill) -> anyhow::Result<Pill> {
        call(&self.create_pill_fn, &self.create_pill_invoked, "create_pill", pill)
    }

    async fn update_pill(&self, id: i64, pill: Pill) -> anyhow::Result<()> {
        call(&self.update_pill_fn, &self.update_pill_invoked, "update_pill", (id, pill))
    }
}

#[derive(Default)]
pub struct MockBoxService {
    pub box_by_id_fn: MockFn<i64, Option<PillBox>>,
    pub box_by_id_invoked: AtomicBool,
    pub boxes_fn: MockFn<i64, Vec<PillBox>>,
    pub boxes_invoked: AtomicBool,
    pub insert_open_event_fn: MockFn<OpenEvent, OpenEvent>,
    pub insert_open_event_invoked: AtomicBool,
    pub insert_close_event_fn: MockFn<CloseEvent, CloseEvent>,
    pub insert_close_event_invoked: AtomicBool,
}

#[async_trait]
impl BoxService for MockBoxService {
    async fn box_by_id(&self, id: i64) -> anyhow::Result<Option<PillBox>> {
        call(&self.box_by_id_fn, &self.box_by_id_invoked, "box_by_id", id)
    }

    async fn boxes(&self, user_id: i64) -> anyhow::Result<Vec<PillBox>> {
        call(&self.boxes_fn, &self.boxes_invoked, "boxes", user_id)
    }

    async fn insert_open_event(&self, event: OpenEvent) -> anyhow::Result<OpenEvent> {
        call(
            &self.insert_open_event_fn,
            &self.insert_open_event_invoked,
            "insert_open_event",
            event,
        )
    }

    async fn insert_close_event(&self, event: CloseEvent) -> anyhow::Result<CloseEvent> {
        call(
            &self.insert_close_event_fn,
            &self.insert_close_event_invoked,
            "insert_close_event",
            event,
        )
    }
}

#[derive(Default)]
pub struct MockAuthenticationService {
    pub authenticate_fn: MockFn<(String, String), bool>,
    pub authenticate_invoked: AtomicBool,
    pub email_available_fn: MockFn<String, bool>,
    pub email_available_invoked: AtomicBool,
}

#[async_trait]
impl AuthenticationService for MockAuthenticationService {
    async fn authenticate(&self, email: &str, password: &str) -> anyhow::Result<bool> {
        call(
            &self.authenticate_fn,
            &self.authenticate_invoked,
            "authenticate",
            (email.to_string(), password.to_string()),
        )
    }

    async fn email_available(&self, email: &str) -> anyhow::Result<bool> {
        call(
            &self.email_available_fn,
            &self.email_available_invoked,
            "email_available",
            email.to_string(),
        )
    }
}

/// One mock per service; keep the handle to inspect `*_invoked` after a call.
#[derive(Default)]
pub struct Mocks {
    pub users: Arc<MockUserService>,
    pub pills: Arc<MockPillService>,
    pub boxes: Arc<MockBoxService>,
    pub auth: Arc<MockAuthenticationService>,
}

impl Mocks {
    pub fn state(&self) -> AppState {
        AppState::from_parts(
            AppState::test_config(),
            self.users.clone(),
            self.pills.clone(),
            self.boxes.clone(),
            self.auth.clone(),
        )
    }

    pub fn app(&self) -> Router {
        crate::app::build_app(self.state())
    }
}

pub fn jacob() -> User {
    User {
        id: 1,
        email: "jacob.smith@unb.ca".into(),
        password: "password".into(),
        first_name: "Jacob".into(),
        last_name: "Smith".into(),
        archived: false,
    }
}

pub fn doxy_poxy() -> Pill {
    Pill {
        id: 1,
        user_id: 1,
        name: "DoxyPoxy".into(),
        days_of_week: (1..=7).collect(),
        times_of_day: vec![TimeOfDay(datetime!(2024-01-01 08:00:00 UTC))],
        archived: false,
    }
}

/// Authorization header value for `id`, signed with the test secret.
pub fn bearer(id: i64) -> String {
    let token = JwtKeys::new("test-secret")
        .sign(&Claims { id })
        .expect("sign test token");
    format!("BEARER {token}")
}

pub fn request(method: Method, uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn json_request(
    method: Method,
    uri: &str,
    body: &str,
    authorization: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

/// Runs one request through `app`. Non-JSON bodies come back as a string.
pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = app.oneshot(req).await.expect("infallible");
    let status = res.status();
    let bytes = res
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();

    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}
