#![allow(dead_code)]

use actix_cors::Cors;
use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{test, web, App, Error};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use taskgate::auth::SessionManager;
use taskgate::models::{PublicUser, TokenPair};
use taskgate::routes::{self, health};
use taskgate::store::{MemoryStore, TaskStore, TokenStore};

/// Lowest bcrypt cost, to keep the suite fast.
pub const TEST_HASH_COST: u32 = 4;

pub struct TestState {
    pub store: MemoryStore,
    pub sessions: web::Data<SessionManager>,
    pub tasks: web::Data<dyn TaskStore>,
}

impl TestState {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let sessions = SessionManager::new(Arc::new(store.clone()), Arc::new(store.clone()))
            .with_hash_cost(TEST_HASH_COST);
        let tasks: Arc<dyn TaskStore> = Arc::new(store.clone());
        Self {
            store,
            sessions: web::Data::new(sessions),
            tasks: web::Data::from(tasks),
        }
    }

    /// Moves the expiry of the session owning `access_token` one second into the past.
    pub async fn expire_session(&self, access_token: &str) {
        let session = self
            .store
            .find_by_access_token(access_token)
            .await
            .unwrap()
            .expect("session exists");
        self.store
            .rotate(
                session.id,
                &session.access_token,
                &session.refresh_token,
                Utc::now() - Duration::seconds(1),
            )
            .await
            .unwrap()
            .expect("session still exists");
    }
}

/// The application exactly as `main` assembles it, on the in-memory store.
pub async fn init_app(
    state: &TestState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(state.sessions.clone())
            .app_data(state.tasks.clone())
            .service(health::health)
            .configure(routes::config),
    )
    .await
}

pub async fn register<S, B>(app: &S, name: &str, email: &str, password: &str) -> PublicUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    test::read_body_json(resp).await
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> TokenPair
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    test::read_body_json(resp).await
}

/// Registers a user and logs them in.
pub async fn signed_in<S, B>(app: &S, name: &str, email: &str) -> TokenPair
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    register(app, name, email, "pw123").await;
    login(app, email, "pw123").await
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {}", token))
}

/// Status and JSON body of a response.
pub async fn status_and_json<B>(resp: ServiceResponse<B>) -> (StatusCode, serde_json::Value)
where
    B: MessageBody,
{
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, json)
}
