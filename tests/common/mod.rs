#![allow(dead_code, unused_macros)]

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::{cookie::Cookie, http::header, test};
use imager::accounts::{self, NewUser};
use imager::config::{AppConfig, EmailBackend};
use imager::db::connect_db;
use imager::entity::{profile, user};
use imager::mail::MemoryMailer;
use imager::{templates, Services};
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestEnv {
    pub services: Services,
    pub mailer: Arc<MemoryMailer>,
    _dir: TempDir,
}

impl TestEnv {
    pub fn db(&self) -> &sea_orm::DatabaseConnection {
        &self.services.db
    }
}

pub async fn setup() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        sqlite_path: dir.path().join("imager.sqlite").to_string_lossy().to_string(),
        secret_key: "integration-secret".to_string(),
        bcrypt_cost: 4,
        email_backend: EmailBackend::Memory,
        ..AppConfig::default()
    };
    let db = connect_db(&config).await.unwrap();
    let mailer = Arc::new(MemoryMailer::default());
    let services = Services {
        config,
        db,
        templates: templates::load().unwrap(),
        mailer: mailer.clone(),
    };
    TestEnv {
        services,
        mailer,
        _dir: dir,
    }
}

pub async fn create_user(
    env: &TestEnv,
    username: &str,
    password: &str,
    is_active: bool,
) -> (user::Model, profile::Model) {
    accounts::create_user(
        env.db(),
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: password.to_string(),
            is_active,
        },
        4,
    )
    .await
    .unwrap()
}

pub async fn body_string<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "sessionid")
        .map(|c| c.into_owned())
}

/// Path part of an absolute link, e.g. `http://host/a/b/` -> `/a/b/`.
pub fn path_of(link: &str) -> String {
    let rest = link.split_once("://").map(|(_, r)| r).unwrap_or(link);
    match rest.find('/') {
        Some(idx) => rest[idx..].to_string(),
        None => "/".to_string(),
    }
}

macro_rules! init_app {
    ($env:expr) => {{
        let services = $env.services.clone();
        actix_web::test::init_service(
            actix_web::App::new().configure(move |cfg| services.configure(cfg)),
        )
        .await
    }};
}
