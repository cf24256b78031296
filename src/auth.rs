use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::entity::user;
use crate::error::AppError;

/// The logged-in user. Rejects anonymous requests with a redirect to the login page.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

#[derive(Clone, Debug)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[derive(Serialize, Deserialize)]
struct SessionClaims {
    #[serde(rename = "loginId")]
    login_id: i32,
    exp: usize,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = match req.app_data::<web::Data<DatabaseConnection>>() {
            Some(db) => db.clone(),
            None => {
                return Box::pin(async {
                    Err(AppError::system_exception("database not configured").into())
                });
            }
        };
        let config = match req.app_data::<web::Data<AppConfig>>() {
            Some(cfg) => cfg.clone(),
            None => {
                return Box::pin(async {
                    Err(AppError::system_exception("config not configured").into())
                });
            }
        };
        let token = extract_token(req, &config);

        Box::pin(async move {
            let token = token.ok_or_else(AppError::need_login)?;
            let auth = authenticate_token(&db, &config, &token)
                .await?
                .ok_or_else(AppError::need_login)?;
            Ok(auth)
        })
    }
}

impl FromRequest for OptionalAuthUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = match req.app_data::<web::Data<DatabaseConnection>>() {
            Some(db) => db.clone(),
            None => {
                return Box::pin(async { Ok(OptionalAuthUser(None)) });
            }
        };
        let config = match req.app_data::<web::Data<AppConfig>>() {
            Some(cfg) => cfg.clone(),
            None => {
                return Box::pin(async { Ok(OptionalAuthUser(None)) });
            }
        };
        let token = extract_token(req, &config);

        Box::pin(async move {
            if let Some(token) = token {
                let auth = authenticate_token(&db, &config, &token).await?;
                return Ok(OptionalAuthUser(auth));
            }
            Ok(OptionalAuthUser(None))
        })
    }
}

fn extract_token(req: &HttpRequest, config: &AppConfig) -> Option<String> {
    req.cookie(&config.session_cookie_name)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves a session token to an active user. Bad, expired or orphaned
/// sessions are anonymous, not errors.
async fn authenticate_token(
    db: &DatabaseConnection,
    config: &AppConfig,
    token: &str,
) -> Result<Option<AuthUser>, AppError> {
    let user_id = match decode_session(config, token) {
        Some(id) => id,
        None => return Ok(None),
    };
    let user = user::Entity::find_by_id(user_id).one(db).await?;
    Ok(user
        .filter(|u| u.is_active)
        .map(|u| AuthUser {
            user_id: u.id,
            username: u.username,
        }))
}

fn decode_session(config: &AppConfig, token: &str) -> Option<i32> {
    let key = DecodingKey::from_secret(config.secret_key.as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    decode::<SessionClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims.login_id)
}

/// Session cookie for a freshly authenticated user.
pub fn session_cookie(config: &AppConfig, user_id: i32) -> Result<Cookie<'static>, AppError> {
    let exp = (Utc::now() + Duration::days(config.session_age_days)).timestamp() as usize;
    let claims = SessionClaims {
        login_id: user_id,
        exp,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )
    .map_err(AppError::system_exception)?;

    Ok(Cookie::build(config.session_cookie_name.clone(), token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(config.session_age_days))
        .finish())
}

pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.session_cookie_name.clone(), "")
        .path("/")
        .finish();
    cookie.make_removal();
    cookie
}
