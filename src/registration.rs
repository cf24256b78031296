//! Sign-up with email activation.
//!
//! A new account starts inactive. The activation email carries a signed key
//! naming the username; visiting the link within `ACCOUNT_ACTIVATION_DAYS`
//! flips the account to active, once.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use thiserror::Error;

use crate::accounts::{self, NewUser, USERNAME_TAKEN};
use crate::config::AppConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::forms::{require, FormErrors, REQUIRED};
use crate::mail::{EmailMessage, Mailer};

pub const ACTIVATION_EMAIL_SUBJECT: &str = "Djimager registration email.";
pub const ACTIVATION_EMAIL_TEMPLATE: &str = "registration/activation_email.txt";

const ACTIVATION_PURPOSE: &str = "registration.activation";
const USERNAME_MAX_LEN: usize = 150;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegistrationForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

/// Where activation links point to.
#[derive(Clone, Debug)]
pub struct Site {
    pub scheme: String,
    pub domain: String,
}

impl Site {
    /// Uses the request host only when it is in `ALLOWED_HOSTS`, otherwise `SITE_DOMAIN`.
    pub fn for_request(config: &AppConfig, scheme: &str, host: &str) -> Self {
        let domain = if host_allowed(&config.allowed_hosts, host) {
            host.to_string()
        } else {
            config.site_domain.clone()
        };
        Self {
            scheme: scheme.to_string(),
            domain,
        }
    }
}

fn host_allowed(allowed: &[String], host: &str) -> bool {
    let name = strip_port(host).to_lowercase();
    if name.is_empty() {
        return false;
    }
    allowed.iter().any(|pattern| {
        let pattern = pattern.trim().to_lowercase();
        if pattern == "*" {
            return true;
        }
        match pattern.strip_prefix('.') {
            Some(parent) => name == parent || name.ends_with(&pattern),
            None => name == pattern,
        }
    })
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

pub enum RegistrationOutcome {
    Registered(user::Model),
    Invalid(FormErrors),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActivationError {
    #[error("The account you tried to activate has already been activated.")]
    AlreadyActivated,
    #[error("The activation key you provided is invalid.")]
    BadKey,
    #[error("This account has expired.")]
    Expired,
    #[error("The account you attempted to activate is invalid.")]
    BadUsername,
}

pub enum ActivationOutcome {
    Activated(user::Model),
    Failed(ActivationError),
}

#[derive(Serialize, Deserialize)]
struct ActivationClaims {
    sub: String,
    purpose: String,
    exp: usize,
}

pub async fn register(
    db: &DatabaseConnection,
    config: &AppConfig,
    mailer: &dyn Mailer,
    templates: &Tera,
    site: &Site,
    form: &RegistrationForm,
) -> Result<RegistrationOutcome, AppError> {
    let mut errors = FormErrors::default();
    let new_user = clean(db, form, &mut errors).await?;
    let new_user = match new_user {
        Some(new_user) if errors.is_empty() => new_user,
        _ => return Ok(RegistrationOutcome::Invalid(errors)),
    };

    let (user, _profile) = match accounts::create_user(db, new_user, config.bcrypt_cost).await {
        Ok(created) => created,
        Err(AppError::Fail(msg)) if msg == USERNAME_TAKEN => {
            errors.add("username", USERNAME_TAKEN);
            return Ok(RegistrationOutcome::Invalid(errors));
        }
        Err(err) => return Err(err),
    };

    if let Err(err) = send_activation(config, mailer, templates, site, &user).await {
        warn!("activation email for {} failed, removing the account: {}", user.username, err);
        accounts::delete_user(db, user).await?;
        return Err(err);
    }
    info!("registered {}, activation email sent to {}", user.username, user.email);

    Ok(RegistrationOutcome::Registered(user))
}

async fn send_activation(
    config: &AppConfig,
    mailer: &dyn Mailer,
    templates: &Tera,
    site: &Site,
    user: &user::Model,
) -> Result<(), AppError> {
    let key = activation_key(config, &user.username)?;
    let message = activation_email(config, templates, site, user, &key)?;
    mailer.send(&message).await?;
    Ok(())
}

async fn clean(
    db: &DatabaseConnection,
    form: &RegistrationForm,
    errors: &mut FormErrors,
) -> Result<Option<NewUser>, AppError> {
    let username = require(errors, "username", form.username.as_deref());
    let email = require(errors, "email", form.email.as_deref());
    let password1 = require_password(errors, "password1", form.password1.as_deref());
    let password2 = require_password(errors, "password2", form.password2.as_deref());

    if let Some(username) = &username {
        if username.chars().count() > USERNAME_MAX_LEN || !USERNAME_RE.is_match(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if accounts::username_taken(db, username).await? {
            errors.add("username", USERNAME_TAKEN);
        }
    }

    if let Some(email) = &email {
        if !EMAIL_RE.is_match(email) {
            errors.add("email", "Enter a valid email address.");
        }
    }

    if let (Some(p1), Some(p2)) = (&password1, &password2) {
        if p1 != p2 {
            errors.add("password2", "The two password fields didn't match.");
        }
    }

    Ok(match (username, email, password1) {
        (Some(username), Some(email), Some(password)) => Some(NewUser {
            username,
            email,
            password,
            is_active: false,
        }),
        _ => None,
    })
}

fn require_password(errors: &mut FormErrors, field: &'static str, value: Option<&str>) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

pub fn activation_email(
    config: &AppConfig,
    templates: &Tera,
    site: &Site,
    user: &user::Model,
    key: &str,
) -> Result<EmailMessage, AppError> {
    let mut ctx = Context::new();
    ctx.insert("scheme", &site.scheme);
    ctx.insert("site", &site.domain);
    ctx.insert("activation_key", key);
    ctx.insert("expiration_days", &config.account_activation_days);
    ctx.insert("username", &user.username);
    let body = templates.render(ACTIVATION_EMAIL_TEMPLATE, &ctx)?;

    Ok(EmailMessage {
        subject: ACTIVATION_EMAIL_SUBJECT.to_string(),
        body,
        from_email: config.default_from_email.clone(),
        to: vec![user.email.clone()],
    })
}

pub fn activation_key(config: &AppConfig, username: &str) -> Result<String, AppError> {
    let exp = Utc::now() + Duration::days(config.account_activation_days);
    sign_activation_key(config, username, exp.timestamp() as usize)
}

fn sign_activation_key(config: &AppConfig, username: &str, exp: usize) -> Result<String, AppError> {
    let claims = ActivationClaims {
        sub: username.to_string(),
        purpose: ACTIVATION_PURPOSE.to_string(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )
    .map_err(AppError::system_exception)
}

/// Returns the username the key was issued for.
pub fn verify_activation_key(config: &AppConfig, key: &str) -> Result<String, ActivationError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let decoded = decode::<ActivationClaims>(
        key,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ActivationError::Expired,
        _ => ActivationError::BadKey,
    })?;
    if decoded.claims.purpose != ACTIVATION_PURPOSE {
        return Err(ActivationError::BadKey);
    }
    Ok(decoded.claims.sub)
}

pub async fn activate(
    db: &DatabaseConnection,
    config: &AppConfig,
    key: &str,
) -> Result<ActivationOutcome, AppError> {
    let username = match verify_activation_key(config, key) {
        Ok(username) => username,
        Err(err) => {
            warn!("activation rejected: {}", err);
            return Ok(ActivationOutcome::Failed(err));
        }
    };

    let user = match accounts::find_by_username(db, &username).await? {
        Some(user) => user,
        None => return Ok(ActivationOutcome::Failed(ActivationError::BadUsername)),
    };
    if user.is_active {
        return Ok(ActivationOutcome::Failed(ActivationError::AlreadyActivated));
    }

    let user = accounts::set_active(db, user, true).await?;
    info!("activated {}", user.username);
    Ok(ActivationOutcome::Activated(user))
}
