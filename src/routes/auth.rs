use actix_web::{web, HttpResponse};
use log::info;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tera::Tera;

use crate::accounts;
use crate::auth::{removal_cookie, session_cookie, OptionalAuthUser};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::forms::{require, FieldView, FormErrors, REQUIRED};
use crate::response::{page_context, redirect, render};

pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Deserialize, Default)]
pub struct LoginForm {
    username: Option<String>,
    password: Option<String>,
    next: Option<String>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

pub async fn login_page(
    templates: web::Data<Tera>,
    auth: OptionalAuthUser,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, AppError> {
    let form = LoginForm {
        next: query.into_inner().next,
        ..Default::default()
    };
    render_login(&templates, &auth, &form, &FormErrors::default())
}

pub async fn login(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    templates: web::Data<Tera>,
    auth: OptionalAuthUser,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let mut errors = FormErrors::default();
    let username = require(&mut errors, "username", form.username.as_deref());
    let password = match form.password.as_deref() {
        Some(p) if !p.is_empty() => Some(p.to_string()),
        _ => {
            errors.add("password", REQUIRED);
            None
        }
    };

    let (username, password) = match (username, password) {
        (Some(u), Some(p)) => (u, p),
        _ => return render_login(&templates, &auth, &form, &errors),
    };

    let user = match accounts::authenticate(db.get_ref(), &username, &password).await? {
        Some(user) => user,
        None => {
            info!("failed login for {}", username);
            errors.add_non_field(INVALID_LOGIN);
            return render_login(&templates, &auth, &form, &errors);
        }
    };

    accounts::record_login(db.get_ref(), user.id).await?;
    let cookie = session_cookie(&config, user.id)?;
    info!("{} logged in", user.username);

    let target = safe_next(form.next.as_deref()).unwrap_or("/");
    let mut resp = redirect(target);
    resp.add_cookie(&cookie).map_err(AppError::system_exception)?;
    Ok(resp)
}

/// Always redirects home, with or without a session.
pub async fn logout(config: web::Data<AppConfig>) -> Result<HttpResponse, AppError> {
    let mut resp = redirect("/");
    resp.add_cookie(&removal_cookie(&config))
        .map_err(AppError::system_exception)?;
    Ok(resp)
}

fn render_login(
    templates: &Tera,
    auth: &OptionalAuthUser,
    form: &LoginForm,
    errors: &FormErrors,
) -> Result<HttpResponse, AppError> {
    let fields = vec![
        FieldView::new("username", "Username", "text", form.username.as_deref(), errors),
        FieldView::new("password", "Password", "password", None, errors),
    ];
    let mut ctx = page_context(auth);
    ctx.insert("fields", &fields);
    ctx.insert("non_field_errors", errors.non_field());
    ctx.insert("next", &safe_next(form.next.as_deref()).unwrap_or(""));
    render(templates, "imagersite/login.html", &ctx)
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/profile/")), Some("/profile/"));
        assert_eq!(safe_next(Some("//evil.example/")), None);
        assert_eq!(safe_next(Some("https://evil.example/")), None);
        assert_eq!(safe_next(None), None);
    }
}
