use actix_web::{http::header, HttpResponse};
use serde::Serialize;
use tera::{Context, Tera};

use crate::auth::OptionalAuthUser;
use crate::error::AppError;

#[derive(Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
}

/// Base context every page gets: the logged-in user, or `null`.
pub fn page_context(auth: &OptionalAuthUser) -> Context {
    let mut ctx = Context::new();
    let user = auth.0.as_ref().map(|a| UserView {
        id: a.user_id,
        username: a.username.clone(),
    });
    ctx.insert("user", &user);
    ctx
}

pub fn render(templates: &Tera, name: &str, ctx: &Context) -> Result<HttpResponse, AppError> {
    let body = templates.render(name, ctx)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}
