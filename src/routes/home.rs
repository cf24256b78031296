use actix_web::{http::Method, web, HttpRequest, HttpResponse};
use tera::Tera;

use crate::auth::OptionalAuthUser;
use crate::error::AppError;
use crate::response::{page_context, render};

pub async fn home(
    templates: web::Data<Tera>,
    auth: OptionalAuthUser,
) -> Result<HttpResponse, AppError> {
    render(&templates, "imagersite/home.html", &page_context(&auth))
}

/// Unrouted GETs land on the home page.
pub async fn fallback(
    req: HttpRequest,
    templates: web::Data<Tera>,
    auth: OptionalAuthUser,
) -> Result<HttpResponse, AppError> {
    if req.method() != Method::GET {
        return Err(AppError::NotFound);
    }
    home(templates, auth).await
}
