use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use tera::Tera;

use crate::auth::OptionalAuthUser;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::forms::{FieldView, FormErrors};
use crate::mail::Mailer;
use crate::registration::{
    self, ActivationOutcome, RegistrationForm, RegistrationOutcome, Site,
};
use crate::response::{page_context, redirect, render};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/register/")
            .route(web::get().to(register_page))
            .route(web::post().to(register)),
    )
    .service(web::resource("/register/complete/").route(web::get().to(registration_complete)))
    .service(web::resource("/register/closed/").route(web::get().to(registration_closed)))
    .service(web::resource("/activate/complete/").route(web::get().to(activation_complete)))
    .service(
        web::resource(["/activate/{activation_key}/", "/activate/{activation_key}"])
            .route(web::get().to(activate)),
    );
}

async fn register_page(
    config: web::Data<AppConfig>,
    templates: web::Data<Tera>,
    auth: OptionalAuthUser,
) -> Result<HttpResponse, AppError> {
    if !config.registration_open {
        return Ok(redirect("/accounts/register/closed/"));
    }
    render_form(&templates, &auth, &RegistrationForm::default(), &FormErrors::default())
}

async fn register(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    templates: web::Data<Tera>,
    mailer: web::Data<dyn Mailer>,
    auth: OptionalAuthUser,
    form: web::Form<RegistrationForm>,
) -> Result<HttpResponse, AppError> {
    if !config.registration_open {
        return Ok(redirect("/accounts/register/closed/"));
    }

    let site = {
        let info = req.connection_info();
        Site::for_request(&config, info.scheme(), info.host())
    };

    let form = form.into_inner();
    match registration::register(db.get_ref(), &config, mailer.get_ref(), &templates, &site, &form)
        .await?
    {
        RegistrationOutcome::Registered(_) => Ok(redirect("/accounts/register/complete/")),
        RegistrationOutcome::Invalid(errors) => render_form(&templates, &auth, &form, &errors),
    }
}

async fn registration_complete(
    templates: web::Data<Tera>,
    auth: OptionalAuthUser,
) -> Result<HttpResponse, AppError> {
    render(&templates, "registration/registration_complete.html", &page_context(&auth))
}

async fn registration_closed(
    templates: web::Data<Tera>,
    auth: OptionalAuthUser,
) -> Result<HttpResponse, AppError> {
    render(&templates, "registration/registration_closed.html", &page_context(&auth))
}

async fn activation_complete(
    templates: web::Data<Tera>,
    auth: OptionalAuthUser,
) -> Result<HttpResponse, AppError> {
    render(&templates, "registration/activation_complete.html", &page_context(&auth))
}

async fn activate(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    templates: web::Data<Tera>,
    auth: OptionalAuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let key = path.into_inner();
    match registration::activate(db.get_ref(), &config, &key).await? {
        ActivationOutcome::Activated(_) => Ok(redirect("/accounts/activate/complete/")),
        ActivationOutcome::Failed(err) => {
            let mut ctx = page_context(&auth);
            ctx.insert("activation_error", &err.to_string());
            render(&templates, "registration/activate.html", &ctx)
        }
    }
}

fn render_form(
    templates: &Tera,
    auth: &OptionalAuthUser,
    form: &RegistrationForm,
    errors: &FormErrors,
) -> Result<HttpResponse, AppError> {
    let fields = vec![
        FieldView::new("username", "Username", "text", form.username.as_deref(), errors),
        FieldView::new("email", "Email", "email", form.email.as_deref(), errors),
        FieldView::new("password1", "Password", "password", None, errors),
        FieldView::new("password2", "Password confirmation", "password", None, errors),
    ];
    let mut ctx = page_context(auth);
    ctx.insert("fields", &fields);
    render(templates, "registration/registration_form.html", &ctx)
}
