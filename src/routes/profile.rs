use actix_web::{web, HttpResponse};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use tera::Tera;

use crate::accounts::{self, ProfileUpdate};
use crate::auth::{AuthUser, OptionalAuthUser};
use crate::entity::{profile, user};
use crate::error::AppError;
use crate::forms::{FieldView, FormErrors};
use crate::gallery;
use crate::response::{page_context, redirect, render};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(profile_page)))
        .service(
            web::resource("/edit/")
                .route(web::get().to(edit_page))
                .route(web::post().to(edit)),
        );
}

#[derive(Serialize)]
struct ProfileView {
    location: String,
    website: String,
    bio: String,
    camera: String,
    phone: String,
}

#[derive(Serialize)]
struct AlbumView {
    title: String,
    photo_count: u64,
}

#[derive(Deserialize, Default)]
pub struct ProfileForm {
    location: Option<String>,
    website: Option<String>,
    bio: Option<String>,
    camera: Option<String>,
    phone: Option<String>,
}

async fn profile_page(
    db: web::Data<DatabaseConnection>,
    templates: web::Data<Tera>,
    auth: AuthUser,
) -> Result<HttpResponse, AppError> {
    let profile = load_profile(db.get_ref(), &auth).await?;
    let photo_count = gallery::count_photos_for_profile(db.get_ref(), &profile).await?;
    let albums = gallery::albums_for_profile(db.get_ref(), &profile).await?;

    let mut album_views = Vec::with_capacity(albums.len());
    for album in &albums {
        album_views.push(AlbumView {
            title: album.title.clone(),
            photo_count: gallery::count_photos_in_album(db.get_ref(), album).await?,
        });
    }

    let mut ctx = page_context(&OptionalAuthUser(Some(auth)));
    ctx.insert("profile", &to_profile_view(&profile));
    ctx.insert("photo_count", &photo_count);
    ctx.insert("album_count", &album_views.len());
    ctx.insert("albums", &album_views);
    render(&templates, "imagersite/profile.html", &ctx)
}

async fn edit_page(
    db: web::Data<DatabaseConnection>,
    templates: web::Data<Tera>,
    auth: AuthUser,
) -> Result<HttpResponse, AppError> {
    let profile = load_profile(db.get_ref(), &auth).await?;
    let form = ProfileForm {
        location: profile.location,
        website: profile.website,
        bio: profile.bio,
        camera: profile.camera,
        phone: profile.phone,
    };
    render_edit(&templates, auth, &form, &FormErrors::default())
}

async fn edit(
    db: web::Data<DatabaseConnection>,
    templates: web::Data<Tera>,
    auth: AuthUser,
    form: web::Form<ProfileForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let errors = validate(&form);
    if !errors.is_empty() {
        return render_edit(&templates, auth, &form, &errors);
    }

    let profile = load_profile(db.get_ref(), &auth).await?;
    accounts::update_profile(
        db.get_ref(),
        profile,
        ProfileUpdate {
            location: form.location,
            website: form.website,
            bio: form.bio,
            camera: form.camera,
            phone: form.phone,
        },
    )
    .await?;
    Ok(redirect("/profile/"))
}

fn validate(form: &ProfileForm) -> FormErrors {
    let mut errors = FormErrors::default();
    let too_long = |v: &Option<String>, max: usize| v.as_deref().map_or(false, |s| s.chars().count() > max);
    if too_long(&form.location, 255) {
        errors.add("location", "Ensure this value has at most 255 characters.");
    }
    if too_long(&form.website, 255) {
        errors.add("website", "Ensure this value has at most 255 characters.");
    }
    if too_long(&form.camera, 255) {
        errors.add("camera", "Ensure this value has at most 255 characters.");
    }
    if too_long(&form.phone, 32) {
        errors.add("phone", "Ensure this value has at most 32 characters.");
    }
    errors
}

async fn load_profile(db: &DatabaseConnection, auth: &AuthUser) -> Result<profile::Model, AppError> {
    let user = user::Entity::find_by_id(auth.user_id)
        .one(db)
        .await?
        .ok_or_else(AppError::need_login)?;
    accounts::profile_for_user(db, &user).await
}

fn render_edit(
    templates: &Tera,
    auth: AuthUser,
    form: &ProfileForm,
    errors: &FormErrors,
) -> Result<HttpResponse, AppError> {
    let fields = vec![
        FieldView::new("location", "Location", "text", form.location.as_deref(), errors),
        FieldView::new("website", "Website", "url", form.website.as_deref(), errors),
        FieldView::new("camera", "Camera", "text", form.camera.as_deref(), errors),
        FieldView::new("phone", "Phone", "tel", form.phone.as_deref(), errors),
        FieldView::new("bio", "Bio", "textarea", form.bio.as_deref(), errors),
    ];
    let mut ctx = page_context(&OptionalAuthUser(Some(auth)));
    ctx.insert("fields", &fields);
    render(templates, "imagersite/profile_edit.html", &ctx)
}

fn to_profile_view(model: &profile::Model) -> ProfileView {
    ProfileView {
        location: model.location.clone().unwrap_or_default(),
        website: model.website.clone().unwrap_or_default(),
        bio: model.bio.clone().unwrap_or_default(),
        camera: model.camera.clone().unwrap_or_default(),
        phone: model.phone.clone().unwrap_or_default(),
    }
}
