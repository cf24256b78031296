use actix_web::web;

pub mod auth;
pub mod home;
pub mod profile;
pub mod registration;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home::home)))
        .service(
            web::resource("/login/")
                .route(web::get().to(auth::login_page))
                .route(web::post().to(auth::login)),
        )
        .service(web::resource("/logout/").route(web::get().to(auth::logout)))
        .service(web::scope("/accounts").configure(registration::config))
        .service(web::scope("/profile").configure(profile::config))
        .default_service(web::to(home::fallback));
}
