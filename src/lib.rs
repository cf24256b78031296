pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod forms;
pub mod gallery;
pub mod mail;
pub mod registration;
pub mod response;
pub mod routes;
pub mod templates;

use actix_web::web;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tera::Tera;

use config::AppConfig;
use mail::Mailer;

/// Shared state handed to every worker.
#[derive(Clone)]
pub struct Services {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub templates: Tera,
    pub mailer: Arc<dyn Mailer>,
}

impl Services {
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::new(self.db.clone()))
            .app_data(web::Data::new(self.templates.clone()))
            .app_data(web::Data::from(self.mailer.clone()));
        routes::configure(cfg);
    }
}
