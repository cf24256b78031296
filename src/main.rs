use actix_web::{middleware, App, HttpServer};
use imager::config::AppConfig;
use imager::db::connect_db;
use imager::{mail, templates, Services};
use log::info;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env();
    let db = connect_db(&config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("db connect failed: {}", e)))?;
    let templates = templates::load()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("templates: {}", e)))?;
    let mailer = mail::build_mailer(&config)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let server_port = config.server_port;

    let services = Services {
        config,
        db,
        templates,
        mailer,
    };

    let server = HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(middleware::Logger::default())
            .configure(move |cfg| services.configure(cfg))
    })
    .bind(("0.0.0.0", server_port))?;
    info!("server started at http://0.0.0.0:{}", server_port);
    server.run().await
}
