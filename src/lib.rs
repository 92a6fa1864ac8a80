use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{error, http, web, App, HttpResponse, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub mod analysis;
pub mod config;
pub mod db;
mod handlers;
pub mod middleware;
pub mod models;
mod routes;
pub mod services;
pub mod telemetry;
pub mod utils;

use crate::config::jwt::JwtSettings;
use crate::models::common::ApiResponse;
use crate::routes::init_routes;
use crate::services::import_service::ImportTarget;
use crate::services::{AdviceService, EmailService};

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    jwt_settings: JwtSettings,
    email_service: EmailService,
    advice_service: AdviceService,
    import_target: Option<ImportTarget>,
) -> Result<Server, std::io::Error> {
    // web::Data is an Arc, cloned into every worker
    let db_pool_data = web::Data::new(db_pool);
    let jwt_settings = web::Data::new(jwt_settings);
    let email_service = web::Data::new(email_service);
    let advice_service = web::Data::new(advice_service);
    let import_target = web::Data::new(import_target);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:5173")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        // Malformed JSON bodies get the same envelope as every other error
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            let message = err.to_string();
            error::InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(ApiResponse::<()>::error(message)),
            )
            .into()
        });

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(json_config)
            .app_data(db_pool_data.clone())
            .app_data(jwt_settings.clone())
            .app_data(email_service.clone())
            .app_data(advice_service.clone())
            .app_data(import_target.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
