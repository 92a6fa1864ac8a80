use actix_web::web;

pub mod admin;
pub mod analyses;
pub mod auth;
pub mod backend_health;
pub mod health_data;
pub mod notifications;
pub mod profile;
pub mod registration;
pub mod summaries;

use crate::middleware::admin::AdminMiddleware;
use crate::middleware::auth::AuthMiddleware;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(registration::register)
        .service(backend_health::backend_health)
        .service(auth::login);

    cfg.service(
        web::scope("/profile")
            .wrap(AuthMiddleware)
            .service(profile::get_profile)
            .service(profile::update_profile),
    );
    // Readings, analyses and summaries (require authentication)
    cfg.service(
        web::scope("/health")
            .wrap(AuthMiddleware)
            .service(health_data::upload_health)
            .service(health_data::create_health)
            .service(health_data::list_health)
            .service(health_data::get_health)
            .service(health_data::delete_health)
            .service(analyses::get_reading_analysis)
            .service(analyses::analyze_reading)
            .service(analyses::list_analyses)
            .service(analyses::get_analysis)
            .service(analyses::get_advice)
            .service(summaries::list_summaries)
            .service(summaries::latest_summary)
            .service(summaries::generate_summary),
    );
    cfg.service(
        web::scope("/notifications")
            .wrap(AuthMiddleware)
            .service(notifications::list_notifications)
            .service(notifications::unread_count)
            .service(notifications::read_all)
            .service(notifications::mark_read)
            .service(notifications::mark_unread)
            .service(notifications::archive)
            .service(notifications::delete_one),
    );
    cfg.service(
        web::scope("/admin")
            .wrap(AdminMiddleware)
            .service(admin::run_import)
            .service(admin::run_summaries)
            .service(admin::dispatch_emails),
    );
}
