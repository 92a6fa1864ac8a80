pub mod helpers;
pub mod users;
pub mod profiles;
pub mod health_data;
pub mod analyses;
pub mod summaries;
pub mod notifications;
pub mod import_watermarks;
