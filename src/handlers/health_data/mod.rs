pub mod create_health_data;
pub mod get_health_data;
pub mod upload_health_data;
