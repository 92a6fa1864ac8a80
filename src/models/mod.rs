pub mod common;
pub mod user;
pub mod auth;
pub mod profile;
pub mod health_data;
pub mod analysis;
pub mod summary;
pub mod notification;
pub mod import;
