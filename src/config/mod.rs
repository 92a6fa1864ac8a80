pub mod settings;
pub mod jwt;
pub mod email;
pub mod import;
pub mod advice;
pub mod scheduler;
