pub mod advice_service;
pub mod analysis_service;
pub mod email_service;
pub mod import_service;
pub mod notification_service;
pub mod scheduler;
pub mod sheets_client;
pub mod summary_service;

pub use advice_service::AdviceService;
pub use email_service::EmailService;
pub use scheduler::SchedulerService;
pub use sheets_client::{GoogleSheetsSource, SheetSource};
