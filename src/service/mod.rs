pub mod account_service;
pub mod chat_service;
pub mod error;
pub mod job_service;
pub mod payment_service;
pub mod review_service;
