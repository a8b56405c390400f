pub mod applications;
pub mod auth;
pub mod dashboard;
pub mod jobs;
pub mod payment;
pub mod reviews;
pub mod users;
