pub mod client;
pub mod error;
pub mod models;
pub mod operations;

pub use client::ReportClient;
pub use error::ApiError;
pub use operations::{FileUpload, ReportBackend};
