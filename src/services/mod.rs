pub mod backend;
pub mod console_service;
pub mod memory_backend;
pub mod s3_backend;
pub mod validation;
