pub mod bucket_handlers;
pub mod connection_handlers;
pub mod health_handlers;
pub mod object_handlers;
pub mod session_guard;
