pub mod browser;
pub mod client;
pub mod commands;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod preview;
pub mod routes;
pub mod services;
