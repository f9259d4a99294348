pub mod config;
pub mod constants;
pub mod handlers;
pub mod membership;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod types;
pub mod utils;
pub mod validations;
