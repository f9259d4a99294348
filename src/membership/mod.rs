pub mod authorization;
pub mod csv_export;
pub mod entity_configs;
pub mod errors;
pub mod middleware;
pub mod user_view_model;
