pub mod entity_repository;
pub mod user_repository;
