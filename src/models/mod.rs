pub mod entity_model;
pub mod group_model;
pub mod institution_model;
pub mod publisher_model;
pub mod user_model;
