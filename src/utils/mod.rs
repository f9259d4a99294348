pub mod auth_utils;
pub mod csv_utils;
pub mod locale_utils;
pub mod validation_utils;
