pub mod membership_service;
