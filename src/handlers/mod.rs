pub mod membership_handler;
