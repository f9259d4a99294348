pub mod membership_routes;
