pub mod add_member_request;
