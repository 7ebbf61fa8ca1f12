pub mod fetch_service;
pub mod outbound;
pub mod request_tracker;
