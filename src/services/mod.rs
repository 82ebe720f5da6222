pub mod api_client;
pub mod auth_service;
pub mod expiry_service;
pub mod pivot_service;
pub mod request_coordinator;
pub mod view_state_service;
