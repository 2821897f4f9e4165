pub mod checkin_service;
pub mod credential_service;
pub mod link_service;
pub mod node_service;
