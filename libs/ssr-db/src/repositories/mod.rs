pub mod checkin_repo;
pub mod invite_repo;
pub mod node_repo;
pub mod session_repo;
pub mod traffic_log_repo;
pub mod user_repo;
