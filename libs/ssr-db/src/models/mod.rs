pub mod checkin_log;
pub mod invite;
pub mod node;
pub mod traffic_log;
pub mod user;
